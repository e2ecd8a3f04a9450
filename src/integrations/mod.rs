//! Integration Gateway
//!
//! Provider abstractions for the external systems the pipeline consults.
//! Each provider exposes find/search/create operations plus a liveness
//! probe used by the [`ProviderRegistry`] gating step.
//!
//! ## Modules
//!
//! - `shopify`: Commerce catalog and orders (Shopify Admin REST API)
//! - `freshdesk`: Ticketing/CRM (Freshdesk API v2)
//! - `demo`: Built-in product catalog used when commerce is unavailable
//! - `registry`: Availability snapshot consumed by the orchestrator
//! - `retry`: Timeout and 429 backoff applied to every provider request

pub mod demo;
mod freshdesk;
pub mod models;
mod registry;
pub mod retry;
mod shopify;

pub use demo::DemoCatalog;
pub use freshdesk::FreshdeskClient;
pub use models::{
    Customer, EscalationReceipt, Fulfillment, LineItem, NewCustomer, NewTicket, Order, Product,
    ProductImage, ProductVariant, TicketReceipt, TicketingCustomer,
};
pub use registry::{ProviderKind, ProviderRegistry, ProviderStatus};
pub use retry::{CallPolicy, call_with_policy, with_timeout};
pub use shopify::ShopifyClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::types::{ChatTurn, ConversationId, Result};

/// Shared commerce provider for concurrent access across conversations
pub type SharedCommerce = Arc<dyn CommerceProvider>;

/// Shared ticketing provider for concurrent access across conversations
pub type SharedTicketing = Arc<dyn TicketingProvider>;

// =============================================================================
// Provider Traits
// =============================================================================

/// Commerce catalog and order system
#[async_trait]
pub trait CommerceProvider: Send + Sync {
    /// Look up an order by its customer-facing number. `Ok(None)` when missing.
    async fn find_order_by_number(&self, number: &str) -> Result<Option<Order>>;

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Most recent orders first
    async fn get_customer_orders(&self, customer_id: u64, limit: usize) -> Result<Vec<Order>>;

    async fn search_products(&self, query: &str) -> Result<Vec<Product>>;

    async fn get_products(&self, limit: usize) -> Result<Vec<Product>>;

    /// Provider name for logging and response metadata
    fn name(&self) -> &str;

    /// Liveness probe: credentials present and the API reachable
    async fn is_connected(&self) -> bool;
}

/// Ticketing / CRM system that receives escalations
#[async_trait]
pub trait TicketingProvider: Send + Sync {
    async fn find_customer(&self, email: &str) -> Result<Option<TicketingCustomer>>;

    async fn create_customer(&self, customer: &NewCustomer) -> Result<TicketingCustomer>;

    /// Hand the conversation to a human agent
    async fn escalate_to_human(
        &self,
        conversation_id: &ConversationId,
        customer_id: u64,
        reason: &str,
        history: &[ChatTurn],
    ) -> Result<EscalationReceipt>;

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketReceipt>;

    fn name(&self) -> &str;

    async fn is_connected(&self) -> bool;
}

/// Build the configured providers
pub fn create_providers(config: &Config) -> Result<(SharedCommerce, SharedTicketing)> {
    let policy = CallPolicy::from_config(&config.gateway);
    let commerce: SharedCommerce =
        Arc::new(ShopifyClient::new(&config.commerce, policy.clone())?);
    let ticketing: SharedTicketing = Arc::new(FreshdeskClient::new(&config.ticketing, policy)?);
    Ok((commerce, ticketing))
}
