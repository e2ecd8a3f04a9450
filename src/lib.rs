//! SupportFlow - Message understanding and integration orchestration for
//! customer-support chat
//!
//! Takes one inbound chat message, classifies what the customer wants,
//! consults the commerce and ticketing systems when needed, and synthesizes
//! a reply that always degrades to something useful.
//!
//! ## Core Features
//!
//! - **Intent Analysis**: Pattern-based intents, order numbers, sentiment and priority
//! - **Response Planning**: Deterministic action plans with a single reply template
//! - **Provider Gating**: Immutable availability snapshot, refreshed on demand
//! - **Graceful Degradation**: Demo products, placeholder tickets, fallback replies
//!
//! ## Quick Start
//!
//! ```ignore
//! use supportflow::{ConfigLoader, CustomerContext, IntegrationOrchestrator};
//!
//! let config = ConfigLoader::load()?;
//! let orchestrator = IntegrationOrchestrator::from_config(&config).await?;
//! let context = CustomerContext::default().with_email("ana@example.com");
//! let processed = orchestrator.process_message("Where is my order #45678", context).await;
//! println!("{}", processed.response.text);
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: Message analysis (intents, entities, sentiment)
//! - [`planner`]: Response planning
//! - [`integrations`]: Commerce and ticketing providers, availability registry
//! - [`orchestrator`]: Plan execution and the per-message pipeline
//! - [`synthesis`]: Reply templates
//! - [`config`]: Layered configuration

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod integrations;
pub mod orchestrator;
pub mod planner;
pub mod synthesis;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, ProviderError, Result, SupportError};
pub use types::{ChatRole, ChatTurn, ConversationId};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use analyzer::{Analysis, Intent, MessageAnalyzer, Priority, Sentiment};
pub use orchestrator::{
    CustomerContext, IntegrationOrchestrator, IntegrationResults, ProcessedMessage,
};
pub use planner::{Action, ResponsePlan, ResponsePlanner, ResponseType};
pub use synthesis::{ResponseSynthesizer, SmartResponse, SuggestedAction};

// =============================================================================
// Integration Re-exports
// =============================================================================

pub use integrations::{
    CommerceProvider, FreshdeskClient, ProviderRegistry, ShopifyClient, TicketingProvider,
};
