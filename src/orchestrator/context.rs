//! Per-turn state: what the integrations returned and what the caller
//! carries from one turn to the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::Analysis;
use crate::integrations::{Order, Product};
use crate::synthesis::SmartResponse;
use crate::types::{ChatRole, ChatTurn, ConversationId, Result};

pub const COMMERCE_KEY: &str = "commerce";
pub const TICKETING_KEY: &str = "ticketing";

// =============================================================================
// Integration Results
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Demo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommerceResult {
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    /// Origin of `products`; orders are always live
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketingResult {
    pub ticket_id: String,
    pub escalated_at: DateTime<Utc>,
    /// True when the ticket number was generated locally after a provider failure
    pub placeholder: bool,
    /// `escalation` or the ticket category, e.g. `billing`
    pub category: String,
}

/// Outcome of executing a plan. A slot stays `None` when no action of that
/// kind ran, its provider was gated off, or the call failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResults {
    pub commerce: Option<CommerceResult>,
    pub ticketing: Option<TicketingResult>,
}

impl IntegrationResults {
    pub fn is_empty(&self) -> bool {
        self.commerce.is_none() && self.ticketing.is_none()
    }

    /// Fold a commerce outcome into the slot. Demo products taint the source.
    pub fn merge_commerce(&mut self, result: CommerceResult) {
        match &mut self.commerce {
            Some(existing) => {
                existing.orders.extend(result.orders);
                existing.products.extend(result.products);
                if result.source == DataSource::Demo {
                    existing.source = DataSource::Demo;
                }
            }
            None => self.commerce = Some(result),
        }
    }
}

// =============================================================================
// Customer Context
// =============================================================================

/// Caller-owned conversation state, enriched and returned every turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContext {
    pub email: Option<String>,
    pub name: Option<String>,
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
    /// Latest integration data keyed by slot (`commerce`, `ticketing`)
    #[serde(default)]
    pub integrations: serde_json::Map<String, serde_json::Value>,
}

impl Default for CustomerContext {
    fn default() -> Self {
        Self::new(ConversationId::generate())
    }
}

impl CustomerContext {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            email: None,
            name: None,
            conversation_id,
            chat_history: Vec::new(),
            integrations: serde_json::Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn record_user(&mut self, content: &str) {
        self.chat_history.push(ChatTurn::user(content));
    }

    pub fn record_assistant(&mut self, content: &str) {
        self.chat_history.push(ChatTurn::assistant(content));
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.chat_history
            .iter()
            .rev()
            .find(|turn| turn.role == ChatRole::User)
            .map(|turn| turn.content.as_str())
    }

    /// Name for ticketing records: given name, else the email's local part
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Chat Customer".to_string())
    }

    /// Merge non-empty result slots under their provider keys
    pub fn enrich(&mut self, results: &IntegrationResults) -> Result<()> {
        if let Some(commerce) = &results.commerce {
            self.integrations
                .insert(COMMERCE_KEY.to_string(), serde_json::to_value(commerce)?);
        }
        if let Some(ticketing) = &results.ticketing {
            self.integrations
                .insert(TICKETING_KEY.to_string(), serde_json::to_value(ticketing)?);
        }
        Ok(())
    }
}

/// Everything `process_message` hands back to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMessage {
    pub response: SmartResponse,
    pub analysis: Analysis,
    pub integration_results: IntegrationResults,
    pub customer_context: CustomerContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_commerce_combines_slots() {
        let mut results = IntegrationResults::default();
        results.merge_commerce(CommerceResult {
            orders: vec![Order::default()],
            ..Default::default()
        });
        results.merge_commerce(CommerceResult {
            products: vec![Product::default(), Product::default()],
            source: DataSource::Demo,
            ..Default::default()
        });

        let commerce = results.commerce.unwrap();
        assert_eq!(commerce.orders.len(), 1);
        assert_eq!(commerce.products.len(), 2);
        assert_eq!(commerce.source, DataSource::Demo);
    }

    #[test]
    fn test_enrich_skips_empty_slots() {
        let mut context = CustomerContext::new(ConversationId::new("c-1"));
        let results = IntegrationResults {
            commerce: None,
            ticketing: Some(TicketingResult {
                ticket_id: "77".to_string(),
                escalated_at: Utc::now(),
                placeholder: false,
                category: "escalation".to_string(),
            }),
        };
        context.enrich(&results).unwrap();

        assert!(!context.integrations.contains_key(COMMERCE_KEY));
        assert_eq!(context.integrations[TICKETING_KEY]["ticketId"], "77");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let context = CustomerContext::default().with_email("ana.lima@example.com");
        assert_eq!(context.display_name(), "ana.lima");
        assert_eq!(context.clone().with_name("Ana").display_name(), "Ana");
        assert_eq!(CustomerContext::default().display_name(), "Chat Customer");
    }

    #[test]
    fn test_last_user_message() {
        let mut context = CustomerContext::default();
        context.record_user("first");
        context.record_assistant("reply");
        context.record_user("second");
        context.record_assistant("reply");
        assert_eq!(context.last_user_message(), Some("second"));
    }
}
