//! Provider Data Models
//!
//! Request/response shapes exchanged with commerce and ticketing providers.
//! Field names follow the provider wire formats so they deserialize directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::Priority;
use crate::types::ConversationId;

// =============================================================================
// Commerce
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: u64,
    /// Display name, e.g. `#1001`
    pub name: String,
    pub order_number: Option<u64>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub cancelled_at: Option<String>,
    pub total_price: String,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub fulfillments: Vec<Fulfillment>,
}

impl Order {
    /// First tracking number across fulfillments
    pub fn tracking_number(&self) -> Option<&str> {
        self.fulfillments
            .iter()
            .find_map(|f| f.tracking_number.as_deref())
            .filter(|n| !n.is_empty())
    }

    /// Carrier tracking URL, when the provider supplied one
    pub fn tracking_url(&self) -> Option<&str> {
        self.fulfillments
            .iter()
            .find_map(|f| f.tracking_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fulfillment {
    pub status: Option<String>,
    pub tracking_company: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub id: u64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub orders_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: u64,
    pub title: String,
    /// HTML description
    pub body_html: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    /// Comma-separated tag list
    pub tags: String,
    pub handle: String,
    pub images: Vec<ProductImage>,
    pub variants: Vec<ProductVariant>,
    /// Canonical storefront URL, filled in by the provider client
    pub url: Option<String>,
}

impl Product {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Case-insensitive match of `query` against title, type, tags and vendor
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        // "headphones" should still find "Headphone" products
        let stem = needle.strip_suffix('s').unwrap_or(&needle);
        [
            Some(self.title.as_str()),
            self.product_type.as_deref(),
            Some(self.tags.as_str()),
            self.vendor.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(stem))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductImage {
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductVariant {
    pub id: u64,
    pub title: String,
    pub price: String,
    pub sku: Option<String>,
    pub inventory_quantity: Option<i64>,
}

impl ProductVariant {
    /// Untracked inventory counts as available
    pub fn available(&self) -> bool {
        self.inventory_quantity.is_none_or(|q| q > 0)
    }
}

// =============================================================================
// Ticketing
// =============================================================================

/// Customer record on the ticketing/CRM side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingCustomer {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub customer_id: u64,
    pub conversation_id: Option<ConversationId>,
    pub subject: String,
    pub description: String,
    pub priority: Priority,
}

/// Confirmation that a conversation was handed to a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationReceipt {
    pub ticket_id: String,
    pub escalated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketReceipt {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_partial_payload() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "#1007",
            "fulfillment_status": null,
            "fulfillments": [{"tracking_number": "1Z999"}]
        }))
        .unwrap();
        assert_eq!(order.name, "#1007");
        assert_eq!(order.fulfillment_status, None);
        assert_eq!(order.tracking_number(), Some("1Z999"));
        assert!(order.line_items.is_empty());
    }

    #[test]
    fn test_empty_tracking_number_is_ignored() {
        let order = Order {
            fulfillments: vec![Fulfillment {
                tracking_number: Some(String::new()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(order.tracking_number(), None);
    }

    #[test]
    fn test_product_matches_plural_query() {
        let product = Product {
            title: "Studio Headphone Pro".to_string(),
            tags: "audio, over-ear".to_string(),
            ..Default::default()
        };
        assert!(product.matches_query("headphones"));
        assert!(product.matches_query("AUDIO"));
        assert!(!product.matches_query("cable"));
        assert_eq!(product.tag_list(), vec!["audio", "over-ear"]);
    }

    #[test]
    fn test_variant_availability() {
        let tracked = ProductVariant {
            inventory_quantity: Some(0),
            ..Default::default()
        };
        let untracked = ProductVariant::default();
        assert!(!tracked.available());
        assert!(untracked.available());
    }
}
