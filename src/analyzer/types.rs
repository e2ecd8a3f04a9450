//! Analysis Types
//!
//! The structured view of one inbound message: detected intents, extracted
//! entities, sentiment, priority and the escalation decision.

use serde::{Deserialize, Serialize};

/// Coarse classification of what the customer wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Intent {
    OrderTracking,
    ProductSearch,
    SupportEscalation,
    BillingInquiry,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::OrderTracking => "orderTracking",
            Intent::ProductSearch => "productSearch",
            Intent::SupportEscalation => "supportEscalation",
            Intent::BillingInquiry => "billingInquiry",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Neutral,
    Negative,
    Positive,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Positive => write!(f, "positive"),
        }
    }
}

/// Handling priority. Ordered so that `max` only ever raises it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Structured values pulled out of (or supplied alongside) the message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    /// Order numbers in the order they appear, `#` stripped
    pub order_numbers: Vec<String>,
    /// Caller-supplied customer email, never parsed from text
    pub email: Option<String>,
    /// Product names supplied by upstream extractors
    #[serde(default)]
    pub products: Vec<String>,
}

/// Result of analyzing a single message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Detected intents in detection order, at most one per category
    pub intents: Vec<Intent>,
    pub entities: Entities,
    pub sentiment: Sentiment,
    pub priority: Priority,
    pub requires_escalation: bool,
    /// `0.2` per detected category, clamped to 1.0
    pub confidence: f64,
}

impl Analysis {
    pub fn has_intent(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analysis() {
        let analysis = Analysis::default();
        assert!(analysis.intents.is_empty());
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.priority, Priority::Medium);
        assert!(!analysis.requires_escalation);
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert_eq!(Priority::Urgent.max(Priority::High), Priority::Urgent);
    }

    #[test]
    fn test_serialized_tags() {
        let json = serde_json::to_value(Intent::SupportEscalation).unwrap();
        assert_eq!(json, "supportEscalation");
        assert_eq!(serde_json::to_value(Priority::Urgent).unwrap(), "urgent");
        assert_eq!(serde_json::to_value(Sentiment::Negative).unwrap(), "negative");
    }
}
