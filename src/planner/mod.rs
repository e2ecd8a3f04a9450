//! Response Planner
//!
//! Converts an [`Analysis`] into an ordered [`ResponsePlan`]. Pure and total.
//!
//! Rules run in a fixed order (order tracking, product search, escalation,
//! billing). Each applicable rule appends its action and overwrites the
//! response type, so several actions may execute while only the last
//! applicable rule picks the reply template.

use serde::{Deserialize, Serialize};

use crate::analyzer::{Analysis, Intent, Priority, Sentiment};
use crate::constants::planning as planning_constants;

/// Why an escalation was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    CustomerRequest,
    SentimentAnalysis,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationReason::CustomerRequest => write!(f, "customer_request"),
            EscalationReason::SentimentAnalysis => write!(f, "sentiment_analysis"),
        }
    }
}

/// One unit of planned work for the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    OrderLookup {
        email: Option<String>,
        order_numbers: Vec<String>,
    },
    ProductSearch {
        query: String,
    },
    Escalation {
        priority: Priority,
        sentiment: Sentiment,
        reason: EscalationReason,
    },
    TicketCreation {
        category: String,
        priority: Priority,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::OrderLookup { .. } => "order_lookup",
            Action::ProductSearch { .. } => "product_search",
            Action::Escalation { .. } => "escalation",
            Action::TicketCreation { .. } => "ticket_creation",
        }
    }
}

/// Which reply template the synthesizer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Standard,
    OrderStatus,
    ProductRecommendations,
    Escalation,
    BillingSupport,
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseType::Standard => write!(f, "standard"),
            ResponseType::OrderStatus => write!(f, "order_status"),
            ResponseType::ProductRecommendations => write!(f, "product_recommendations"),
            ResponseType::Escalation => write!(f, "escalation"),
            ResponseType::BillingSupport => write!(f, "billing_support"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePlan {
    pub actions: Vec<Action>,
    pub response_type: ResponseType,
}

impl ResponsePlan {
    fn push(&mut self, action: Action, response_type: ResponseType) {
        self.actions.push(action);
        self.response_type = response_type;
    }
}

pub struct ResponsePlanner;

impl ResponsePlanner {
    pub fn plan(analysis: &Analysis, original_message: &str) -> ResponsePlan {
        let mut plan = ResponsePlan::default();

        if analysis.has_intent(Intent::OrderTracking) {
            plan.push(
                Action::OrderLookup {
                    email: analysis.entities.email.clone(),
                    order_numbers: analysis.entities.order_numbers.clone(),
                },
                ResponseType::OrderStatus,
            );
        }

        if analysis.has_intent(Intent::ProductSearch) {
            plan.push(
                Action::ProductSearch {
                    query: Self::resolve_query(analysis, original_message),
                },
                ResponseType::ProductRecommendations,
            );
        }

        if analysis.requires_escalation {
            let reason = if analysis.has_intent(Intent::SupportEscalation) {
                EscalationReason::CustomerRequest
            } else {
                EscalationReason::SentimentAnalysis
            };
            plan.push(
                Action::Escalation {
                    priority: analysis.priority,
                    sentiment: analysis.sentiment,
                    reason,
                },
                ResponseType::Escalation,
            );
        }

        if analysis.has_intent(Intent::BillingInquiry) {
            plan.push(
                Action::TicketCreation {
                    category: planning_constants::BILLING_CATEGORY.to_string(),
                    priority: analysis.priority,
                },
                ResponseType::BillingSupport,
            );
        }

        plan
    }

    /// First extracted product, else the first message word containing a
    /// catalog keyword (keywords tried in list order), else `"general"`.
    fn resolve_query(analysis: &Analysis, original_message: &str) -> String {
        if let Some(product) = analysis.entities.products.first() {
            return product.clone();
        }

        let lowered = original_message.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        planning_constants::PRODUCT_KEYWORDS
            .iter()
            .find_map(|keyword| words.iter().find(|word| word.contains(keyword)))
            .map(|word| word.to_string())
            .unwrap_or_else(|| planning_constants::GENERAL_QUERY.to_string())
    }
}
