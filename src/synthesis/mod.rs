//! Response Synthesizer
//!
//! Turns a [`ResponsePlan`] and its [`IntegrationResults`] into the reply the
//! customer sees. Dispatch is on `plan.response_type` alone, so exactly one
//! template family runs per call, and every branch produces non-empty text.
//!
//! ## Sections
//!
//! - **Dispatch**: [`ResponseSynthesizer::synthesize`]
//! - **Order status**: fallback, not-found and found templates
//! - **Products**: clarifying prompt or product cards
//! - **Tickets**: escalation and billing confirmations

mod response;

pub use response::{
    AffordanceKind, ResponseMetadata, ResponseSource, SmartResponse, SuggestedAction,
};

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::constants::{orchestrator as orch_constants, synthesis as synth_constants};
use crate::integrations::{Order, Product};
use crate::orchestrator::{
    COMMERCE_KEY, CommerceResult, DataSource, IntegrationResults, TICKETING_KEY, TicketingResult,
};
use crate::planner::{Action, ResponsePlan, ResponseType};

// =============================================================================
// Order State
// =============================================================================

/// Customer-facing order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderState {
    Cancelled,
    Delivered,
    PaymentProcessing,
    Processing,
    PartiallyShipped,
    Shipped,
}

impl OrderState {
    /// First matching rule wins
    pub fn of(order: &Order) -> Self {
        let fulfillment = order.fulfillment_status.as_deref();
        let financial = order.financial_status.as_deref();

        if order.cancelled_at.is_some() {
            Self::Cancelled
        } else if fulfillment == Some("fulfilled") {
            Self::Delivered
        } else if financial == Some("pending") {
            Self::PaymentProcessing
        } else if financial == Some("paid") && fulfillment.is_none() {
            Self::Processing
        } else if fulfillment == Some("partial") {
            Self::PartiallyShipped
        } else if fulfillment == Some("shipped") {
            Self::Shipped
        } else {
            Self::Processing
        }
    }

    fn delivery_estimate(self) -> &'static str {
        match self {
            Self::Cancelled => "This order was cancelled, so nothing will be delivered.",
            Self::Delivered => "Your order has been delivered.",
            Self::Shipped => "Estimated delivery: 2–5 business days from shipment.",
            Self::PartiallyShipped => {
                "Part of your order is on its way; the rest will ship separately."
            }
            Self::PaymentProcessing => "We'll ship as soon as your payment clears.",
            Self::Processing => "Your order should ship within 1–2 business days.",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cancelled => "Cancelled",
            Self::Delivered => "Delivered",
            Self::PaymentProcessing => "Payment Processing",
            Self::Processing => "Processing",
            Self::PartiallyShipped => "Partially Shipped",
            Self::Shipped => "Shipped",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Product Cards
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub variants: Vec<VariantCard>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantCard {
    pub title: String,
    pub price: String,
    pub available: bool,
    pub sku: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            description: product
                .body_html
                .as_deref()
                .map(strip_html)
                .unwrap_or_default(),
            vendor: product.vendor.clone(),
            product_type: product.product_type.clone(),
            tags: product.tag_list(),
            images: product.images.iter().map(|i| i.src.clone()).collect(),
            variants: product
                .variants
                .iter()
                .map(|v| VariantCard {
                    title: v.title.clone(),
                    price: v.price.clone(),
                    available: v.available(),
                    sku: v.sku.clone(),
                })
                .collect(),
            url: product.url.clone(),
        }
    }
}

/// Drop tags and collapse whitespace
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Synthesizer
// =============================================================================

const PRODUCT_CATEGORIES: &[&str] = &["Headphones", "Speakers", "Earbuds", "Accessories"];

pub struct ResponseSynthesizer;

impl ResponseSynthesizer {
    pub fn synthesize(
        plan: &ResponsePlan,
        results: &IntegrationResults,
        _original_message: &str,
    ) -> SmartResponse {
        match plan.response_type {
            ResponseType::OrderStatus => Self::order_status(plan, results.commerce.as_ref()),
            ResponseType::ProductRecommendations => {
                Self::product_recommendations(results.commerce.as_ref())
            }
            ResponseType::Escalation => Self::escalation(results.ticketing.as_ref()),
            ResponseType::BillingSupport => Self::billing_support(results.ticketing.as_ref()),
            ResponseType::Standard => Self::standard(),
        }
    }

    /// Reply used when the pipeline itself fails
    pub fn trouble() -> SmartResponse {
        SmartResponse::new(
            "I'm having trouble processing your request right now. \
             Let me connect you with a human agent who can help.",
            ResponseSource::Fallback,
        )
        .action(SuggestedAction::new(
            AffordanceKind::Escalate,
            "Talk to a human agent",
        ))
    }

    // -------------------------------------------------------------------------
    // Order status
    // -------------------------------------------------------------------------

    fn order_status(plan: &ResponsePlan, commerce: Option<&CommerceResult>) -> SmartResponse {
        let requested = plan.actions.iter().find_map(|action| match action {
            Action::OrderLookup { order_numbers, .. } => order_numbers.first().cloned(),
            _ => None,
        });

        let Some(commerce) = commerce else {
            return Self::order_unavailable(requested.as_deref());
        };

        match commerce.orders.first() {
            Some(order) => Self::order_found(order),
            None => Self::order_not_found(requested.as_deref()),
        }
    }

    fn order_unavailable(requested: Option<&str>) -> SmartResponse {
        let subject = requested
            .map(|n| format!("order #{}", n))
            .unwrap_or_else(|| "your order".to_string());
        let text = format!(
            "I'd like to help you track {}, but I can't reach our order system right now. \
             Your confirmation email has the latest tracking details, and your account page \
             shows every order. I can also connect you with a team member who can look it up.",
            subject
        );

        SmartResponse::new(text, ResponseSource::Template)
            .action(SuggestedAction::new(AffordanceKind::Escalate, "Talk to a team member"))
            .action(SuggestedAction::new(
                AffordanceKind::CheckEmail,
                "Check my confirmation email",
            ))
            .action(SuggestedAction::new(AffordanceKind::Login, "Log in to my account"))
    }

    fn order_not_found(requested: Option<&str>) -> SmartResponse {
        let subject = requested
            .map(|n| format!("an order matching #{}", n))
            .unwrap_or_else(|| "any orders for your email".to_string());
        let text = format!(
            "I couldn't find {}. A few common reasons:\n\
             • The order was placed with a different email address\n\
             • The order number is slightly different\n\
             • The order was placed very recently and isn't in our system yet",
            subject
        );

        SmartResponse::new(text, ResponseSource::Live)
            .used(COMMERCE_KEY)
            .action(SuggestedAction::new(AffordanceKind::Escalate, "Talk to a team member"))
            .action(SuggestedAction::new(
                AffordanceKind::TryAgain,
                "Try a different order number or email",
            ))
    }

    fn order_found(order: &Order) -> SmartResponse {
        let state = OrderState::of(order);
        let title = order
            .line_items
            .first()
            .map(|item| item.title.as_str())
            .unwrap_or("Your order");

        let mut lines = vec![
            format!("Here's the latest on order {}:", order.name),
            String::new(),
            title.to_string(),
            format!("Status: {}", state),
            format!("Total: {} {}", order.total_price, order.currency)
                .trim_end()
                .to_string(),
        ];
        if let Some(tracking) = order.tracking_number() {
            lines.push(format!("Tracking number: {}", tracking));
        }
        lines.push(state.delivery_estimate().to_string());

        let mut response = SmartResponse::new(lines.join("\n"), ResponseSource::Live)
            .used(COMMERCE_KEY)
            .extra(
                "order",
                json!({
                    "name": order.name,
                    "status": state.to_string(),
                    "total": order.total_price,
                    "currency": order.currency,
                    "trackingNumber": order.tracking_number(),
                }),
            );

        if let Some(tracking) = order.tracking_number() {
            let target = order.tracking_url().unwrap_or(tracking);
            response = response.action(
                SuggestedAction::new(AffordanceKind::TrackOrder, "Track my package")
                    .with_value(target),
            );
        }
        response.action(SuggestedAction::new(
            AffordanceKind::Escalate,
            "Talk to a team member",
        ))
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    fn product_recommendations(commerce: Option<&CommerceResult>) -> SmartResponse {
        let products = commerce.map(|c| c.products.as_slice()).unwrap_or_default();

        if products.is_empty() {
            let mut response = SmartResponse::new(
                "I'd love to help you find the right product. What are you shopping for?",
                ResponseSource::Template,
            );
            for category in PRODUCT_CATEGORIES {
                response = response.action(
                    SuggestedAction::new(AffordanceKind::QuickReply, *category)
                        .with_value(category.to_lowercase()),
                );
            }
            return response;
        }

        let cards: Vec<ProductCard> = products
            .iter()
            .take(synth_constants::MAX_PRODUCT_CARDS)
            .map(ProductCard::from)
            .collect();
        let source = match commerce.map(|c| c.source) {
            Some(DataSource::Demo) => ResponseSource::Demo,
            _ => ResponseSource::Live,
        };
        let text = if cards.len() == 1 {
            "Here's a product you might like:".to_string()
        } else {
            format!("Here are {} products you might like:", cards.len())
        };

        SmartResponse::new(text, source)
            .used(COMMERCE_KEY)
            .extra("products", json!(cards))
    }

    // -------------------------------------------------------------------------
    // Tickets
    // -------------------------------------------------------------------------

    fn ticket_reference(ticket: Option<&TicketingResult>, prefix: &str) -> (String, ResponseSource) {
        match ticket {
            Some(t) if t.placeholder => (t.ticket_id.clone(), ResponseSource::Placeholder),
            Some(t) => (t.ticket_id.clone(), ResponseSource::Live),
            None => (placeholder_ticket_id(prefix), ResponseSource::Placeholder),
        }
    }

    fn escalation(ticket: Option<&TicketingResult>) -> SmartResponse {
        let (ticket_id, source) =
            Self::ticket_reference(ticket, orch_constants::ESCALATION_PLACEHOLDER_PREFIX);
        let text = format!(
            "I understand, and I'm connecting you with a member of our support team. \
             Your reference number is {}. A team member will reach out within {}.",
            ticket_id,
            synth_constants::ESCALATION_SLA
        );
        Self::ticket_reply(text, ticket_id, source, ticket.is_some())
    }

    fn billing_support(ticket: Option<&TicketingResult>) -> SmartResponse {
        let (ticket_id, source) =
            Self::ticket_reference(ticket, orch_constants::TICKET_PLACEHOLDER_PREFIX);
        let text = format!(
            "I've passed your billing question to our billing team under ticket {}. \
             They usually respond within {} and can review charges, refunds and invoices \
             on your account.",
            ticket_id,
            synth_constants::BILLING_SLA
        );
        Self::ticket_reply(text, ticket_id, source, ticket.is_some())
    }

    fn ticket_reply(
        text: String,
        ticket_id: String,
        source: ResponseSource,
        from_provider: bool,
    ) -> SmartResponse {
        let mut response = SmartResponse::new(text, source)
            .extra("ticketId", json!(ticket_id))
            .action(SuggestedAction::new(AffordanceKind::LiveChat, "Start live chat"))
            .action(SuggestedAction::new(AffordanceKind::Callback, "Request a callback"));
        if from_provider {
            response = response.used(TICKETING_KEY);
        }
        response
    }

    fn standard() -> SmartResponse {
        SmartResponse::new(
            "Thanks for reaching out! I can help you track an order, find products, \
             sort out billing questions, or connect you with our support team. \
             What can I do for you?",
            ResponseSource::Template,
        )
    }
}

/// Time-based ticket number used when no provider ticket exists
pub fn placeholder_ticket_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_millis())
}
