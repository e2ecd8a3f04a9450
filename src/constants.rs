//! Global Constants
//!
//! Centralized constants for scoring, orchestration and provider access.
//! All magic numbers should be defined here with documentation.

/// Message analysis constants
pub mod analysis {
    /// Confidence added per detected intent category
    pub const INTENT_CONFIDENCE_STEP: f64 = 0.2;

    /// Upper bound on analysis confidence
    pub const MAX_CONFIDENCE: f64 = 1.0;

    /// Negative matches at or above this count escalate without an urgent match
    pub const NEGATIVE_ESCALATION_THRESHOLD: usize = 2;
}

/// Response planning constants
pub mod planning {
    /// Keywords scanned (in order) to derive a product search query
    pub const PRODUCT_KEYWORDS: &[&str] = &[
        "headphone",
        "speaker",
        "earphone",
        "earbud",
        "bluetooth",
        "wireless",
        "cable",
    ];

    /// Query used when no product keyword appears in the message
    pub const GENERAL_QUERY: &str = "general";

    /// Ticket category for billing tickets
    pub const BILLING_CATEGORY: &str = "billing";
}

/// Orchestrator constants
pub mod orchestrator {
    /// Most recent orders fetched when falling back to the customer's history
    pub const RECENT_ORDERS_LIMIT: usize = 5;

    /// Products requested from the live catalog per search
    pub const PRODUCT_RESULTS_LIMIT: usize = 10;

    /// Prefix of locally generated escalation ticket IDs
    pub const ESCALATION_PLACEHOLDER_PREFIX: &str = "ESC";

    /// Prefix of locally generated support ticket IDs
    pub const TICKET_PLACEHOLDER_PREFIX: &str = "TKT";
}

/// Response synthesis constants
pub mod synthesis {
    /// Maximum product cards attached to a recommendation reply
    pub const MAX_PRODUCT_CARDS: usize = 3;

    /// Expected response time for escalations
    pub const ESCALATION_SLA: &str = "~15 minutes";

    /// Expected response time for billing tickets
    pub const BILLING_SLA: &str = "1–2 hours";
}

/// HTTP/Network constants
pub mod network {
    /// Default gateway request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    /// Maximum retries for throttled requests
    pub const MAX_RATE_LIMIT_RETRIES: usize = 3;

    /// Base delay for exponential backoff on 429 (milliseconds)
    pub const MIN_RETRY_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_RETRY_DELAY_SECS: u64 = 10;

    /// Default Shopify Admin API version
    pub const SHOPIFY_API_VERSION: &str = "2024-01";
}
