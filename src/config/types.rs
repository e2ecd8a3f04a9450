//! Configuration Types
//!
//! All configuration structures with sensible defaults. Secrets are plain
//! strings here and become `SecretString` inside the provider clients.

use serde::{Deserialize, Serialize};

use crate::constants::{network, orchestrator};
use crate::types::{Result, SupportError};

const REDACTED: &str = "[REDACTED]";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Commerce provider (Shopify)
    pub commerce: CommerceConfig,

    /// Ticketing provider (Freshdesk)
    pub ticketing: TicketingConfig,

    /// Timeouts and retries for every provider request
    pub gateway: GatewayConfig,

    pub orchestrator: OrchestratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            commerce: CommerceConfig::default(),
            ticketing: TicketingConfig::default(),
            gateway: GatewayConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SupportError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.timeout_secs == 0 {
            return Err(SupportError::Config(
                "gateway.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.orchestrator.recent_orders_limit == 0 {
            return Err(SupportError::Config(
                "orchestrator.recent_orders_limit must be greater than 0".to_string(),
            ));
        }

        if self.orchestrator.product_results_limit == 0 {
            return Err(SupportError::Config(
                "orchestrator.product_results_limit must be greater than 0".to_string(),
            ));
        }

        if self.commerce.api_version.trim().is_empty() {
            return Err(SupportError::Config(
                "commerce.api_version must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| REDACTED.to_string());
        let mut config = self.clone();
        config.commerce.access_token = mask(&self.commerce.access_token);
        config.ticketing.api_key = mask(&self.ticketing.api_key);
        config
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommerceConfig {
    /// Store domain, e.g. `acme.myshopify.com`
    pub shop_domain: Option<String>,

    /// Full Admin API base URL; overrides the one derived from `shop_domain`
    pub api_base: Option<String>,

    /// Admin API version
    pub api_version: String,

    /// Admin API access token (falls back to `SHOPIFY_ACCESS_TOKEN`)
    pub access_token: Option<String>,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            shop_domain: None,
            api_base: None,
            api_version: network::SHOPIFY_API_VERSION.to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingConfig {
    /// Helpdesk domain, e.g. `acme.freshdesk.com`
    pub domain: Option<String>,

    /// Full API base URL; overrides the one derived from `domain`
    pub api_base: Option<String>,

    /// API key (falls back to `FRESHDESK_API_KEY`)
    pub api_key: Option<String>,
}

// =============================================================================
// Gateway & Orchestrator
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after an HTTP 429
    pub max_retries: usize,

    /// First backoff delay in milliseconds
    pub min_retry_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_retries: network::MAX_RATE_LIMIT_RETRIES,
            min_retry_delay_ms: network::MIN_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Orders returned when looking up a customer's history by email
    pub recent_orders_limit: usize,

    /// Maximum products per search
    pub product_results_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            recent_orders_limit: orchestrator::RECENT_ORDERS_LIMIT,
            product_results_limit: orchestrator::PRODUCT_RESULTS_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrator.recent_orders_limit, 5);
        assert_eq!(config.commerce.api_version, "2024-01");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.gateway.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SupportError::Config(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = Config::default();
        config.orchestrator.product_results_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.commerce.access_token = Some("shpat_live".to_string());
        let shown = config.redacted();
        assert_eq!(shown.commerce.access_token.as_deref(), Some(REDACTED));
        assert!(shown.ticketing.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [commerce]
            shop_domain = "acme.myshopify.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.commerce.shop_domain.as_deref(), Some("acme.myshopify.com"));
        assert_eq!(config.gateway.timeout_secs, 15);
    }
}
