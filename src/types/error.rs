//! Unified Error Type System
//!
//! Centralized error types for the pipeline and its provider gateways.
//! Provider failures are classified so the gateway can decide whether a
//! request is worth retrying.
//!
//! ## Error Categories
//!
//! - **RateLimit**: Provider throttled the request (backoff and retry)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Auth**: Credentials rejected (fail fast)
//! - **NotFound**: Resource does not exist (not an outage)
//! - **Unavailable**: Provider-side outage (fail, orchestrator isolates it)

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry same provider
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Requested resource does not exist
    NotFound,
    /// Provider-side failure
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Response body could not be decoded
    Parse,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Parse => write!(f, "PARSE_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Only throttling is retried inside the gateway; everything else is
    /// surfaced to the orchestrator, which isolates it per action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Provider error with category and retry hints
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Retry-After hint from the provider
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status returned by a provider API
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> ProviderError {
        match status {
            429 => ProviderError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => ProviderError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => ProviderError::with_provider(ErrorCategory::BadRequest, message, provider),
            404 => ProviderError::with_provider(ErrorCategory::NotFound, message, provider),
            500..=599 => {
                ProviderError::with_provider(ErrorCategory::Unavailable, message, provider)
            }
            _ => ProviderError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a transport-level failure from reqwest
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> ProviderError {
        let category = if err.is_timeout() || err.is_connect() || err.is_request() {
            ErrorCategory::Network
        } else if err.is_decode() {
            ErrorCategory::Parse
        } else {
            ErrorCategory::Unknown
        };
        ProviderError::with_provider(category, err.to_string(), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Classified provider failure
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("Provider not connected: {0}")]
    NotConnected(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl From<ProviderError> for SupportError {
    fn from(err: ProviderError) -> Self {
        SupportError::Provider(err)
    }
}

pub type Result<T> = std::result::Result<T, SupportError>;

impl SupportError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Whether the gateway should retry the request that produced this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Retry-After hint carried by a throttled provider response
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider(e) => e.retry_after,
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
