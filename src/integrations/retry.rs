//! Gateway Call Policy
//!
//! Bounds every provider request with a timeout and retries throttled
//! (HTTP 429) responses with exponential backoff. Other failures are
//! returned immediately; the orchestrator isolates them per action.
//!
//! ## Usage
//!
//! ```ignore
//! let policy = CallPolicy::from_config(&config.gateway);
//! let order = call_with_policy(&policy, "find order", || client.fetch_order(n)).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::warn;

use crate::config::GatewayConfig;
use crate::constants::network as net_constants;
use crate::types::{Result, SupportError};

/// Timeout and retry settings applied to each provider request
#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after a throttled response
    pub max_retries: usize,
    /// First backoff delay
    pub min_delay: Duration,
    /// Backoff cap
    pub max_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            max_retries: net_constants::MAX_RATE_LIMIT_RETRIES,
            min_delay: Duration::from_millis(net_constants::MIN_RETRY_DELAY_MS),
            max_delay: Duration::from_secs(net_constants::MAX_RETRY_DELAY_SECS),
        }
    }
}

impl CallPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            min_delay: Duration::from_millis(config.min_retry_delay_ms),
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(SupportError::timeout(operation_name, timeout)),
    }
}

/// Delay requested by a throttled response's `Retry-After` header.
///
/// Only the delta-seconds form is honoured; HTTP dates, negative or
/// fractional values and garbage yield `None` so the backoff schedule applies.
pub fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Run `call` under the policy: each attempt is time-bounded, and only
/// retryable (rate-limited) failures are attempted again. A provider's
/// `Retry-After` hint replaces the computed delay, capped at `max_delay`.
pub async fn call_with_policy<T, F, Fut>(
    policy: &CallPolicy,
    operation_name: &str,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_delay = policy.max_delay;
    (|| with_timeout(policy.timeout, call(), operation_name))
        .retry(policy.backoff())
        .when(|err: &SupportError| err.is_retryable())
        .adjust(move |err: &SupportError, delay: Option<Duration>| {
            // `None` means the schedule is exhausted; keep it that way
            delay.map(|d| err.retry_after().map_or(d, |hint| hint.min(max_delay)))
        })
        .notify(|err: &SupportError, delay: Duration| {
            warn!(
                operation = operation_name,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Provider throttled, backing off"
            );
        })
        .await
}
