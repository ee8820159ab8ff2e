//! Exponential back-off for dashboard calls.
//!
//! [`retry_with_backoff`] retries transient failures (network errors, 5xx,
//! 429) with a deterministic delay of `base × 2^(n-1)`, capped. Anything else
//! is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first call.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_millis(max_retries: u32, base_ms: u64, cap_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::from_millis(base_ms),
            backoff_cap: Duration::from_millis(cap_ms),
        }
    }
}

/// Returns `true` for errors worth another attempt.
///
/// **Retriable:** timeouts, connection failures, HTTP 5xx and 429.
/// **Not retriable:** other 4xx, malformed bodies, a bad base URL.
pub(crate) fn is_retriable(err: &DashboardError) -> bool {
    match err {
        DashboardError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        DashboardError::Status { status, .. } => *status >= 500 || *status == 429,
        DashboardError::Deserialize { .. } | DashboardError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before retry number `retry` (1-based): `base × 2^(retry-1)`,
/// never more than `cap`.
#[must_use]
pub fn backoff_delay(retry: u32, base: Duration, cap: Duration) -> Duration {
    let exponent = retry.saturating_sub(1).min(20);
    base.saturating_mul(1u32 << exponent).min(cap)
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors.
///
/// With the default policy the sleeps are 1 s, 2 s and 4 s, so a call that
/// keeps failing is attempted four times before its last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, DashboardError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DashboardError>>,
{
    let mut retry = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || retry >= policy.max_retries {
                    return Err(err);
                }
                retry += 1;
                let delay = backoff_delay(retry, policy.backoff_base, policy.backoff_cap);
                tracing::warn!(
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "dashboard transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
