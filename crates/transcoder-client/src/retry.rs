//! Retry policy with exponential backoff and jitter.
//!
//! - Exponential backoff with full jitter
//! - Respects Retry-After on 429
//! - Configurable base and max delays

use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use crate::error::{TranscoderError, TranscoderResult};
use crate::metrics::{record_retry, record_retry_outcome, RetryOutcome};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_parse("TRANSCODER_MAX_RETRIES").unwrap_or(defaults.max_retries),
            base_delay_ms: env_parse("TRANSCODER_RETRY_BASE_MS").unwrap_or(defaults.base_delay_ms),
            max_delay_ms: env_parse("TRANSCODER_RETRY_MAX_MS").unwrap_or(defaults.max_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

/// Execute an async operation with retry.
///
/// Retries network errors, 429 (honoring Retry-After) and 5xx. Everything
/// else is returned immediately.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    op: F,
) -> TranscoderResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = TranscoderResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let span = info_span!("transcoder_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => {
                if attempt > 0 {
                    record_retry_outcome(operation, attempt + 1, RetryOutcome::Recovered);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt, e.retry_after_ms());

                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transcoder request failed, retrying: {}",
                    e
                );

                record_retry(operation, e.kind());

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => {
                if attempt > 0 {
                    let outcome = if e.is_retryable() {
                        RetryOutcome::Exhausted
                    } else {
                        RetryOutcome::Failed
                    };
                    record_retry_outcome(operation, attempt + 1, outcome);
                }
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| TranscoderError::request_failed("Unknown error")))
}

/// Calculate retry delay with exponential backoff and full jitter.
///
/// A server-requested delay is honored up to `max_delay_ms`.
fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(after) = retry_after_ms {
        return Duration::from_millis(after.min(config.max_delay_ms));
    }

    // base * 2^attempt, capped
    let exp_delay = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = exp_delay.min(config.max_delay_ms);

    // Full jitter from the clock's sub-second nanos
    let jittered = if capped_delay > 0 {
        use std::time::SystemTime;
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let random_factor = (nanos % 1000) as f64 / 1000.0;
        ((capped_delay as f64) * random_factor) as u64
    } else {
        0
    };

    Duration::from_millis(jittered.max(config.base_delay_ms.min(capped_delay)))
}
