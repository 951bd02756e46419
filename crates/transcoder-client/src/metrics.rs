//! Transcoder request metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder. Labels stay low-cardinality:
//! operation names, outcome labels and error kinds, never resource names.

use metrics::{counter, histogram};

use crate::error::TranscoderResult;

/// Metric name constants for consistency.
pub mod names {
    /// Total Transcoder calls by operation and outcome.
    pub const REQUESTS_TOTAL: &str = "transcoder_requests_total";

    /// Call latency in seconds by operation and outcome.
    pub const LATENCY_SECONDS: &str = "transcoder_latency_seconds";

    /// Total retry attempts by operation and the error that caused them.
    pub const RETRIES_TOTAL: &str = "transcoder_retries_total";

    /// Retried calls by operation and how the retry loop ended.
    pub const RETRY_OUTCOMES_TOTAL: &str = "transcoder_retry_outcomes_total";

    /// Attempts taken by calls that needed more than one.
    pub const RETRY_ATTEMPTS: &str = "transcoder_retry_attempts";
}

/// How a retried call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A later attempt succeeded
    Recovered,
    /// Still failing with a retryable error when attempts ran out
    Exhausted,
    /// A later attempt failed with a non-retryable error
    Failed,
}

impl RetryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryOutcome::Recovered => "recovered",
            RetryOutcome::Exhausted => "exhausted",
            RetryOutcome::Failed => "failed",
        }
    }
}

/// Outcome label for a finished call: `ok` or the error kind.
pub fn outcome_label<T>(result: &TranscoderResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

/// Record metrics for a completed call.
pub fn record_request(operation: &str, outcome: &'static str, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt caused by an error of `error_kind`.
pub fn record_retry(operation: &str, error_kind: &'static str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "error" => error_kind
    )
    .increment(1);
}

/// Record how a call that was retried at least once ended.
pub fn record_retry_outcome(operation: &str, attempts: u32, outcome: RetryOutcome) {
    counter!(
        names::RETRY_OUTCOMES_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        names::RETRY_ATTEMPTS,
        "operation" => operation.to_string()
    )
    .record(attempts as f64);
}
