//! Transcoder client error types.

use thiserror::Error;
use transcoder_models::ResourceNameError;

/// Result type for Transcoder operations.
pub type TranscoderResult<T> = Result<T, TranscoderError>;

/// Errors that can occur during Transcoder API calls.
#[derive(Debug, Error)]
pub enum TranscoderError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Rate limited, retry after {0}ms: {1}")]
    RateLimited(u64, String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    InvalidResourceName(#[from] ResourceNameError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Delay assumed for a 429 without a usable Retry-After header.
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

impl TranscoderError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Map an HTTP error status to an error variant.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            400 => Self::InvalidArgument(msg),
            401 => Self::AuthError(msg),
            403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            409 => Self::AlreadyExists(msg),
            429 => Self::RateLimited(DEFAULT_RETRY_AFTER_MS, msg),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::InvalidArgument(_) => Some(400),
            Self::AuthError(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::AlreadyExists(_) => Some(409),
            Self::RateLimited(..) => Some(429),
            Self::ServerError(status, _) => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-requested delay before retrying.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited(ms, _) => Some(*ms),
            _ => None,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthError(_) => "auth",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::RateLimited(..) => "rate_limited",
            Self::ServerError(..) => "server_error",
            Self::RequestFailed(_) => "request_failed",
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidResourceName(_) => "invalid_resource_name",
            Self::Network(e) if e.is_timeout() => "timeout",
            Self::Network(_) => "network",
            Self::Json(_) => "json",
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited(..) | Self::ServerError(..)
        )
    }
}
