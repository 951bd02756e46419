//! Transcoder REST API client.
//!
//! This crate provides:
//! - Job template create, get, list and delete calls
//! - Service account / Application Default Credentials auth via gcp_auth,
//!   or any custom [`AccessTokenProvider`]
//! - Typed errors mapped from HTTP status and Google error bodies
//! - Retry with exponential backoff for idempotent calls

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;


pub use client::{TranscoderClient, TranscoderConfig};
pub use error::{TranscoderError, TranscoderResult};
pub use retry::RetryConfig;
pub use token_cache::{AccessToken, AccessTokenProvider, TokenCache};
pub use types::ListJobTemplatesResponse;
