//! Token caching for Transcoder authentication.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh under a write lock
//! - Fallback to the existing token while it is still usable

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcp_auth::CustomServiceAccount;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{TranscoderError, TranscoderResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope accepted by the Transcoder API.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// An access token and when it stops being accepted.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Issues access tokens for the cache.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn fetch_token(&self, scopes: &[&str]) -> TranscoderResult<AccessToken>;
}

/// [`AccessTokenProvider`] backed by gcp_auth.
pub struct GcpTokenProvider {
    inner: Arc<dyn gcp_auth::TokenProvider>,
}

impl GcpTokenProvider {
    pub fn new(inner: Arc<dyn gcp_auth::TokenProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AccessTokenProvider for GcpTokenProvider {
    async fn fetch_token(&self, scopes: &[&str]) -> TranscoderResult<AccessToken> {
        let token = self.inner.token(scopes).await.map_err(|e| {
            TranscoderError::auth_error(format!("Failed to obtain auth token: {}", e))
        })?;
        Ok(AccessToken {
            value: token.as_str().to_string(),
            expires_at: token.expires_at(),
        })
    }
}

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// Refreshable provider (service account key, ADC, or a custom issuer)
    Provider(Arc<dyn AccessTokenProvider>),
    /// Pre-issued bearer token, used as-is
    Fixed(String),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Provider(_) => f.write_str("TokenSource::Provider"),
            TokenSource::Fixed(_) => f.write_str("TokenSource::Fixed(<redacted>)"),
        }
    }
}

impl TokenSource {
    /// Discover credentials.
    ///
    /// `GOOGLE_APPLICATION_CREDENTIALS` wins when set; otherwise gcp_auth walks
    /// the ADC chain (gcloud user credentials, metadata server).
    pub async fn discover() -> TranscoderResult<Self> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            TranscoderError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        if let Some(sa) = service_account {
            debug!("Using service account from GOOGLE_APPLICATION_CREDENTIALS");
            return Ok(TokenSource::Provider(Arc::new(GcpTokenProvider::new(Arc::new(sa)))));
        }

        let provider = gcp_auth::provider().await.map_err(|e| {
            TranscoderError::auth_error(format!(
                "No Google credentials found. Set GOOGLE_APPLICATION_CREDENTIALS or run \
                 `gcloud auth application-default login`: {}",
                e
            ))
        })?;
        debug!("Using Application Default Credentials");
        Ok(TokenSource::Provider(Arc::new(GcpTokenProvider::new(provider))))
    }
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Check if token is still valid with refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Check if token is technically still usable (even if refresh is needed).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    source: TokenSource,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: TokenSource) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Cache that always hands out `token`.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::new(TokenSource::Fixed(token.into()))
    }

    /// Cache refreshed from `provider`.
    pub fn from_provider(provider: Arc<dyn AccessTokenProvider>) -> Self {
        Self::new(TokenSource::Provider(provider))
    }

    /// Whether invalidating can yield a different token.
    pub fn can_refresh(&self) -> bool {
        matches!(self.source, TokenSource::Provider(_))
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> TranscoderResult<String> {
        let auth = match &self.source {
            TokenSource::Fixed(token) => return Ok(token.clone()),
            TokenSource::Provider(auth) => auth,
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        Self::refresh_token(auth.as_ref(), &mut cache).await
    }

    async fn refresh_token(
        auth: &dyn AccessTokenProvider,
        cache: &mut Option<CachedToken>,
    ) -> TranscoderResult<String> {
        match auth.fetch_token(&[CLOUD_PLATFORM_SCOPE]).await {
            Ok(token) => {
                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at;

                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        // Already expired: force a refresh on the next request
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: token.value.clone(),
                    expires_at,
                });

                debug!("Refreshed Transcoder auth token");
                Ok(token.value)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(match e {
                    TranscoderError::AuthError(_) => e,
                    other => TranscoderError::auth_error(format!(
                        "Failed to obtain auth token: {}",
                        other
                    )),
                })
            }
        }
    }
}
