//! Transcoder REST API client.
//!
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter for idempotent calls
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, info_span, Instrument};
use transcoder_models::{JobTemplate, JobTemplateName, LocationName};

use crate::error::{TranscoderError, TranscoderResult};
use crate::metrics::{outcome_label, record_request};
use crate::retry::RetryConfig;
use crate::token_cache::{TokenCache, TokenSource};
use crate::types::{GoogleErrorBody, ListJobTemplatesResponse};

/// Public Transcoder API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://transcoder.googleapis.com";

/// REST API version.
pub const API_VERSION: &str = "v1";

// =============================================================================
// Configuration
// =============================================================================

/// Transcoder client configuration.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Service base URL, without the API version
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Fixed bearer token; credentials are discovered when unset
    pub access_token: Option<String>,
    /// Retry configuration for idempotent calls
    pub retry: RetryConfig,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            access_token: None,
            retry: RetryConfig::default(),
        }
    }
}

impl TranscoderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("TRANSCODER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("TRANSCODER_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Self {
            endpoint: std::env::var("TRANSCODER_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            access_token: std::env::var("TRANSCODER_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            retry: RetryConfig::from_env(),
        }
    }

    /// Base URL including the API version.
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), API_VERSION)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Transcoder REST API client.
#[derive(Clone)]
pub struct TranscoderClient {
    http: Client,
    config: TranscoderConfig,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl TranscoderClient {
    /// Create a new client, discovering credentials unless a token is configured.
    pub async fn new(config: TranscoderConfig) -> TranscoderResult<Self> {
        let source = match &config.access_token {
            Some(token) => TokenSource::Fixed(token.clone()),
            None => TokenSource::discover().await?,
        };
        Self::with_token_cache(config, TokenCache::new(source))
    }

    /// Create from environment variables.
    pub async fn from_env() -> TranscoderResult<Self> {
        Self::new(TranscoderConfig::from_env()).await
    }

    /// Create a client around an existing token cache.
    pub fn with_token_cache(config: TranscoderConfig, token_cache: TokenCache) -> TranscoderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("transcoder-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TranscoderError::Network)?;

        let base_url = config.base_url();

        Ok(Self {
            http,
            config,
            base_url,
            token_cache: Arc::new(token_cache),
        })
    }

    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// `projects/{project}/locations/{location}` with each segment percent-encoded.
    fn location_path(parent: &LocationName) -> String {
        format!(
            "projects/{}/locations/{}",
            urlencoding::encode(&parent.project_id),
            urlencoding::encode(&parent.location)
        )
    }

    /// Path of a job template with each segment percent-encoded.
    fn template_path(name: &JobTemplateName) -> String {
        format!(
            "{}/jobTemplates/{}",
            Self::location_path(&name.parent),
            urlencoding::encode(&name.template_id)
        )
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    // =========================================================================
    // Job Templates
    // =========================================================================

    /// Create a job template under `parent`.
    ///
    /// Sent once. A replay after an ambiguous failure could hit the template
    /// this call already created, so transient errors are returned as-is.
    pub async fn create_job_template(
        &self,
        parent: &LocationName,
        template_id: &str,
        template: &JobTemplate,
    ) -> TranscoderResult<JobTemplate> {
        let url = format!(
            "{}/{}/jobTemplates?jobTemplateId={}",
            self.base_url,
            Self::location_path(parent),
            urlencoding::encode(template_id)
        );

        self.execute_request("create_job_template", template_id, async {
            let response = self
                .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(template))
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => {
                    let created: JobTemplate = response.json().await?;
                    info!(name = %created.name, "Created job template");
                    Ok(created)
                }
                _ => Err(Self::handle_error_response(&url, response).await),
            }
        })
        .await
    }

    /// Fetch a job template. Returns `None` if it does not exist.
    pub async fn get_job_template(&self, name: &JobTemplateName) -> TranscoderResult<Option<JobTemplate>> {
        let url = format!("{}/{}", self.base_url, Self::template_path(name));

        self.execute_request("get_job_template", &name.template_id, async {
            self.with_retry("get_job_template", || async {
                let response = self
                    .send_authorized(|token| self.http.get(&url).bearer_auth(token))
                    .await?;

                match response.status() {
                    StatusCode::OK => Ok(Some(response.json::<JobTemplate>().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    _ => Err(Self::handle_error_response(&url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// List job templates under `parent`, one page at a time.
    pub async fn list_job_templates(
        &self,
        parent: &LocationName,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> TranscoderResult<ListJobTemplatesResponse> {
        let mut url = format!("{}/{}/jobTemplates", self.base_url, Self::location_path(parent));
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        self.execute_request("list_job_templates", &parent.location, async {
            self.with_retry("list_job_templates", || async {
                let response = self
                    .send_authorized(|token| self.http.get(&url).bearer_auth(token))
                    .await?;

                match response.status() {
                    StatusCode::OK => Ok(response.json::<ListJobTemplatesResponse>().await?),
                    _ => Err(Self::handle_error_response(&url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Delete a job template.
    ///
    /// With `allow_missing`, deleting a template that does not exist succeeds.
    pub async fn delete_job_template(
        &self,
        name: &JobTemplateName,
        allow_missing: bool,
    ) -> TranscoderResult<()> {
        let url = format!(
            "{}/{}?allowMissing={}",
            self.base_url,
            Self::template_path(name),
            allow_missing
        );

        self.execute_request("delete_job_template", &name.template_id, async {
            self.with_retry("delete_job_template", || async {
                let response = self
                    .send_authorized(|token| self.http.delete(&url).bearer_auth(token))
                    .await?;

                match response.status() {
                    StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                    StatusCode::NOT_FOUND if allow_missing => {
                        debug!("Job template {} already deleted", name);
                        Ok(())
                    }
                    _ => Err(Self::handle_error_response(&url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Execute with retry.
    pub async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> TranscoderResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = TranscoderResult<T>>,
    {
        crate::retry::with_retry(&self.config.retry, operation, op).await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send a request with a bearer token.
    ///
    /// An expired-token 401 drops the cached token and re-sends once with a
    /// freshly fetched one. Any other 401, or a 401 on a fixed token, is
    /// returned as an auth error.
    async fn send_authorized<B>(&self, build: B) -> TranscoderResult<Response>
    where
        B: Fn(&str) -> RequestBuilder,
    {
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) || !self.token_cache.can_refresh() {
            return Err(TranscoderError::auth_error(GoogleErrorBody::message_from(&body)));
        }

        debug!("Access token expired, refreshing and re-sending");
        self.token_cache.invalidate().await;
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscoderError::auth_error(GoogleErrorBody::message_from(&body)));
        }
        Ok(response)
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, resource: &str, fut: F) -> TranscoderResult<T>
    where
        F: std::future::Future<Output = TranscoderResult<T>>,
    {
        let span = info_span!("transcoder_request", operation = %operation, resource = %resource);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        record_request(operation, outcome_label(&result), latency_ms);

        result
    }

    async fn handle_error_response(url: &str, response: Response) -> TranscoderError {
        let status = response.status();

        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let msg = format!("{} failed: {}", url, GoogleErrorBody::message_from(&body));

        match (status, retry_after_secs) {
            (StatusCode::TOO_MANY_REQUESTS, Some(secs)) => {
                TranscoderError::RateLimited(secs.saturating_mul(1000), msg)
            }
            _ => TranscoderError::from_http_status(status.as_u16(), msg),
        }
    }
}
