//! HTTP-level tests for the job template calls against a mock Transcoder API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use transcoder_client::token_cache::{AccessToken, AccessTokenProvider, TokenCache};
use transcoder_client::{
    RetryConfig, TranscoderClient, TranscoderConfig, TranscoderError, TranscoderResult,
};
use transcoder_models::{sd_hd_mp4_template, JobTemplateName, LocationName, TopicName};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEMPLATES_PATH: &str = "/v1/projects/my-project/locations/us-central1/jobTemplates";
const TEMPLATE_PATH: &str =
    "/v1/projects/my-project/locations/us-central1/jobTemplates/my-job-template";

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

fn client_with(server: &MockServer, token_cache: TokenCache, retry: RetryConfig) -> TranscoderClient {
    let config = TranscoderConfig {
        endpoint: server.uri(),
        retry,
        ..Default::default()
    };
    TranscoderClient::with_token_cache(config, token_cache).unwrap()
}

fn test_client(server: &MockServer) -> TranscoderClient {
    client_with(server, TokenCache::fixed("test-token"), fast_retry())
}

/// Issues `token-1`, `token-2`, ... each valid for an hour.
#[derive(Default)]
struct SequentialTokens {
    issued: AtomicU32,
}

#[async_trait]
impl AccessTokenProvider for SequentialTokens {
    async fn fetch_token(&self, _scopes: &[&str]) -> TranscoderResult<AccessToken> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AccessToken {
            value: format!("token-{}", n),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    }
}

fn template_name() -> JobTemplateName {
    JobTemplateName::new("my-project", "us-central1", "my-job-template")
}

fn google_error(code: u16, status: &str, message: &str) -> serde_json::Value {
    json!({ "error": { "code": code, "status": status, "message": message } })
}

// =============================================================================
// create_job_template
// =============================================================================

#[tokio::test]
async fn test_create_sends_template_and_returns_created_resource() {
    let server = MockServer::start().await;
    let name = template_name();
    let template = sd_hd_mp4_template(&name, &TopicName::new("my-project", "my_pubsub_topic"));

    Mock::given(method("POST"))
        .and(path(TEMPLATES_PATH))
        .and(query_param("jobTemplateId", "my-job-template"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(&template))
        .respond_with(ResponseTemplate::new(200).set_body_json(&template))
        .expect(1)
        .mount(&server)
        .await;

    let created = test_client(&server)
        .create_job_template(&name.parent, &name.template_id, &template)
        .await
        .unwrap();

    assert_eq!(created.name, name.to_string());
    assert_eq!(created.config, template.config);
}

#[tokio::test]
async fn test_create_duplicate_template_is_already_exists() {
    let server = MockServer::start().await;
    let name = template_name();
    let template = sd_hd_mp4_template(&name, &TopicName::new("my-project", "t"));

    Mock::given(method("POST"))
        .and(path(TEMPLATES_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(google_error(
            409,
            "ALREADY_EXISTS",
            "Job template already exists",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_job_template(&name.parent, &name.template_id, &template)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::AlreadyExists(_)));
    assert!(err.to_string().contains("ALREADY_EXISTS: Job template already exists"));
}

#[tokio::test]
async fn test_create_is_not_retried_on_server_error() {
    let server = MockServer::start().await;
    let name = template_name();
    let template = sd_hd_mp4_template(&name, &TopicName::new("my-project", "t"));

    Mock::given(method("POST"))
        .and(path(TEMPLATES_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_job_template(&name.parent, &name.template_id, &template)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::ServerError(503, _)));
}

#[tokio::test]
async fn test_create_invalid_argument() {
    let server = MockServer::start().await;
    let name = template_name();
    let template = sd_hd_mp4_template(&name, &TopicName::new("my-project", "t"));

    Mock::given(method("POST"))
        .and(path(TEMPLATES_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(google_error(
            400,
            "INVALID_ARGUMENT",
            "Invalid container",
        )))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_job_template(&name.parent, &name.template_id, &template)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::InvalidArgument(_)));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_resent() {
    let server = MockServer::start().await;
    let tokens = Arc::new(SequentialTokens::default());

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(google_error(
            401,
            "UNAUTHENTICATED",
            "Request had invalid authentication credentials.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": template_name().to_string() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(
        &server,
        TokenCache::from_provider(tokens.clone()),
        fast_retry(),
    );
    let fetched = client.get_job_template(&template_name()).await.unwrap().unwrap();

    assert_eq!(fetched.name, template_name().to_string());
    assert_eq!(tokens.issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expired_fixed_token_is_not_resent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(google_error(
            401,
            "UNAUTHENTICATED",
            "Request had invalid authentication credentials.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .get_job_template(&template_name())
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::AuthError(_)));
    assert!(err.to_string().contains("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_unauthorized_without_expiry_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .get_job_template(&template_name())
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::AuthError(_)));
}

// =============================================================================
// get / list / delete
// =============================================================================

#[tokio::test]
async fn test_get_missing_template_returns_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(google_error(
            404,
            "NOT_FOUND",
            "Job template not found",
        )))
        .mount(&server)
        .await;

    let fetched = test_client(&server).get_job_template(&template_name()).await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_get_retries_transient_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": template_name().to_string() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetched = test_client(&server).get_job_template(&template_name()).await.unwrap();
    assert!(fetched.is_some());
}

#[tokio::test]
async fn test_rate_limit_keeps_service_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TEMPLATE_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_json(google_error(
                    429,
                    "RESOURCE_EXHAUSTED",
                    "Quota exceeded for quota metric 'Requests'",
                )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, TokenCache::fixed("test-token"), RetryConfig::disabled());
    let err = client.get_job_template(&template_name()).await.unwrap_err();

    assert!(matches!(err, TranscoderError::RateLimited(7000, _)));
    assert!(err
        .to_string()
        .contains("RESOURCE_EXHAUSTED: Quota exceeded for quota metric 'Requests'"));
}

#[tokio::test]
async fn test_template_id_is_percent_encoded_in_path() {
    let server = MockServer::start().await;
    let name = JobTemplateName::new("my-project", "us-central1", "team/a");

    Mock::given(method("GET"))
        .and(path(
            "/v1/projects/my-project/locations/us-central1/jobTemplates/team%2Fa",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "x" })))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = test_client(&server).get_job_template(&name).await.unwrap();
    assert!(fetched.is_some());
}

#[tokio::test]
async fn test_list_page_with_caption_template() {
    let server = MockServer::start().await;
    let parent = LocationName::new("my-project", "us-central1");

    Mock::given(method("GET"))
        .and(path(TEMPLATES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobTemplates": [
                {
                    "name": "projects/my-project/locations/us-central1/jobTemplates/captions",
                    "config": {
                        "elementaryStreams": [
                            { "key": "cc", "textStream": { "codec": "webvtt" } },
                            { "key": "a0", "audioStream": { "codec": "aac", "bitrateBps": 64000 } }
                        ],
                        "muxStreams": [
                            { "key": "subs", "container": "vtt", "elementaryStreams": ["cc"] }
                        ]
                    }
                },
                { "name": "projects/my-project/locations/us-central1/jobTemplates/plain" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .list_job_templates(&parent, None, None)
        .await
        .unwrap();

    assert_eq!(page.job_templates.len(), 2);
    let config = page.job_templates[0].config.as_ref().unwrap();
    let captions = config.elementary_stream("cc").unwrap().as_text().unwrap();
    assert_eq!(captions.codec, "webvtt");
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_passes_paging_parameters() {
    let server = MockServer::start().await;
    let parent = LocationName::new("my-project", "us-central1");

    Mock::given(method("GET"))
        .and(path(TEMPLATES_PATH))
        .and(query_param("pageSize", "2"))
        .and(query_param("pageToken", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobTemplates": [
                { "name": "projects/my-project/locations/us-central1/jobTemplates/a" },
                { "name": "projects/my-project/locations/us-central1/jobTemplates/b" }
            ],
            "nextPageToken": "def"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .list_job_templates(&parent, Some(2), Some("abc"))
        .await
        .unwrap();

    let ids: Vec<String> = page
        .job_templates
        .iter()
        .map(|t| t.name.parse::<JobTemplateName>().unwrap().template_id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(page.next_page_token.as_deref(), Some("def"));
}

#[tokio::test]
async fn test_delete_allow_missing_tolerates_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(TEMPLATE_PATH))
        .and(query_param("allowMissing", "true"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .delete_job_template(&template_name(), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_template_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(TEMPLATE_PATH))
        .and(query_param("allowMissing", "false"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .delete_job_template(&template_name(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::NotFound(_)));
}
