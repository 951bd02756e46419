//! Transcoder REST API envelope types.

use serde::{Deserialize, Serialize};
use transcoder_models::JobTemplate;

/// Response of `jobTemplates.list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobTemplatesResponse {
    #[serde(default)]
    pub job_templates: Vec<JobTemplate>,

    /// Token for the next page, absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    /// Locations that could not be reached
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreachable: Vec<String>,
}

/// Google API error body: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub error: GoogleError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status, e.g. "ALREADY_EXISTS"
    #[serde(default)]
    pub status: String,
}

impl GoogleErrorBody {
    /// Human-readable message from an error response body.
    ///
    /// Falls back to the raw body when it is not a Google error envelope.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<GoogleErrorBody>(body) {
            Ok(parsed) if !parsed.error.status.is_empty() => {
                format!("{}: {}", parsed.error.status, parsed.error.message)
            }
            Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
            _ => body.trim().to_string(),
        }
    }
}
