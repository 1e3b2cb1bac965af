use std::collections::HashMap;

use shared::{domain::ReportSummary, error::ErrorPayload, protocol::is_json_content_type};

use crate::error::{UploadError, SERVER_FALLBACK_MESSAGE};

/// A response that arrived in full. Header names are lower-case.
#[derive(Debug, Clone, Default)]
pub struct UploadResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl UploadResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct CompletedUpload {
    pub summary: ReportSummary,
    pub payload: Vec<u8>,
    pub content_type: Option<String>,
}

pub fn classify_response(response: UploadResponse) -> Result<CompletedUpload, UploadError> {
    if !response.is_success() {
        return Err(UploadError::Server {
            status: response.status,
            message: server_error_message(&response),
        });
    }

    let summary = ReportSummary::from_headers(|name| response.header(name));
    let content_type = response.content_type().map(str::to_string);
    Ok(CompletedUpload {
        summary,
        payload: response.body,
        content_type,
    })
}

/// Only a JSON body is trusted to carry a message; anything else gets the
/// generic text.
fn server_error_message(response: &UploadResponse) -> String {
    let is_json = response.content_type().is_some_and(is_json_content_type);
    if !is_json {
        return SERVER_FALLBACK_MESSAGE.to_string();
    }

    match ErrorPayload::parse(&response.body) {
        Ok(payload) => payload
            .message()
            .unwrap_or(SERVER_FALLBACK_MESSAGE)
            .to_string(),
        Err(err) => {
            tracing::debug!("ignoring unreadable error payload: {err}");
            SERVER_FALLBACK_MESSAGE.to_string()
        }
    }
}
