use thiserror::Error;

pub const VALIDATION_MESSAGE: &str = "Please select a file";
pub const NETWORK_RETRY_MESSAGE: &str = "Server error. Please try again.";
pub const SERVER_FALLBACK_MESSAGE: &str = "Server error occurred";

/// Terminal failure of one upload session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no file selected")]
    Validation,
    #[error("upload request did not complete: {0}")]
    Network(String),
    #[error("server rejected upload with status {status}: {message}")]
    Server { status: u16, message: String },
}

impl UploadError {
    /// Text shown in the inline error region and the error notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation => VALIDATION_MESSAGE.to_string(),
            Self::Network(_) => NETWORK_RETRY_MESSAGE.to_string(),
            Self::Server { message, .. } => message.clone(),
        }
    }
}

/// The request never produced a complete response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<reqwest::Error>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        let message = if value.is_connect() {
            format!("failed to connect to report server: {value}")
        } else if value.is_body() || value.is_decode() {
            format!("failed to read report server response: {value}")
        } else {
            format!("upload request failed: {value}")
        };
        Self {
            message,
            source: Some(value),
        }
    }
}
