use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body the report server sends with a failed upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    pub fn parse(body: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// The server-provided message, if it is present and not blank.
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Error)]
#[error("malformed error payload: {0}")]
pub struct PayloadError(#[from] serde_json::Error);
