use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client};
use shared::{
    domain::SelectedFile,
    protocol::{UPLOAD_FIELD, UPLOAD_PATH},
};
use url::Url;

pub mod artifact;
pub mod controller;
pub mod error;
pub mod events;
pub mod notification;
pub mod progress;
pub mod response;

pub use artifact::ResultArtifact;
pub use controller::{ResultView, SubmitOutcome, UploadController, UploadPhase, ViewState};
pub use error::{TransportError, UploadError};
pub use events::ControllerEvent;
pub use notification::{Notification, NotificationKind, NotificationPhase};
pub use progress::{ProgressView, TimerCounts};
pub use response::UploadResponse;

/// Delivers one file to the report server.
///
/// `Err` means no complete response arrived; any status code, including
/// failures, comes back as `Ok`.
#[async_trait]
pub trait UploadTransport: Send + Sync + 'static {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, TransportError>;
}

/// Multipart POST to `<server>/upload`. No request timeout: report
/// generation can take minutes for long domain lists.
#[derive(Clone)]
pub struct HttpUploadTransport {
    http: Client,
    endpoint: Url,
}

impl HttpUploadTransport {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            endpoint: upload_endpoint(server_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, TransportError> {
        let part = multipart::Part::bytes(file.content.clone()).file_name(file.name.clone());
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(UploadResponse {
            status,
            headers,
            body,
        })
    }
}

/// Resolves the upload endpoint, keeping any path prefix the server is
/// mounted under.
pub fn upload_endpoint(server_url: &str) -> Result<Url> {
    let base = Url::parse(server_url.trim())
        .with_context(|| format!("invalid server url '{server_url}'"))?;
    if !matches!(base.scheme(), "http" | "https") {
        bail!("unsupported server url scheme '{}'", base.scheme());
    }

    let mut endpoint = base.clone();
    let prefix = base.path().trim_end_matches('/');
    endpoint.set_path(&format!("{prefix}{UPLOAD_PATH}"));
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;
