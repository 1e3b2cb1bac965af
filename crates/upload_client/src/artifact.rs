use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::protocol::REPORT_FILENAME;
use uuid::Uuid;

const BLOB_ORIGIN: &str = "uploader";

/// A report held in memory until the user saves it or it is revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultArtifact {
    pub url: String,
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ArtifactStore {
    blobs: HashMap<String, Arc<Vec<u8>>>,
}

impl ArtifactStore {
    pub fn register(&mut self, payload: Vec<u8>, content_type: Option<String>) -> ResultArtifact {
        let url = format!("blob:{BLOB_ORIGIN}/{}", Uuid::new_v4());
        let artifact = ResultArtifact {
            url: url.clone(),
            filename: REPORT_FILENAME.to_string(),
            size_bytes: payload.len() as u64,
            content_type,
            created_at: Utc::now(),
        };
        self.blobs.insert(url, Arc::new(payload));
        artifact
    }

    pub fn bytes(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.blobs.get(url).cloned()
    }

    pub fn revoke(&mut self, url: &str) -> bool {
        self.blobs.remove(url).is_some()
    }

    pub fn revoke_all(&mut self) -> usize {
        let revoked = self.blobs.len();
        self.blobs.clear();
        revoked
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}
