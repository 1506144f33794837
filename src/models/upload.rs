//! Upload categories, progress reports and stored-object descriptors.

use serde::{Deserialize, Serialize};

/// Top-level storage category for a binary object.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadCategory {
    Audio,
    Document,
}

impl UploadCategory {
    /// Directory under which all objects of this category are stored.
    pub fn root_dir(self) -> &'static str {
        match self {
            UploadCategory::Audio => "audios",
            UploadCategory::Document => "documents",
        }
    }

    /// Prefix holding every object of this category owned by `user_id`.
    pub fn user_prefix(self, user_id: &str) -> String {
        format!("{}/{}/", self.root_dir(), user_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Completed,
    Error,
}

/// One progress notification emitted during an upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Percent complete, 0.0 to 100.0.
    pub progress: f64,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadProgress {
    pub fn uploading(progress: f64) -> Self {
        Self {
            progress,
            status: UploadStatus::Uploading,
            locator: None,
            error: None,
        }
    }

    pub fn completed(locator: String) -> Self {
        Self {
            progress: 100.0,
            status: UploadStatus::Completed,
            locator: Some(locator),
            error: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            progress: 0.0,
            status: UploadStatus::Error,
            locator: None,
            error: Some(message),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != UploadStatus::Uploading
    }
}

/// Result of a completed upload.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Storage path, `{category}s/{userId}/{timestamp}-{name}`.
    pub path: String,
    /// Retrieval locator handed back to clients.
    pub locator: String,
    pub size_bytes: u64,
    /// Hex MD5 digest of the payload.
    pub etag: String,
}
