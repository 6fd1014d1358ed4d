//! Uploaded file resources.

use serde::{Deserialize, Serialize};

/// A file stored by the files service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// The resource name, `files/{id}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The display name of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// The size of the file in bytes, as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<String>,
    /// The creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// The last update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    /// The expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    /// The SHA-256 hash of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,
    /// The URI of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Download URI, for generated files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_uri: Option<String>,
    /// `UPLOADED` or `GENERATED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The processing state of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,
    /// Why processing failed, when `state` is `FAILED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileStatus>,
}

impl File {
    /// Size in bytes, when reported.
    pub fn size(&self) -> Option<u64> {
        self.size_bytes.as_deref()?.parse().ok()
    }

    /// True once the file can be referenced from a request.
    pub fn is_active(&self) -> bool {
        self.state == Some(FileState::Active)
    }
}

/// Processing error reported for a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FileStatus {
    /// Status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Developer-facing message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The processing state of a file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// File is being processed.
    Processing,
    /// File is active and ready to use.
    Active,
    /// File processing failed.
    Failed,
    /// Any other state.
    #[serde(other)]
    StateUnspecified,
}
