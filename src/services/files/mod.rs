//! Files service. Only the direct backend offers it.

mod service;

use async_trait::async_trait;

use crate::error::GenAiResult;
use crate::pager::Pager;
use crate::types::{File, ListParams};
use crate::upload::{UploadFileConfig, UploadSource};

pub use service::FilesServiceImpl;

/// Service for file upload and management.
#[async_trait]
pub trait FilesService: Send + Sync {
    /// Uploads a file with the resumable protocol.
    async fn upload(&self, source: UploadSource, config: UploadFileConfig) -> GenAiResult<File>;

    /// Gets file metadata. `name` may omit the `files/` prefix.
    async fn get(&self, name: &str) -> GenAiResult<File>;

    /// Deletes a file.
    async fn delete(&self, name: &str) -> GenAiResult<()>;

    /// Lists uploaded files.
    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<File>>;
}
