//! Files service implementation.

use async_trait::async_trait;

use super::FilesService;
use crate::error::{GenAiResult, RequestError};
use crate::pager::{PagedItem, Pager};
use crate::services::list_fetcher;
use crate::transport::{endpoints, ApiClient, RequestDescriptor};
use crate::types::{File, ListParams};
use crate::upload::{UploadFileConfig, UploadSource};

/// Implementation of the Files service.
#[derive(Debug, Clone)]
pub struct FilesServiceImpl {
    api_client: ApiClient,
}

impl FilesServiceImpl {
    /// Create a new files service.
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    fn ensure_supported(&self, operation: &str) -> GenAiResult<()> {
        let dialect = self.api_client.dialect();
        if dialect.supports_files() {
            Ok(())
        } else {
            Err(RequestError::UnsupportedOperation {
                operation: operation.to_string(),
                backend: dialect.backend().to_string(),
            }
            .into())
        }
    }
}

#[async_trait]
impl FilesService for FilesServiceImpl {
    async fn upload(&self, source: UploadSource, config: UploadFileConfig) -> GenAiResult<File> {
        let file = self.api_client.upload_file(&source, &config).await?;
        Ok(serde_json::from_value(file)?)
    }

    async fn get(&self, name: &str) -> GenAiResult<File> {
        self.ensure_supported("files.get")?;
        let descriptor = RequestDescriptor::get(endpoints::file(name));
        self.api_client.request(descriptor).await?.json()
    }

    async fn delete(&self, name: &str) -> GenAiResult<()> {
        self.ensure_supported("files.delete")?;
        let descriptor = RequestDescriptor::delete(endpoints::file(name));
        self.api_client.request(descriptor).await?;
        Ok(())
    }

    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<File>> {
        self.ensure_supported("files.list")?;
        let fetcher = list_fetcher(self.api_client.clone(), endpoints::FILES.to_string());
        Pager::create(PagedItem::Files, params.unwrap_or_default(), fetcher).await
    }
}
