//! Cached content service implementation.

use async_trait::async_trait;

use super::CachesService;
use crate::dialect::ResourceKind;
use crate::error::GenAiResult;
use crate::pager::{PagedItem, Pager};
use crate::services::list_fetcher;
use crate::transport::{endpoints, ApiClient, RequestDescriptor};
use crate::types::{CachedContent, CreateCachedContentRequest, ListParams, UpdateCachedContentRequest};

/// Implementation of the CachesService.
#[derive(Debug, Clone)]
pub struct CachesServiceImpl {
    api_client: ApiClient,
}

impl CachesServiceImpl {
    /// Create a new caches service.
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    fn cache_name(&self, name: &str) -> GenAiResult<String> {
        self.api_client
            .dialect()
            .resolve_resource_name(name, ResourceKind::CachedContent)
    }
}

#[async_trait]
impl CachesService for CachesServiceImpl {
    async fn create(&self, mut request: CreateCachedContentRequest) -> GenAiResult<CachedContent> {
        request.model = self.api_client.dialect().qualified_model_name(&request.model)?;
        let descriptor = RequestDescriptor::post(endpoints::CACHED_CONTENTS, serde_json::to_value(&request)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn get(&self, name: &str) -> GenAiResult<CachedContent> {
        let descriptor = RequestDescriptor::get(self.cache_name(name)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn update(&self, name: &str, request: UpdateCachedContentRequest) -> GenAiResult<CachedContent> {
        let descriptor = RequestDescriptor::patch(self.cache_name(name)?, serde_json::to_value(&request)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn delete(&self, name: &str) -> GenAiResult<()> {
        let descriptor = RequestDescriptor::delete(self.cache_name(name)?);
        self.api_client.request(descriptor).await?;
        Ok(())
    }

    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<CachedContent>> {
        let fetcher = list_fetcher(self.api_client.clone(), endpoints::CACHED_CONTENTS.to_string());
        Pager::create(PagedItem::CachedContents, params.unwrap_or_default(), fetcher).await
    }
}
