//! Cached content service.

mod service;

use async_trait::async_trait;

use crate::error::GenAiResult;
use crate::pager::Pager;
use crate::types::{CachedContent, CreateCachedContentRequest, ListParams, UpdateCachedContentRequest};

pub use service::CachesServiceImpl;

/// Service for context caches.
#[async_trait]
pub trait CachesService: Send + Sync {
    /// Creates a cache. The model name is qualified for the active backend.
    async fn create(&self, request: CreateCachedContentRequest) -> GenAiResult<CachedContent>;

    /// Gets a cache by name.
    async fn get(&self, name: &str) -> GenAiResult<CachedContent>;

    /// Updates the expiration of a cache.
    async fn update(&self, name: &str, request: UpdateCachedContentRequest) -> GenAiResult<CachedContent>;

    /// Deletes a cache.
    async fn delete(&self, name: &str) -> GenAiResult<()>;

    /// Lists caches.
    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<CachedContent>>;
}
