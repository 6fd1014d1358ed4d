//! Models service: generation, token counting and model metadata.

mod service;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::GenAiResult;
use crate::pager::Pager;
use crate::types::{
    CountTokensRequest, CountTokensResponse, GenerateContentRequest, GenerateContentResponse,
    ListParams, Model,
};

pub use service::ModelsServiceImpl;

/// Lazy sequence of streamed generation chunks.
pub type ContentStream = Pin<Box<dyn Stream<Item = GenAiResult<GenerateContentResponse>> + Send>>;

/// Service for content generation and model information.
#[async_trait]
pub trait ModelsService: Send + Sync {
    /// Generates content in one response.
    async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GenAiResult<GenerateContentResponse>;

    /// Generates content as a stream of partial responses.
    ///
    /// Dropping the stream before it ends releases the underlying connection.
    async fn generate_content_stream(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GenAiResult<ContentStream>;

    /// Counts the tokens of a request.
    async fn count_tokens(&self, model: &str, request: CountTokensRequest) -> GenAiResult<CountTokensResponse>;

    /// Gets a model by name.
    async fn get(&self, model: &str) -> GenAiResult<Model>;

    /// Lists base models.
    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<Model>>;
}
