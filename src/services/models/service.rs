//! Models service implementation.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use super::{ContentStream, ModelsService};
use crate::config::Backend;
use crate::dialect::ResourceKind;
use crate::error::{GenAiResult, RequestError};
use crate::pager::{PagedItem, Pager};
use crate::services::list_fetcher;
use crate::transport::{endpoints, ApiClient, RequestDescriptor};
use crate::types::{
    CountTokensRequest, CountTokensResponse, GenerateContentRequest, GenerateContentResponse,
    ListParams, Model,
};

/// Implementation of the ModelsService.
#[derive(Debug, Clone)]
pub struct ModelsServiceImpl {
    api_client: ApiClient,
}

impl ModelsServiceImpl {
    /// Create a new models service.
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    fn model_name(&self, model: &str) -> GenAiResult<String> {
        self.api_client
            .dialect()
            .resolve_resource_name(model, ResourceKind::Model)
    }

    /// Serializes a generation request, rejecting fields the backend does not accept.
    fn encode(&self, request: &GenerateContentRequest) -> GenAiResult<Value> {
        let uses_method = request
            .safety_settings
            .iter()
            .flatten()
            .any(|setting| setting.method.is_some());
        if uses_method && self.api_client.dialect().backend() == Backend::Direct {
            return Err(RequestError::InvalidParameter {
                parameter: "safetySettings.method".to_string(),
                message: "method parameter is not supported in Gemini API.".to_string(),
            }
            .into());
        }
        Ok(serde_json::to_value(request)?)
    }
}

#[async_trait]
impl ModelsService for ModelsServiceImpl {
    async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GenAiResult<GenerateContentResponse> {
        let path = endpoints::generate_content(&self.model_name(model)?);
        let descriptor = RequestDescriptor::post(path, self.encode(&request)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn generate_content_stream(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GenAiResult<ContentStream> {
        let path = endpoints::stream_generate_content(&self.model_name(model)?);
        let descriptor = RequestDescriptor::post(path, self.encode(&request)?);
        let frames = self.api_client.request_stream(descriptor).await?;

        Ok(Box::pin(frames.map(|frame| {
            frame.and_then(|value| serde_json::from_value(value).map_err(Into::into))
        })))
    }

    async fn count_tokens(&self, model: &str, request: CountTokensRequest) -> GenAiResult<CountTokensResponse> {
        let path = endpoints::count_tokens(&self.model_name(model)?);
        let descriptor = RequestDescriptor::post(path, serde_json::to_value(&request)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn get(&self, model: &str) -> GenAiResult<Model> {
        let descriptor = RequestDescriptor::get(self.model_name(model)?);
        self.api_client.request(descriptor).await?.json()
    }

    async fn list(&self, params: Option<ListParams>) -> GenAiResult<Pager<Model>> {
        let path = self.api_client.dialect().model_list_path().to_string();
        let fetcher = list_fetcher(self.api_client.clone(), path);
        Pager::create(PagedItem::Models, params.unwrap_or_default(), fetcher).await
    }
}
