//! Main client implementation.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::chats::Chats;
use crate::config::GenAiConfig;
use crate::error::GenAiError;
use crate::live::{Live, WebSocketFactory};
use crate::services::{
    CachesService, CachesServiceImpl, FilesService, FilesServiceImpl, ModelsService, ModelsServiceImpl,
};
use crate::transport::ApiClient;

use super::builder::GenAiClientBuilder;

/// Generative AI client.
///
/// Services share one request engine and are created on first access.
///
/// # Example
///
/// ```no_run
/// use integrations_genai::GenAiClient;
/// use integrations_genai::types::GenerateContentRequest;
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GenAiClient::builder()
///     .api_key(SecretString::new("your-api-key".into()))
///     .build()?;
///
/// let response = client
///     .models()
///     .generate_content("gemini-2.0-flash", GenerateContentRequest::new(vec!["Hello".into()]))
///     .await?;
/// println!("{:?}", response.text());
/// # Ok(())
/// # }
/// ```
pub struct GenAiClient {
    api_client: ApiClient,
    socket_factory: Arc<dyn WebSocketFactory>,

    // Lazy-initialized services
    models_service: OnceCell<Arc<dyn ModelsService>>,
    files_service: OnceCell<Box<dyn FilesService>>,
    caches_service: OnceCell<Box<dyn CachesService>>,
}

impl GenAiClient {
    /// Creates a new client builder.
    pub fn builder() -> GenAiClientBuilder {
        GenAiClientBuilder::new()
    }

    /// Creates a client from environment variables. See [`GenAiConfig::from_env`].
    ///
    /// The project-scoped backend needs an explicit auth manager, so this only
    /// succeeds for it when an API key is also set.
    pub fn from_env() -> Result<Self, GenAiError> {
        Self::new(GenAiConfig::from_env()?)
    }

    /// Creates a client from a configuration object.
    pub fn new(config: GenAiConfig) -> Result<Self, GenAiError> {
        GenAiClientBuilder::from_config(config).build()
    }

    pub(super) fn from_parts(api_client: ApiClient, socket_factory: Arc<dyn WebSocketFactory>) -> Self {
        Self {
            api_client,
            socket_factory,
            models_service: OnceCell::new(),
            files_service: OnceCell::new(),
            caches_service: OnceCell::new(),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GenAiConfig {
        self.api_client.config()
    }

    /// The shared request engine.
    pub fn api_client(&self) -> &ApiClient {
        &self.api_client
    }

    /// Content generation, token counting and model metadata.
    pub fn models(&self) -> &dyn ModelsService {
        self.models_arc().as_ref()
    }

    /// Uploaded files.
    pub fn files(&self) -> &dyn FilesService {
        self.files_service
            .get_or_init(|| Box::new(FilesServiceImpl::new(self.api_client.clone())))
            .as_ref()
    }

    /// Cached contents.
    pub fn caches(&self) -> &dyn CachesService {
        self.caches_service
            .get_or_init(|| Box::new(CachesServiceImpl::new(self.api_client.clone())))
            .as_ref()
    }

    /// Chat session factory.
    pub fn chats(&self) -> Chats {
        Chats::new(Arc::clone(self.models_arc()))
    }

    /// Live session entry point.
    pub fn live(&self) -> Live {
        Live::new(self.api_client.clone(), Arc::clone(&self.socket_factory))
    }

    fn models_arc(&self) -> &Arc<dyn ModelsService> {
        self.models_service
            .get_or_init(|| Arc::new(ModelsServiceImpl::new(self.api_client.clone())))
    }
}

impl std::fmt::Debug for GenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiClient")
            .field("backend", &self.config().backend)
            .field("base_url", &self.config().base_url())
            .finish_non_exhaustive()
    }
}
