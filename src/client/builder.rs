//! Builder for creating client instances.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{ApiKeyAuthManager, AuthManager};
use crate::config::{Backend, GenAiConfig, GenAiConfigBuilder, LogLevel};
use crate::dialect;
use crate::error::{ConfigurationError, GenAiError, NetworkError};
use crate::live::{TungsteniteSocketFactory, WebSocketFactory};
use crate::observability::{Logger, StructuredLogger};
use crate::transport::{ApiClient, HttpTransport, ReqwestTransport};
use crate::upload::{ChunkedUploader, Uploader};

use super::client::GenAiClient;

/// Builder for creating a [`GenAiClient`].
///
/// Configuration values go to [`GenAiConfigBuilder`]; the transport, credential,
/// upload, socket and logging seams may be replaced for testing.
///
/// # Example
///
/// ```no_run
/// use integrations_genai::GenAiClientBuilder;
/// use secrecy::SecretString;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GenAiClientBuilder::new()
///     .api_key(SecretString::new("your-api-key".into()))
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GenAiClientBuilder {
    config: GenAiConfigBuilder,
    prebuilt: Option<GenAiConfig>,

    // Injectable dependencies for testing
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthManager>>,
    uploader: Option<Arc<dyn Uploader>>,
    socket_factory: Option<Arc<dyn WebSocketFactory>>,
    logger: Option<Arc<dyn Logger>>,
}

impl GenAiClientBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: GenAiConfig) -> Self {
        Self {
            prebuilt: Some(config),
            ..Self::default()
        }
    }

    /// Selects the backend dialect.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config = self.config.backend(backend);
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: SecretString) -> Self {
        self.config = self.config.api_key(key);
        self
    }

    /// Sets the cloud project.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.config = self.config.project(project);
        self
    }

    /// Sets the cloud location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.config = self.config.location(location);
        self
    }

    /// Overrides the base URL.
    pub fn base_url(mut self, url: &str) -> Result<Self, GenAiError> {
        self.config = self.config.base_url(url)?;
        Ok(self)
    }

    /// Overrides the API version.
    pub fn api_version(mut self, version: &str) -> Self {
        self.config = self.config.api_version(version);
        self
    }

    /// Adds a header sent with every call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.header(name, value);
        self
    }

    /// Sets the default call timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.config = self.config.timeout(duration);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.config = self.config.connect_timeout(duration);
        self
    }

    /// Sets the log level of the default logger.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config = self.config.log_level(level);
        self
    }

    /// Sets a custom HTTP transport (for testing).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the credential source. Required for the project-scoped backend.
    pub fn auth(mut self, auth: Arc<dyn AuthManager>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets a custom upload strategy.
    pub fn uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Sets a custom WebSocket factory (for testing).
    pub fn socket_factory(mut self, factory: Arc<dyn WebSocketFactory>) -> Self {
        self.socket_factory = Some(factory);
        self
    }

    /// Sets a custom logger (for testing).
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configuration is incomplete or inconsistent
    /// - no credential source is available for the selected backend
    /// - the HTTP transport cannot be created
    pub fn build(self) -> Result<GenAiClient, GenAiError> {
        let config = match self.prebuilt {
            Some(config) => config,
            None => self.config.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(config.connect_timeout).map_err(|e| {
                NetworkError::ConnectionFailed {
                    message: format!("Failed to create HTTP transport: {}", e),
                }
            })?),
        };

        let auth: Arc<dyn AuthManager> = match (self.auth, config.backend) {
            (Some(auth), _) => auth,
            (None, Backend::Direct) => Arc::new(ApiKeyAuthManager::from_config(&config)?),
            (None, Backend::ProjectScoped) => match &config.api_key {
                Some(key) => Arc::new(ApiKeyAuthManager::new(key.clone())),
                None => {
                    return Err(ConfigurationError::MissingCredentials {
                        message: "project-scoped clients need an auth manager".to_string(),
                    }
                    .into())
                }
            },
        };

        let logger: Arc<dyn Logger> = self
            .logger
            .unwrap_or_else(|| Arc::new(StructuredLogger::new("genai").with_level(config.log_level)));
        let uploader = self.uploader.unwrap_or_else(|| Arc::new(ChunkedUploader::new()));
        let socket_factory = self
            .socket_factory
            .unwrap_or_else(|| Arc::new(TungsteniteSocketFactory::new()));

        logger.info(
            "GenAI client initialized",
            serde_json::json!({
                "backend": config.backend.to_string(),
                "base_url": config.base_url(),
                "api_version": config.api_version(),
            }),
        );

        let config = Arc::new(config);
        let api_client = ApiClient::new(
            Arc::clone(&config),
            dialect::for_config(&config),
            transport,
            auth,
            uploader,
            logger,
        );

        Ok(GenAiClient::from_parts(api_client, socket_factory))
    }
}
