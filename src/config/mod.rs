//! Configuration types for the generative AI client.

use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use url::Url;
use crate::error::{GenAiError, ConfigurationError};

/// Default base URL for the direct (API key) backend.
pub const DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// Base URL for the project-scoped backend when no project/location is configured.
pub const PROJECT_SCOPED_GLOBAL_BASE_URL: &str = "https://aiplatform.googleapis.com/";

/// Default API version for the direct backend.
pub const DIRECT_API_VERSION: &str = "v1beta";

/// Default API version for the project-scoped backend.
pub const PROJECT_SCOPED_API_VERSION: &str = "v1beta1";

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Library label sent in `User-Agent` and `x-goog-api-client`.
pub const LIBRARY_LABEL: &str = concat!("integrations-genai/", env!("CARGO_PKG_VERSION"));

/// Which backend dialect the client speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backend {
    /// API-key service addressed by bare resource names.
    #[default]
    Direct,
    /// Cloud service addressed under `projects/{project}/locations/{location}`.
    ProjectScoped,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Direct => f.write_str("direct"),
            Backend::ProjectScoped => f.write_str("project-scoped"),
        }
    }
}

/// Log level for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Error level - only errors.
    Error,
    /// Warning level - errors and warnings.
    Warn,
    /// Info level - general information.
    #[default]
    Info,
    /// Debug level - detailed information.
    Debug,
    /// Trace level - very detailed information.
    Trace,
}

impl LogLevel {
    /// Verbosity rank; higher admits more events.
    pub fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
            LogLevel::Trace => 4,
        }
    }

    /// Whether an event at `level` passes this minimum.
    pub fn admits(self, level: LogLevel) -> bool {
        level.rank() <= self.rank()
    }
}

/// HTTP options applied to a call.
///
/// The client holds a fully resolved set; individual calls may carry a partial set
/// that is layered on top with [`HttpOptions::patch`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpOptions {
    /// Base URL. Trailing slashes are ignored when joining.
    pub base_url: Option<String>,
    /// API version segment. An empty string omits the segment.
    pub api_version: Option<String>,
    /// Extra headers.
    pub headers: HashMap<String, String>,
    /// Request timeout. Zero disables it.
    pub timeout: Option<Duration>,
}

impl HttpOptions {
    /// Empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Layers `overrides` over `self`.
    ///
    /// Headers merge name by name; every other field is replaced when set.
    pub fn patch(&self, overrides: &HttpOptions) -> HttpOptions {
        let mut headers = self.headers.clone();
        headers.extend(overrides.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        HttpOptions {
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            api_version: overrides.api_version.clone().or_else(|| self.api_version.clone()),
            headers,
            timeout: overrides.timeout.or(self.timeout),
        }
    }

    /// Timeout, if one is set and positive.
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

/// Configuration for the client.
#[derive(Clone)]
pub struct GenAiConfig {
    /// Backend dialect.
    pub backend: Backend,
    /// API key. Cleared for project-scoped clients that have a project and location.
    pub api_key: Option<SecretString>,
    /// Cloud project (project-scoped only).
    pub project: Option<String>,
    /// Cloud location (project-scoped only).
    pub location: Option<String>,
    /// Resolved HTTP options; `base_url` and `api_version` are always set.
    pub http_options: HttpOptions,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Log level.
    pub log_level: LogLevel,
    /// Suffix appended to the library label in client headers.
    pub user_agent_extra: Option<String>,
}

impl fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("project", &self.project)
            .field("location", &self.location)
            .field("http_options", &self.http_options)
            .field("connect_timeout", &self.connect_timeout)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl GenAiConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GenAiConfigBuilder {
        GenAiConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// `GOOGLE_GENAI_USE_VERTEXAI` selects the project-scoped backend when set to
    /// `true` or `1`.
    pub fn from_env() -> Result<Self, GenAiError> {
        let project_scoped = std::env::var("GOOGLE_GENAI_USE_VERTEXAI")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let mut builder = Self::builder().backend(if project_scoped {
            Backend::ProjectScoped
        } else {
            Backend::Direct
        });

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY")) {
            builder = builder.api_key(SecretString::new(api_key));
        }
        if let Ok(project) = std::env::var("GOOGLE_CLOUD_PROJECT") {
            builder = builder.project(project);
        }
        if let Ok(location) = std::env::var("GOOGLE_CLOUD_LOCATION") {
            builder = builder.location(location);
        }
        if let Ok(base_url) = std::env::var("GENAI_BASE_URL") {
            builder = builder.base_url(&base_url)?;
        }
        if let Ok(api_version) = std::env::var("GENAI_API_VERSION") {
            builder = builder.api_version(&api_version);
        }
        if let Some(secs) = std::env::var("GENAI_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Resolved base URL.
    pub fn base_url(&self) -> &str {
        self.http_options.base_url.as_deref().unwrap_or(DIRECT_BASE_URL)
    }

    /// Resolved API version.
    pub fn api_version(&self) -> &str {
        self.http_options.api_version.as_deref().unwrap_or(DIRECT_API_VERSION)
    }

    /// `projects/{project}/locations/{location}`, when both are known.
    pub fn resource_path(&self) -> Option<String> {
        match (&self.project, &self.location) {
            (Some(project), Some(location)) => Some(format!("projects/{project}/locations/{location}")),
            _ => None,
        }
    }

    /// Value of the `User-Agent` and `x-goog-api-client` headers.
    pub fn client_label(&self) -> String {
        match &self.user_agent_extra {
            Some(extra) => format!("{LIBRARY_LABEL} {extra}"),
            None => LIBRARY_LABEL.to_string(),
        }
    }
}

/// Builder for GenAiConfig.
#[derive(Default)]
pub struct GenAiConfigBuilder {
    backend: Option<Backend>,
    api_key: Option<SecretString>,
    project: Option<String>,
    location: Option<String>,
    base_url: Option<String>,
    api_version: Option<String>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    log_level: Option<LogLevel>,
    user_agent_extra: Option<String>,
}

impl GenAiConfigBuilder {
    /// Set the backend dialect.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the cloud project.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the cloud location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: &str) -> Result<Self, GenAiError> {
        Url::parse(base_url)?;
        self.base_url = Some(base_url.to_string());
        Ok(self)
    }

    /// Set the API version.
    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    /// Add a header sent with every call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the suffix appended to the client label.
    pub fn user_agent_extra(mut self, extra: impl Into<String>) -> Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Build the configuration, deriving the base URL and API version from the backend.
    pub fn build(self) -> Result<GenAiConfig, GenAiError> {
        let backend = self.backend.unwrap_or_default();
        let mut api_key = self.api_key;
        let mut project = self.project;
        let mut location = self.location;

        let (default_base_url, default_api_version) = match backend {
            Backend::Direct => {
                if api_key.is_none() {
                    return Err(ConfigurationError::MissingApiKey.into());
                }
                (DIRECT_BASE_URL.to_string(), DIRECT_API_VERSION)
            }
            Backend::ProjectScoped => match (&project, &location) {
                (Some(_), Some(loc)) => {
                    api_key = None;
                    (format!("https://{loc}-aiplatform.googleapis.com/"), PROJECT_SCOPED_API_VERSION)
                }
                (None, None) => (PROJECT_SCOPED_GLOBAL_BASE_URL.to_string(), PROJECT_SCOPED_API_VERSION),
                _ => {
                    return Err(ConfigurationError::InvalidConfiguration {
                        message: "project and location must be provided together".to_string(),
                    }
                    .into());
                }
            },
        };

        if backend == Backend::Direct {
            project = None;
            location = None;
        }

        let base_url = self.base_url.unwrap_or(default_base_url);
        Url::parse(&base_url)?;

        Ok(GenAiConfig {
            backend,
            api_key,
            project,
            location,
            http_options: HttpOptions {
                base_url: Some(base_url),
                api_version: Some(self.api_version.unwrap_or_else(|| default_api_version.to_string())),
                headers: self.headers,
                timeout: self.timeout,
            },
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            log_level: self.log_level.unwrap_or_default(),
            user_agent_extra: self.user_agent_extra,
        })
    }
}
