//! # Generative AI Transport Core
//!
//! Rust client core for generative AI services reachable through two backend
//! dialects: a direct API-key endpoint and a project-scoped cloud endpoint.
//!
//! ## Features
//!
//! - One request engine for both dialects, with per-call HTTP option overrides
//! - Server-sent event streaming with lazy, cancellable frame decoding
//! - Resumable chunked file uploads
//! - Live bidirectional sessions over WebSocket
//! - Cursor-based pagination
//! - Multi-turn chat with curated history
//! - Secure credential handling with `SecretString`
//! - Mock transports, credentials and sockets for testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_genai::{GenAiClient, GenAiConfig};
//! use integrations_genai::types::GenerateContentConfig;
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenAiConfig::builder()
//!         .api_key(SecretString::new("your-api-key".into()))
//!         .build()?;
//!     let client = GenAiClient::new(config)?;
//!
//!     let chat = client
//!         .chats()
//!         .create("gemini-2.0-flash", GenerateContentConfig::default(), Vec::new())?;
//!     let reply = chat.send_message("Hello").await?;
//!     println!("{:?}", reply.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - Client entry point and builder
//! - `config` - Configuration types and builder
//! - `auth` - Credential injection
//! - `dialect` - Backend-specific naming and payload normalization
//! - `path` - Path addressing inside JSON documents
//! - `transport` - HTTP transport and the request engine
//! - `streaming` - Server-sent event decoding
//! - `upload` - Resumable chunked uploads
//! - `live` - WebSocket sessions
//! - `pager` - Paged listings
//! - `chats` - Multi-turn chat
//! - `services` - Models, files and cached contents
//! - `error` - Error types and taxonomy
//! - `types` - Request and response models

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod auth;
pub mod chats;
pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod live;
pub mod observability;
pub mod pager;
pub mod path;
pub mod services;
pub mod streaming;
pub mod transport;
pub mod types;
pub mod upload;

// Development/testing modules - always available for integration tests
pub mod mocks;

// Re-exports for convenience
pub use auth::{ApiKeyAuthManager, AuthManager, BearerTokenAuthManager};
pub use chats::{Chat, Chats};
pub use client::{GenAiClient, GenAiClientBuilder};
pub use config::{
    Backend, GenAiConfig, GenAiConfigBuilder, HttpOptions, LogLevel, DEFAULT_CONNECT_TIMEOUT_SECS,
    DIRECT_API_VERSION, DIRECT_BASE_URL, PROJECT_SCOPED_API_VERSION,
};
pub use dialect::{Dialect, DirectDialect, ProjectScopedDialect, ResourceKind};
pub use error::{
    // Main error types
    GenAiError,
    GenAiResult,
    // Error categories
    ConfigurationError,
    NetworkError,
    PathError,
    ProtocolError,
    RequestError,
    ResponseError,
};
pub use live::{Live, Session, SessionState};
pub use pager::{PagedItem, Pager};
pub use path::{get_value_by_path, parse_path, set_value_by_path, PathSegment};
pub use streaming::SseFrameStream;
pub use transport::{
    ApiClient, ChunkedStream, HttpEnvelope, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    RequestDescriptor, TransportError,
};
pub use upload::{ChunkedUploader, UploadFileConfig, UploadSource, Uploader};

// Service re-exports
pub use services::{CachesService, ContentStream, FilesService, ModelsService};

// Observability re-exports
pub use observability::{DefaultLogger, Logger, StructuredLogger};
