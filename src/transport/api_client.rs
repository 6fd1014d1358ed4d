//! Shared request engine used by every service.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use url::Url;

use crate::auth::AuthManager;
use crate::config::{GenAiConfig, HttpOptions};
use crate::dialect::Dialect;
use crate::error::{GenAiResult, NetworkError, ProtocolError, RequestError};
use crate::observability::Logger;
use crate::streaming::SseFrameStream;
use crate::upload::{UploadFileConfig, UploadSource, Uploader, UPLOAD_URL_HEADER};

use super::endpoints;
use super::http::{HttpRequest, HttpTransport};
use super::request::{RequestBuilder, RequestDescriptor};
use super::response::{HttpEnvelope, ResponseParser};

/// Request engine bound to one configuration and dialect.
///
/// Cloning is cheap; all state is shared and read-only.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<GenAiConfig>,
    dialect: Arc<dyn Dialect>,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthManager>,
    uploader: Arc<dyn Uploader>,
    logger: Arc<dyn Logger>,
    builder: RequestBuilder,
}

impl ApiClient {
    /// Creates an engine from its collaborators.
    pub fn new(
        config: Arc<GenAiConfig>,
        dialect: Arc<dyn Dialect>,
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthManager>,
        uploader: Arc<dyn Uploader>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let builder = RequestBuilder::new(Arc::clone(&config), Arc::clone(&dialect));
        Self {
            config,
            dialect,
            transport,
            auth,
            uploader,
            logger,
            builder,
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    /// Active dialect.
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Request builder.
    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Issues a unary call.
    ///
    /// A positive timeout in the resolved options bounds the whole exchange. Non-2xx
    /// statuses are classified into client, server or unexpected-status errors.
    pub async fn request(&self, descriptor: RequestDescriptor) -> GenAiResult<HttpEnvelope> {
        let request = self.prepare(descriptor).await?;
        let timeout = request.timeout;
        let send = self.transport.send(request);

        let response = match timeout {
            Some(duration) => tokio::time::timeout(duration, send)
                .await
                .map_err(|_| NetworkError::Timeout { duration })??,
            None => send.await?,
        };

        let envelope = ResponseParser::into_envelope(response);
        if let Err(e) = &envelope {
            self.logger.warn(
                "Request failed",
                json!({ "status": e.status(), "error": e.to_string() }),
            );
        }
        envelope
    }

    /// Issues a streaming call and returns its lazy frame sequence.
    ///
    /// `alt=sse` is added unless the path or query already selects a format. The
    /// timeout, if any, bounds establishing the stream, not reading it.
    pub async fn request_stream(&self, mut descriptor: RequestDescriptor) -> GenAiResult<SseFrameStream> {
        if !descriptor.has_query("alt") {
            descriptor = descriptor.with_query("alt", "sse");
        }

        let request = self.prepare(descriptor).await?;
        let timeout = request.timeout;
        let send = self.transport.send_streaming(request);

        let response = match timeout {
            Some(duration) => tokio::time::timeout(duration, send)
                .await
                .map_err(|_| NetworkError::Timeout { duration })??,
            None => send.await?,
        };

        if !ResponseParser::is_success(response.status) {
            let body = collect_body(response.body).await;
            let error = ResponseParser::parse_error_response(response.status, &response.headers, &body);
            self.logger.warn(
                "Stream request failed",
                json!({ "status": response.status, "error": error.to_string() }),
            );
            return Err(error);
        }

        Ok(SseFrameStream::new(response.body))
    }

    /// Uploads a file with the resumable protocol and returns the file resource.
    ///
    /// Only the direct backend offers file uploads; elsewhere this fails before any
    /// network call.
    pub async fn upload_file(&self, source: &UploadSource, config: &UploadFileConfig) -> GenAiResult<Value> {
        if !self.dialect.supports_files() {
            return Err(RequestError::UnsupportedOperation {
                operation: "upload_file".to_string(),
                backend: self.dialect.backend().to_string(),
            }
            .into());
        }

        let stat = self.uploader.stat(source).await?;
        let mime_type = config
            .mime_type
            .clone()
            .or(stat.mime_type)
            .ok_or(RequestError::MissingMimeType)?;

        let mut file = Map::new();
        if let Some(name) = &config.name {
            let name = if name.starts_with("files/") {
                name.clone()
            } else {
                format!("files/{name}")
            };
            file.insert("name".to_string(), Value::String(name));
        }
        if let Some(display_name) = &config.display_name {
            file.insert("displayName".to_string(), Value::String(display_name.clone()));
        }
        file.insert("mimeType".to_string(), Value::String(mime_type.clone()));
        file.insert("sizeBytes".to_string(), Value::String(stat.size.to_string()));

        let upload_url = self
            .fetch_upload_url(Value::Object(file), stat.size, &mime_type, config.http_options.as_ref())
            .await?;

        self.logger.debug(
            "Upload negotiated",
            json!({ "source": source.describe(), "size": stat.size, "mime_type": mime_type }),
        );

        self.uploader.upload(source, &upload_url, self).await
    }

    /// Negotiates a resumable upload and returns the upload URL.
    pub async fn fetch_upload_url(
        &self,
        file: Value,
        size: u64,
        mime_type: &str,
        http_options: Option<&HttpOptions>,
    ) -> GenAiResult<String> {
        let mut options = HttpOptions::new()
            .with_api_version("")
            .with_header("X-Goog-Upload-Protocol", "resumable")
            .with_header("X-Goog-Upload-Command", "start")
            .with_header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .with_header("X-Goog-Upload-Header-Content-Type", mime_type);
        if let Some(overrides) = http_options {
            options = options.patch(overrides);
        }

        let descriptor = RequestDescriptor::post(endpoints::UPLOAD_FILES, json!({ "file": file }))
            .with_http_options(Some(options));
        let envelope = self.request(descriptor).await?;

        envelope
            .header(UPLOAD_URL_HEADER)
            .map(str::to_string)
            .ok_or_else(|| ProtocolError::MissingUploadUrl.into())
    }

    /// Credential headers for callers outside the HTTP path, such as live sessions.
    pub async fn auth_headers(&self) -> GenAiResult<HashMap<String, String>> {
        let mut headers = HashMap::new();
        self.auth.add_auth_headers(&mut headers).await?;
        Ok(headers)
    }

    /// WebSocket endpoint for live sessions.
    pub fn live_url(&self) -> GenAiResult<Url> {
        self.dialect
            .live_url(&self.config.http_options, self.config.api_key.as_ref())
    }

    async fn prepare(&self, descriptor: RequestDescriptor) -> GenAiResult<HttpRequest> {
        let mut request = self.builder.build_request(descriptor)?;
        self.auth.add_auth_headers(&mut request.headers).await?;
        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            "Sending request"
        );
        Ok(request)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

/// Drains an error body. Read failures truncate what was collected so far.
async fn collect_body(mut body: super::http::ChunkedStream) -> Vec<u8> {
    use futures::StreamExt;

    let mut collected = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => collected.extend_from_slice(&bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Error body truncated");
                break;
            }
        }
    }
    collected
}
