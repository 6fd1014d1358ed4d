//! Resumable chunked upload.
//!
//! An upload is negotiated with one call that describes the file and returns an
//! upload URL. The payload is then sent to that URL in chunks of at most
//! [`MAX_CHUNK_SIZE`] bytes. Each chunk names its offset and carries the command
//! `upload`, except the last, which carries `upload, finalize`. The server reports
//! progress in `x-goog-upload-status`.

mod session;
mod source;

pub use session::{UploadSession, UploadStatus};
pub use source::{FileStat, UploadSource};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::HttpOptions;
use crate::error::{GenAiResult, ProtocolError, ResponseError};
use crate::transport::{ApiClient, RequestDescriptor};

/// Largest chunk sent in one request (8 MiB).
pub const MAX_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// Response header carrying the negotiated upload URL.
pub const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Response header carrying the upload status.
pub const UPLOAD_STATUS_HEADER: &str = "x-goog-upload-status";

/// Transfers payloads to a negotiated upload URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Size and MIME type of a source.
    async fn stat(&self, source: &UploadSource) -> GenAiResult<FileStat>;

    /// Sends the source to `upload_url` and returns the created file resource.
    async fn upload(&self, source: &UploadSource, upload_url: &str, api_client: &ApiClient) -> GenAiResult<Value>;
}

/// Default uploader: sequential chunks through the client's request engine.
#[derive(Debug, Clone)]
pub struct ChunkedUploader {
    chunk_size: u64,
}

impl Default for ChunkedUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedUploader {
    /// Uploader with the standard chunk size.
    pub fn new() -> Self {
        Self { chunk_size: MAX_CHUNK_SIZE }
    }

    /// Uploader with a custom chunk size (clamped to at least one byte).
    pub fn with_chunk_size(chunk_size: u64) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    /// Configured chunk size.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Runs the chunk loop and returns the finished session with the final response
    /// body.
    pub async fn upload_chunks(
        &self,
        source: &UploadSource,
        upload_url: &str,
        api_client: &ApiClient,
    ) -> GenAiResult<(UploadSession, Value)> {
        let total_size = self.stat(source).await?.size;
        let mut session = UploadSession::new(upload_url, total_size);
        let mut reader = source.open().await?;
        let mut last_body = None;

        while session.has_remaining() {
            let len = session.next_chunk_len(self.chunk_size);
            let command = session.command_for(len);
            let chunk_len = usize::try_from(len).map_err(|_| ProtocolError::UploadInterrupted {
                bytes_sent: session.bytes_sent(),
                total_size,
                status: "chunk too large for this platform".to_string(),
            })?;
            let chunk = reader.read_chunk(chunk_len, source).await?;

            let options = HttpOptions::new()
                .with_base_url(upload_url)
                .with_api_version("")
                .with_header("X-Goog-Upload-Command", command)
                .with_header("X-Goog-Upload-Offset", session.bytes_sent().to_string())
                .with_header("Content-Length", len.to_string());
            let descriptor = RequestDescriptor::post_bytes("", chunk).with_http_options(Some(options));

            let envelope = api_client.request(descriptor).await?;
            let status = UploadStatus::from_header(envelope.header(UPLOAD_STATUS_HEADER));
            session.record_chunk(len, status);
            last_body = Some(envelope.json_value()?);

            tracing::debug!(
                offset = session.bytes_sent(),
                total = total_size,
                command,
                status = %session.status(),
                "Upload chunk acknowledged"
            );

            if *session.status() != UploadStatus::Active {
                break;
            }
        }

        if session.has_remaining() {
            return Err(ProtocolError::UploadInterrupted {
                bytes_sent: session.bytes_sent(),
                total_size,
                status: session.status().to_string(),
            }
            .into());
        }
        if *session.status() != UploadStatus::Final {
            return Err(ProtocolError::UploadNotFinalized {
                status: session.status().to_string(),
            }
            .into());
        }

        Ok((session, last_body.unwrap_or(Value::Null)))
    }
}

#[async_trait]
impl Uploader for ChunkedUploader {
    async fn stat(&self, source: &UploadSource) -> GenAiResult<FileStat> {
        source::stat_source(source).await
    }

    async fn upload(&self, source: &UploadSource, upload_url: &str, api_client: &ApiClient) -> GenAiResult<Value> {
        let (_, mut body) = self.upload_chunks(source, upload_url, api_client).await?;
        body.get_mut("file")
            .map(Value::take)
            .ok_or_else(|| ResponseError::MissingField { field: "file".to_string() }.into())
    }
}

/// Options for [`ApiClient::upload_file`].
#[derive(Debug, Clone, Default)]
pub struct UploadFileConfig {
    /// Resource name; `files/` is prepended when missing.
    pub name: Option<String>,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// MIME type; inferred from the source when absent.
    pub mime_type: Option<String>,
    /// Overrides for the negotiation call.
    pub http_options: Option<HttpOptions>,
}

impl UploadFileConfig {
    /// Empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
