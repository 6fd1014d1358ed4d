use bytes::{Bytes, BytesMut};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::error::{GenAiResult, RequestError};

/// Payload to upload.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// In-memory bytes with an optional MIME type.
    Bytes {
        /// File content.
        data: Bytes,
        /// MIME type, when known.
        mime_type: Option<String>,
    },
    /// A file on disk; its MIME type is inferred from the extension.
    Path(PathBuf),
}

impl UploadSource {
    /// In-memory source.
    pub fn bytes(data: impl Into<Bytes>, mime_type: Option<&str>) -> Self {
        UploadSource::Bytes {
            data: data.into(),
            mime_type: mime_type.map(str::to_string),
        }
    }

    /// File source.
    pub fn path(path: impl AsRef<Path>) -> Self {
        UploadSource::Path(path.as_ref().to_path_buf())
    }

    /// Human-readable name for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            UploadSource::Bytes { data, .. } => format!("<{} bytes>", data.len()),
            UploadSource::Path(path) => path.display().to_string(),
        }
    }

    pub(crate) async fn open(&self) -> GenAiResult<SourceReader> {
        match self {
            UploadSource::Bytes { data, .. } => Ok(SourceReader::Memory(data.clone())),
            UploadSource::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| unreadable(self, &e))?;
                Ok(SourceReader::File(file))
            }
        }
    }
}

/// Size and type of an upload source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// MIME type, if it could be determined.
    pub mime_type: Option<String>,
}

/// Sequential chunk reader over a source.
pub(crate) enum SourceReader {
    Memory(Bytes),
    File(tokio::fs::File),
}

impl SourceReader {
    /// Reads exactly `len` bytes.
    pub(crate) async fn read_chunk(&mut self, len: usize, source: &UploadSource) -> GenAiResult<Bytes> {
        match self {
            SourceReader::Memory(data) => {
                if data.len() < len {
                    return Err(RequestError::UnreadableSource {
                        source_name: source.describe(),
                        message: "source is shorter than its reported size".to_string(),
                    }
                    .into());
                }
                Ok(data.split_to(len))
            }
            SourceReader::File(file) => {
                let mut buf = BytesMut::zeroed(len);
                file.read_exact(&mut buf)
                    .await
                    .map_err(|e| unreadable(source, &e))?;
                Ok(buf.freeze())
            }
        }
    }
}

pub(crate) fn unreadable(source: &UploadSource, err: &std::io::Error) -> crate::error::GenAiError {
    RequestError::UnreadableSource {
        source_name: source.describe(),
        message: err.to_string(),
    }
    .into()
}

/// Stats a source: length and inferred MIME type.
pub(crate) async fn stat_source(source: &UploadSource) -> GenAiResult<FileStat> {
    match source {
        UploadSource::Bytes { data, mime_type } => Ok(FileStat {
            size: data.len() as u64,
            mime_type: mime_type.clone(),
        }),
        UploadSource::Path(path) => {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| unreadable(source, &e))?;
            Ok(FileStat {
                size: metadata.len(),
                mime_type: mime_guess::from_path(path)
                    .first()
                    .map(|m| m.essence_str().to_string()),
            })
        }
    }
}
