use std::fmt;

/// Upload status reported in `x-goog-upload-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// More chunks are expected.
    Active,
    /// The upload is complete.
    Final,
    /// Anything else, including a missing header.
    Other(String),
}

impl UploadStatus {
    /// Parses a header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("active") => UploadStatus::Active,
            Some("final") => UploadStatus::Final,
            Some(other) => UploadStatus::Other(other.to_string()),
            None => UploadStatus::Other(String::new()),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Active => f.write_str("active"),
            UploadStatus::Final => f.write_str("final"),
            UploadStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Progress of one resumable upload.
#[derive(Debug, Clone)]
pub struct UploadSession {
    upload_url: String,
    total_size: u64,
    bytes_sent: u64,
    status: UploadStatus,
    chunks_sent: usize,
}

impl UploadSession {
    /// Session for a negotiated URL.
    pub fn new(upload_url: impl Into<String>, total_size: u64) -> Self {
        Self {
            upload_url: upload_url.into(),
            total_size,
            bytes_sent: 0,
            status: UploadStatus::Active,
            chunks_sent: 0,
        }
    }

    /// Negotiated upload URL.
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Total payload size.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes acknowledged so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Last reported status.
    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    /// Number of chunks acknowledged.
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// True while bytes remain to be sent.
    pub fn has_remaining(&self) -> bool {
        self.bytes_sent < self.total_size
    }

    /// Length of the next chunk given the maximum chunk size.
    pub fn next_chunk_len(&self, max_chunk_size: u64) -> u64 {
        max_chunk_size.min(self.total_size - self.bytes_sent)
    }

    /// Upload command for a chunk of `len` bytes starting at the current offset.
    pub fn command_for(&self, len: u64) -> &'static str {
        if self.bytes_sent + len >= self.total_size {
            "upload, finalize"
        } else {
            "upload"
        }
    }

    /// Records an acknowledged chunk.
    pub fn record_chunk(&mut self, len: u64, status: UploadStatus) {
        self.bytes_sent += len;
        self.chunks_sent += 1;
        self.status = status;
    }
}
