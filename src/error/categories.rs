//! Error category types for granular error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Errors raised before any network call because the request itself is unusable.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error("Request body should be empty for GET request, but got: {body}")]
    NonEmptyGetBody { body: String },

    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    #[error("Invalid history: {message}")]
    InvalidHistory { message: String },

    #[error("{operation} is not supported by the {backend} backend")]
    UnsupportedOperation { operation: String, backend: String },

    #[error("Can not determine mimeType. Please provide mimeType in the config.")]
    MissingMimeType,

    #[error("Cannot read upload source {source_name}: {message}")]
    UnreadableSource { source_name: String, message: String },
}

/// Non-success HTTP response carried by the client and server error variants.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status.
    pub status_text: String,
    /// Raw error body text, as returned or synthesized.
    pub body: String,
    /// Formatted diagnostic message.
    pub message: String,
    /// `error.status` from the body, when present.
    pub error_status: Option<String>,
}

/// Wire-level protocol violations.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    #[error("Incomplete JSON segment at the end: {remainder}")]
    IncompleteStream { remainder: String },

    #[error("exception parsing stream chunk {payload}. {message}")]
    MalformedChunk { payload: String, message: String },

    #[error("Invalid UTF-8 in stream: {message}")]
    InvalidEncoding { message: String },

    #[error("Failed to get upload url. Server did not return the x-goog-upload-url in the headers")]
    MissingUploadUrl,

    #[error("Failed to upload file: Upload status is not finalized (status: {status})")]
    UploadNotFinalized { status: String },

    #[error("Upload stopped with status '{status}' after {bytes_sent} of {total_size} bytes")]
    UploadInterrupted {
        bytes_sent: u64,
        total_size: u64,
        status: String,
    },

    #[error("FunctionResponse request must have an `id` field from the response of a ToolCall.FunctionalCalls in Google AI.")]
    MissingFunctionResponseId,

    #[error("Malformed socket frame: {message}")]
    MalformedFrame { message: String },

    #[error("Unexpected socket event: {message}")]
    UnexpectedSocketEvent { message: String },
}

/// Network-related errors.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("WebSocket error: {message}")]
    WebSocket { message: String },

    #[error("Session closed: {reason}")]
    SessionClosed { reason: String },
}

/// Response handling errors.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    #[error("Failed to deserialize response: {message}")]
    DeserializationError { message: String },

    #[error("Unexpected response status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Missing field in response: {field}")]
    MissingField { field: String },
}

/// Errors from nested path addressing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Value must be a list given an array path {segment}")]
    ArrayValueRequired { segment: String },

    #[error("Cannot set value for an existing key. Key: {key}")]
    ConflictingValue { key: String },

    #[error("Empty path")]
    EmptyPath,
}
