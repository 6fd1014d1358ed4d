//! Main error type for the generative AI client.

use std::time::Duration;
use thiserror::Error;
use super::categories::*;
use crate::transport::TransportError;

/// Result type alias for client operations.
pub type GenAiResult<T> = Result<T, GenAiError>;

/// Top-level error type for the integration.
#[derive(Error, Debug, Clone)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// HTTP 4xx. The caller can fix the request.
    #[error("Client error: {0}")]
    Client(ApiError),

    /// HTTP 5xx.
    #[error("Server error: {0}")]
    Server(ApiError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),
}

impl GenAiError {
    /// Returns true if repeating the same call may succeed.
    ///
    /// Nothing in this crate acts on this; the decision belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenAiError::Server(_)
                | GenAiError::Network(NetworkError::Timeout { .. })
                | GenAiError::Network(NetworkError::ConnectionFailed { .. })
        )
    }

    /// HTTP status carried by client and server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            GenAiError::Client(e) | GenAiError::Server(e) => Some(e.status),
            GenAiError::Response(ResponseError::UnexpectedStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Raw server error body, when the error came from an HTTP response.
    pub fn body(&self) -> Option<&str> {
        match self {
            GenAiError::Client(e) | GenAiError::Server(e) => Some(e.body.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GenAiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenAiError::Network(NetworkError::Timeout {
                duration: Duration::from_secs(0), // Unknown actual duration
            })
        } else {
            GenAiError::Network(NetworkError::ConnectionFailed {
                message: err.to_string(),
            })
        }
    }
}

impl From<TransportError> for GenAiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => GenAiError::Network(NetworkError::Timeout {
                duration: Duration::from_secs(0),
            }),
            TransportError::Connection(message) | TransportError::Request(message) => {
                GenAiError::Network(NetworkError::ConnectionFailed { message })
            }
        }
    }
}

impl From<serde_json::Error> for GenAiError {
    fn from(err: serde_json::Error) -> Self {
        GenAiError::Response(ResponseError::DeserializationError {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for GenAiError {
    fn from(err: url::ParseError) -> Self {
        GenAiError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GenAiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GenAiError::Network(NetworkError::WebSocket {
            message: err.to_string(),
        })
    }
}
