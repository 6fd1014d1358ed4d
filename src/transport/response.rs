//! Response handling: status classification and the success envelope.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{map_http_status_with_body, GenAiError, GenAiResult};
use super::http::HttpResponse;

/// Successful HTTP response with materialized headers and a body decoded on demand.
#[derive(Debug, Clone)]
pub struct HttpEnvelope {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl HttpEnvelope {
    /// Wraps a response. Header names are lower-cased.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self { status, headers, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// All headers, with lower-cased names.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the body as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> GenAiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the body as a JSON value; an empty body decodes to `{}`.
    pub fn json_value(&self) -> GenAiResult<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        self.json()
    }
}

/// Parser for HTTP responses.
pub struct ResponseParser;

impl ResponseParser {
    /// True for 2xx statuses.
    pub fn is_success(status: u16) -> bool {
        (200..300).contains(&status)
    }

    /// Wraps a 2xx response in an envelope, or classifies the failure.
    pub fn into_envelope(response: HttpResponse) -> GenAiResult<HttpEnvelope> {
        if Self::is_success(response.status) {
            Ok(HttpEnvelope::new(response.status, response.headers, response.body))
        } else {
            Err(Self::parse_error_response(response.status, &response.headers, &response.body))
        }
    }

    /// Maps an error response to a client, server or unexpected-status error.
    pub fn parse_error_response(
        status: u16,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> GenAiError {
        let content_type = header_ci(headers, "content-type");
        let error = map_http_status_with_body(status, content_type, body);

        if let Some(id) = Self::extract_request_id(headers) {
            tracing::debug!(
                request_id = %id,
                status,
                error = %error,
                "API error occurred"
            );
        }

        error
    }

    /// Extracts the request ID from response headers for debugging.
    ///
    /// # Example
    ///
    /// ```
    /// use integrations_genai::transport::ResponseParser;
    /// use std::collections::HashMap;
    ///
    /// let mut headers = HashMap::new();
    /// headers.insert("x-request-id".to_string(), "abc123".to_string());
    ///
    /// let request_id = ResponseParser::extract_request_id(&headers);
    /// assert_eq!(request_id, Some("abc123".to_string()));
    /// ```
    pub fn extract_request_id(headers: &HashMap<String, String>) -> Option<String> {
        ["x-request-id", "x-goog-request-id", "request-id"]
            .iter()
            .find_map(|name| header_ci(headers, name))
            .map(str::to_string)
    }
}

fn header_ci<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
