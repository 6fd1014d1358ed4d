//! Request descriptors and HTTP request construction.
//!
//! A [`RequestDescriptor`] is the logical call (path, query, body, method and
//! per-call options). The [`RequestBuilder`] turns it into a transport-level
//! [`HttpRequest`] by:
//! - layering the per-call options over the client defaults
//! - asking the dialect for the final URL
//! - adding the default headers and server timeout header

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::config::{GenAiConfig, HttpOptions};
use crate::dialect::Dialect;
use crate::error::{GenAiResult, RequestError};
use super::http::{HttpRequest, HttpMethod};

/// Header carrying the server-side deadline, in whole seconds.
pub const SERVER_TIMEOUT_HEADER: &str = "X-Server-Timeout";

/// Body of a logical request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
}

impl RequestBody {
    /// True for bodies a GET request may carry: nothing, `null` or `{}`.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Json(Value::Null) => true,
            RequestBody::Json(Value::Object(map)) => map.is_empty(),
            RequestBody::Json(_) => false,
            RequestBody::Bytes(bytes) => bytes.is_empty(),
        }
    }

    fn into_bytes(self) -> GenAiResult<Option<Bytes>> {
        Ok(match self {
            RequestBody::Empty => None,
            RequestBody::Json(value) => Some(Bytes::from(serde_json::to_vec(&value)?)),
            RequestBody::Bytes(bytes) => Some(bytes),
        })
    }
}

/// One logical API call, built fresh for every request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Path relative to the versioned base URL. May carry its own query string.
    pub path: String,
    /// Query parameters appended to the URL.
    pub query_params: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// HTTP method.
    pub method: HttpMethod,
    /// Per-call overrides layered over the client defaults.
    pub http_options: Option<HttpOptions>,
}

impl RequestDescriptor {
    /// Descriptor with the given method and path and no body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query_params: Vec::new(),
            body: RequestBody::Empty,
            method,
            http_options: None,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(RequestBody::Json(body))
    }

    /// POST request with a raw body.
    pub fn post_bytes(path: impl Into<String>, body: Bytes) -> Self {
        Self::new(HttpMethod::Post, path).with_body(RequestBody::Bytes(body))
    }

    /// PATCH request with a JSON body.
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(RequestBody::Json(body))
    }

    /// Replace the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Append a query parameter when a value is present.
    pub fn with_optional_query(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.with_query(key, v.to_string()),
            None => self,
        }
    }

    /// Set per-call HTTP options.
    pub fn with_http_options(mut self, options: Option<HttpOptions>) -> Self {
        self.http_options = options;
        self
    }

    /// True if the path or the query parameters already carry `key`.
    pub fn has_query(&self, key: &str) -> bool {
        let in_path = self
            .path
            .split_once('?')
            .map_or(false, |(_, q)| q.split('&').any(|pair| pair.split('=').next() == Some(key)));
        in_path || self.query_params.iter().any(|(k, _)| k == key)
    }
}

/// Builds transport requests from descriptors.
#[derive(Clone)]
pub struct RequestBuilder {
    config: Arc<GenAiConfig>,
    dialect: Arc<dyn Dialect>,
}

impl RequestBuilder {
    /// Creates a new request builder.
    pub fn new(config: Arc<GenAiConfig>, dialect: Arc<dyn Dialect>) -> Self {
        Self { config, dialect }
    }

    /// Client defaults with the descriptor's overrides applied.
    pub fn resolve_options(&self, descriptor: &RequestDescriptor) -> HttpOptions {
        match &descriptor.http_options {
            Some(overrides) => self.config.http_options.patch(overrides),
            None => self.config.http_options.clone(),
        }
    }

    /// Builds the complete URL for a descriptor.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use integrations_genai::config::GenAiConfig;
    /// # use integrations_genai::dialect;
    /// # use integrations_genai::transport::{RequestBuilder, RequestDescriptor};
    /// # use secrecy::SecretString;
    /// let config = Arc::new(
    ///     GenAiConfig::builder()
    ///         .api_key(SecretString::new("test-key".into()))
    ///         .build()
    ///         .unwrap(),
    /// );
    /// let builder = RequestBuilder::new(config.clone(), dialect::for_config(&config));
    /// let descriptor = RequestDescriptor::get("models/gemini-2.0-flash");
    /// let url = builder.build_url(&descriptor, &builder.resolve_options(&descriptor)).unwrap();
    /// // https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash
    /// ```
    pub fn build_url(&self, descriptor: &RequestDescriptor, options: &HttpOptions) -> GenAiResult<Url> {
        self.dialect
            .build_url(options, descriptor, self.config.api_key.is_some())
    }

    /// Builds an HTTP request without credentials.
    ///
    /// GET requests with a non-empty body are rejected here, before anything reaches
    /// the network.
    pub fn build_request(&self, descriptor: RequestDescriptor) -> GenAiResult<HttpRequest> {
        if descriptor.method == HttpMethod::Get && !descriptor.body.is_empty() {
            let body = match &descriptor.body {
                RequestBody::Json(value) => value.to_string(),
                RequestBody::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
                RequestBody::Empty => String::new(),
            };
            return Err(RequestError::NonEmptyGetBody { body }.into());
        }

        let options = self.resolve_options(&descriptor);
        let url = self.build_url(&descriptor, &options)?;

        let mut headers = self.default_headers();
        headers.extend(options.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let timeout = options.effective_timeout();
        if let Some(timeout) = timeout {
            let seconds = timeout.as_millis().div_ceil(1000);
            headers.insert(SERVER_TIMEOUT_HEADER.to_string(), seconds.to_string());
        }

        Ok(HttpRequest {
            method: descriptor.method,
            url: url.to_string(),
            headers,
            body: descriptor.body.into_bytes()?,
            timeout,
        })
    }

    /// Headers sent with every call, before per-call overrides.
    pub fn default_headers(&self) -> HashMap<String, String> {
        let label = self.config.client_label();
        HashMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), label.clone()),
            ("x-goog-api-client".to_string(), label),
        ])
    }
}
