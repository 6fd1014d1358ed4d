//! `reqwest` implementation of [`HttpTransport`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use super::error::TransportError;
use super::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, StreamingResponse};

/// HTTP transport backed by a pooled `reqwest` client.
///
/// No overall timeout is installed on the client: a streaming body may stay open
/// for as long as the server keeps generating. Per-call limits come from
/// [`HttpRequest::timeout`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Transport whose client gives up on connecting after `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Headers that are not valid HTTP are dropped with a warning.
    fn header_map(headers: HashMap<String, String>) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid request header"),
            }
        }
        map
    }

    /// Header names come back lower-cased.
    fn response_headers(headers: &HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect()
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<reqwest::Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(Self::header_map(request.headers));
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        Ok(builder.send().await?)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.dispatch(request).await?;
        let status = response.status().as_u16();
        let headers = Self::response_headers(response.headers());
        let body = response.bytes().await?;
        Ok(HttpResponse { status, headers, body })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let response = self.dispatch(request).await?;
        let status = response.status().as_u16();
        let headers = Self::response_headers(response.headers());
        let body = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(TransportError::from)));
        Ok(StreamingResponse { status, headers, body })
    }
}
