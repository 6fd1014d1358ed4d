//! Mock implementations for testing.
//!
//! Scripted stand-ins for the transport, credential and socket seams so the
//! request engine, streams, uploads and live sessions can be driven without a
//! network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::auth::{has_header, AuthManager, AUTHORIZATION_HEADER};
use crate::error::{GenAiResult, NetworkError};
use crate::live::{SocketCommand, SocketEvent, SocketLink, SocketRequest, WebSocketFactory};
use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, StreamingResponse, TransportError,
};

type ScriptedStream = Result<(u16, HashMap<String, String>, Vec<Result<Bytes, TransportError>>), TransportError>;

/// Mock HTTP transport for testing.
///
/// Responses are returned in the order they were enqueued; every request is
/// recorded for later inspection.
///
/// ```
/// use integrations_genai::mocks::MockHttpTransport;
/// use serde_json::json;
///
/// let transport = MockHttpTransport::new();
/// transport.enqueue_json_response(200, &json!({ "status": "ok" }));
/// assert_eq!(transport.request_count(), 0);
/// ```
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    streaming_responses: Mutex<VecDeque<ScriptedStream>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockHttpTransport {
    /// Create a new mock HTTP transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            streaming_responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Waits `delay` before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Enqueue a response to be returned by the next request.
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().push_back(response);
    }

    /// Enqueue a JSON response with the given status code and body.
    pub fn enqueue_json_response(&self, status: u16, body: &Value) {
        self.enqueue_response_with_headers(status, HashMap::new(), body);
    }

    /// Enqueue a JSON response carrying extra headers.
    pub fn enqueue_response_with_headers(&self, status: u16, mut headers: HashMap<String, String>, body: &Value) {
        headers
            .entry("content-type".to_string())
            .or_insert_with(|| "application/json".to_string());
        self.enqueue_response(Ok(HttpResponse {
            status,
            headers,
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Enqueue a raw-bodied response.
    pub fn enqueue_raw_response(&self, status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) {
        self.enqueue_response(Ok(HttpResponse {
            status,
            headers,
            body: body.into(),
        }));
    }

    /// Enqueue an error response.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// Enqueue a streaming response with multiple chunks.
    pub fn enqueue_streaming_response(&self, status: u16, headers: HashMap<String, String>, chunks: Vec<Bytes>) {
        self.streaming_responses
            .lock()
            .push_back(Ok((status, headers, chunks.into_iter().map(Ok).collect())));
    }

    /// Enqueue a streaming response whose body fails after `chunks`.
    pub fn enqueue_failing_stream(&self, chunks: Vec<Bytes>, error: TransportError) {
        let mut body: Vec<Result<Bytes, TransportError>> = chunks.into_iter().map(Ok).collect();
        body.push(Err(error));
        self.streaming_responses
            .lock()
            .push_back(Ok((200, sse_headers(), body)));
    }

    /// Enqueue a 200 event stream with one `data:` frame per value.
    pub fn enqueue_sse_response(&self, frames: &[Value]) {
        let chunks = frames
            .iter()
            .map(|frame| Bytes::from(format!("data: {}\n\n", frame)))
            .collect();
        self.enqueue_streaming_response(200, sse_headers(), chunks);
    }

    /// Enqueue a streaming error.
    pub fn enqueue_streaming_error(&self, error: TransportError) {
        self.streaming_responses.lock().push_back(Err(error));
    }

    /// Get all requests that were made.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the last request that was made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Verify that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = self.request_count();
        assert_eq!(actual, expected, "Expected {} requests, got {}", expected, actual);
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Verify that a request was made with the expected method and URL.
    pub fn verify_request(&self, index: usize, method: HttpMethod, url_contains: &str) {
        let requests = self.requests.lock();
        assert!(index < requests.len(), "No request at index {}", index);

        let request = &requests[index];
        assert_eq!(request.method, method, "Expected method {:?}, got {:?}", method, request.method);
        assert!(
            request.url.contains(url_contains),
            "Expected URL to contain '{}', got '{}'",
            url_contains,
            request.url
        );
    }

    /// Verify that a request contains a specific header.
    pub fn verify_header(&self, index: usize, header_name: &str, header_value: &str) {
        let requests = self.requests.lock();
        assert!(index < requests.len(), "No request at index {}", index);

        let actual_value = requests[index]
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header_name))
            .map(|(_, value)| value.as_str());
        assert_eq!(
            actual_value,
            Some(header_value),
            "Expected header '{}' to be '{}', got {:?}",
            header_name,
            header_value,
            actual_value
        );
    }

    async fn record(&self, request: HttpRequest) {
        self.requests.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn sse_headers() -> HashMap<String, String> {
    HashMap::from([("content-type".to_string(), "text/event-stream".to_string())])
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record(request).await;
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection(
                "No response configured in MockHttpTransport".to_string(),
            ))
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        self.record(request).await;
        let (status, headers, chunks) = self.streaming_responses.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection(
                "No streaming response configured in MockHttpTransport".to_string(),
            ))
        })?;

        Ok(StreamingResponse {
            status,
            headers,
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

/// Mock credential source.
///
/// Adds `Authorization: Bearer test-token` unless the request already carries an
/// authorization header, and counts how often it was consulted.
#[derive(Clone, Default)]
pub struct MockAuthManager {
    calls: Arc<AtomicUsize>,
}

impl MockAuthManager {
    /// Token value injected by the mock.
    pub const TOKEN: &'static str = "test-token";

    /// Create a new mock auth manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Times credentials were requested.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthManager for MockAuthManager {
    async fn add_auth_headers(&self, headers: &mut HashMap<String, String>) -> GenAiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !has_header(headers, AUTHORIZATION_HEADER) {
            headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", Self::TOKEN));
        }
        Ok(())
    }
}

/// Server side of a mocked WebSocket connection.
pub struct MockSocketPeer {
    request: SocketRequest,
    commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: mpsc::UnboundedSender<SocketEvent>,
    opened: Option<oneshot::Sender<GenAiResult<()>>>,
}

impl MockSocketPeer {
    /// The connection request the client made.
    pub fn request(&self) -> &SocketRequest {
        &self.request
    }

    /// Completes the handshake.
    pub fn accept(&mut self) {
        if let Some(opened) = self.opened.take() {
            let _ = opened.send(Ok(()));
        }
    }

    /// Fails the handshake.
    pub fn reject(&mut self, message: &str) {
        if let Some(opened) = self.opened.take() {
            let _ = opened.send(Err(NetworkError::ConnectionFailed {
                message: message.to_string(),
            }
            .into()));
        }
    }

    /// Next command the client sent, waiting if none is queued.
    pub async fn next_command(&mut self) -> Option<SocketCommand> {
        self.commands.recv().await
    }

    /// Next text frame the client sent, parsed as JSON.
    pub async fn next_frame(&mut self) -> Option<Value> {
        loop {
            match self.commands.recv().await? {
                SocketCommand::Send(text) => return serde_json::from_str(&text).ok(),
                SocketCommand::Close => return None,
            }
        }
    }

    /// Commands already queued, without waiting.
    pub fn drain_commands(&mut self) -> Vec<SocketCommand> {
        let mut drained = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            drained.push(command);
        }
        drained
    }

    /// Delivers a server frame.
    pub fn push_message(&self, message: &Value) {
        let _ = self.events.send(SocketEvent::Message(message.to_string()));
    }

    /// Delivers a raw text frame.
    pub fn push_text(&self, text: &str) {
        let _ = self.events.send(SocketEvent::Message(text.to_string()));
    }

    /// Closes the connection from the server side.
    pub fn close(&self, code: Option<u16>, reason: &str) {
        let _ = self.events.send(SocketEvent::Closed {
            code,
            reason: reason.to_string(),
        });
    }

    /// Reports a connection failure.
    pub fn fail(&self, message: &str) {
        let _ = self.events.send(SocketEvent::Error(message.to_string()));
    }
}

/// Mock WebSocket factory.
///
/// Each `open` creates a [`MockSocketPeer`]. With auto-accept enabled (the
/// default) the handshake completes immediately.
pub struct MockSocketFactory {
    auto_accept: bool,
    peers: Mutex<VecDeque<MockSocketPeer>>,
}

impl MockSocketFactory {
    /// Factory whose connections open immediately.
    pub fn new() -> Self {
        Self {
            auto_accept: true,
            peers: Mutex::new(VecDeque::new()),
        }
    }

    /// Factory whose connections wait for [`MockSocketPeer::accept`].
    pub fn manual() -> Self {
        Self {
            auto_accept: false,
            peers: Mutex::new(VecDeque::new()),
        }
    }

    /// Takes the oldest connection not yet claimed by the test.
    pub fn take_peer(&self) -> Option<MockSocketPeer> {
        self.peers.lock().pop_front()
    }

    /// Number of unclaimed connections.
    pub fn pending_peers(&self) -> usize {
        self.peers.lock().len()
    }
}

impl Default for MockSocketFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketFactory for MockSocketFactory {
    fn open(&self, request: SocketRequest) -> SocketLink {
        let (outbound, commands) = mpsc::unbounded_channel();
        let (events, inbound) = mpsc::unbounded_channel();
        let (opened_tx, opened) = oneshot::channel();

        let mut peer = MockSocketPeer {
            request,
            commands,
            events,
            opened: Some(opened_tx),
        };
        if self.auto_accept {
            peer.accept();
        }
        self.peers.lock().push_back(peer);

        SocketLink {
            outbound,
            inbound,
            opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    fn request(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_mock_transport_multiple_responses() {
        let transport = MockHttpTransport::new();
        transport.enqueue_json_response(200, &json!({"id": 1}));
        transport.enqueue_json_response(201, &json!({"id": 2}));

        let first = transport.send(request("https://example.com/1")).await.unwrap();
        let second = transport.send(request("https://example.com/2")).await.unwrap();

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 201);
        transport.verify_request_count(2);
        transport.verify_request(1, HttpMethod::Get, "/2");
    }

    #[tokio::test]
    async fn test_mock_transport_unscripted_request_fails() {
        let transport = MockHttpTransport::new();

        let result = transport.send(request("https://example.com")).await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
        transport.verify_request_count(1);
    }

    #[tokio::test]
    async fn test_mock_transport_streaming() {
        let transport = MockHttpTransport::new();
        transport.enqueue_sse_response(&[json!({"n": 1}), json!({"n": 2})]);

        let response = transport.send_streaming(request("https://example.com/s")).await.unwrap();
        let chunks: Vec<_> = response.body.collect().await;

        assert_eq!(response.status, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap(), &Bytes::from("data: {\"n\":1}\n\n"));
    }

    #[tokio::test]
    async fn test_mock_auth_keeps_existing_header() {
        let auth = MockAuthManager::new();
        let mut headers = HashMap::from([("authorization".to_string(), "Bearer mine".to_string())]);

        auth.add_auth_headers(&mut headers).await.unwrap();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["authorization"], "Bearer mine");
        assert_eq!(auth.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_socket_round_trip() {
        let factory = MockSocketFactory::new();
        let mut link = factory.open(SocketRequest {
            url: url::Url::parse("wss://example.com/ws").unwrap(),
            headers: HashMap::new(),
        });
        let mut peer = factory.take_peer().unwrap();

        link.opened.await.unwrap().unwrap();
        link.outbound.send(SocketCommand::Send("{\"a\":1}".to_string())).unwrap();
        peer.push_message(&json!({"setupComplete": {}}));

        assert_eq!(peer.next_frame().await, Some(json!({"a": 1})));
        assert_eq!(
            link.inbound.recv().await,
            Some(SocketEvent::Message("{\"setupComplete\":{}}".to_string()))
        );
    }
}
