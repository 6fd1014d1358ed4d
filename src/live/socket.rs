//! WebSocket capability.
//!
//! A factory opens a connection in the background and hands back channels. The
//! `opened` receiver resolves once the handshake completes, so callers can await
//! the open event instead of registering a callback.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;
use tracing::{debug, warn};
use url::Url;

use crate::error::{GenAiResult, NetworkError};

/// Outgoing instruction for the socket pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    /// Send one text frame.
    Send(String),
    /// Close the connection.
    Close,
}

/// Event observed on the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// One text (or UTF-8 binary) frame.
    Message(String),
    /// The connection closed.
    Closed {
        /// Close code, if the peer sent one.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },
    /// The connection failed.
    Error(String),
}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct SocketRequest {
    /// WebSocket URL.
    pub url: Url,
    /// Handshake headers.
    pub headers: HashMap<String, String>,
}

/// Channels of one connection.
#[derive(Debug)]
pub struct SocketLink {
    /// Frames and close requests to send.
    pub outbound: mpsc::UnboundedSender<SocketCommand>,
    /// Frames and lifecycle events received.
    pub inbound: mpsc::UnboundedReceiver<SocketEvent>,
    /// Resolves when the connection is open, or with the handshake failure.
    pub opened: oneshot::Receiver<GenAiResult<()>>,
}

/// Opens WebSocket connections.
pub trait WebSocketFactory: Send + Sync {
    /// Starts connecting and returns immediately.
    fn open(&self, request: SocketRequest) -> SocketLink;
}

/// WebSocket factory backed by tokio-tungstenite. Each connection runs one
/// background task pumping frames in both directions.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteSocketFactory;

impl TungsteniteSocketFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self
    }
}

impl WebSocketFactory for TungsteniteSocketFactory {
    fn open(&self, request: SocketRequest) -> SocketLink {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (opened_tx, opened_rx) = oneshot::channel();

        tokio::spawn(run_connection(request, outbound_rx, inbound_tx, opened_tx));

        SocketLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
            opened: opened_rx,
        }
    }
}

fn client_request(
    request: &SocketRequest,
) -> GenAiResult<tokio_tungstenite::tungstenite::handshake::client::Request> {
    let mut client_request = request.url.as_str().into_client_request()?;
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| NetworkError::WebSocket {
            message: format!("invalid header name {name}: {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| NetworkError::WebSocket {
            message: format!("invalid header value for {name}: {e}"),
        })?;
        client_request.headers_mut().insert(name, value);
    }
    Ok(client_request)
}

async fn run_connection(
    request: SocketRequest,
    mut outbound: mpsc::UnboundedReceiver<SocketCommand>,
    inbound: mpsc::UnboundedSender<SocketEvent>,
    opened: oneshot::Sender<GenAiResult<()>>,
) {
    let stream = match client_request(&request) {
        Ok(client_request) => connect_async(client_request).await.map_err(Into::into),
        Err(e) => Err(e),
    };
    let stream = match stream {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake failed");
            let _ = opened.send(Err(e));
            return;
        }
    };
    debug!(host = request.url.host_str().unwrap_or_default(), "WebSocket open");
    if opened.send(Ok(())).is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(SocketCommand::Send(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        let _ = inbound.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                }
                Some(SocketCommand::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    let _ = inbound.send(SocketEvent::Closed {
                        code: None,
                        reason: "closed by client".to_string(),
                    });
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let _ = inbound.send(SocketEvent::Message(text));
                }
                Some(Ok(Message::Binary(data))) => {
                    let event = match String::from_utf8(data) {
                        Ok(text) => SocketEvent::Message(text),
                        Err(e) => SocketEvent::Error(format!("binary frame is not UTF-8: {e}")),
                    };
                    let _ = inbound.send(event);
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (Some(u16::from(f.code)), f.reason.to_string()))
                        .unwrap_or((None, String::new()));
                    debug!(?code, %reason, "WebSocket closed by server");
                    let _ = inbound.send(SocketEvent::Closed { code, reason });
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    let _ = inbound.send(SocketEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    let _ = inbound.send(SocketEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    });
                    break;
                }
            }
        }
    }
}
