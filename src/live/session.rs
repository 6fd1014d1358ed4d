use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use super::socket::{SocketCommand, SocketEvent};
use crate::dialect::Dialect;
use crate::error::{GenAiResult, NetworkError, ProtocolError, RequestError};
use crate::types::{LiveClientContent, LiveRealtimeInput, LiveServerMessage, LiveToolResponse};

/// Lifecycle of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the socket to open.
    Connecting,
    /// Socket open and setup sent.
    Open,
    /// At least one exchange after setup.
    Active,
    /// Closed locally, by the server, or after `goAway`. Terminal.
    Closed,
}

/// Handle to an open live session. Owned by the caller that connected it.
///
/// Sends take `&self` and never wait; [`Session::receive`] yields server messages
/// in arrival order. Nothing reconnects automatically.
pub struct Session {
    outbound: mpsc::UnboundedSender<SocketCommand>,
    inbound: Mutex<mpsc::UnboundedReceiver<SocketEvent>>,
    state: Arc<RwLock<SessionState>>,
    dialect: Arc<dyn Dialect>,
}

impl Session {
    pub(super) fn new(
        outbound: mpsc::UnboundedSender<SocketCommand>,
        inbound: mpsc::UnboundedReceiver<SocketEvent>,
        state: Arc<RwLock<SessionState>>,
        dialect: Arc<dyn Dialect>,
    ) -> Self {
        Self {
            outbound,
            inbound: Mutex::new(inbound),
            state,
            dialect,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Sends ordered content. The server applies these in the order sent.
    pub fn send_client_content(&self, content: LiveClientContent) -> GenAiResult<()> {
        self.send(content.to_message())
    }

    /// Sends one realtime chunk. No ordering is guaranteed relative to other sends.
    pub fn send_realtime_input(&self, input: LiveRealtimeInput) -> GenAiResult<()> {
        let media = input.media.as_ref().ok_or_else(|| RequestError::InvalidParameter {
            parameter: "media".to_string(),
            message: "Media is required.".to_string(),
        })?;
        self.send(input.to_message(media))
    }

    /// Answers tool calls.
    ///
    /// Fails before sending when the list is empty or, on the direct backend, when a
    /// response lacks the id of the call it answers.
    pub fn send_tool_response(&self, response: impl Into<LiveToolResponse>) -> GenAiResult<()> {
        let response = response.into();
        if response.function_responses.is_empty() {
            return Err(RequestError::InvalidParameter {
                parameter: "functionResponses".to_string(),
                message: "functionResponses is required.".to_string(),
            }
            .into());
        }
        if self.dialect.requires_function_response_id()
            && response.function_responses.iter().any(|r| r.id.is_none())
        {
            return Err(ProtocolError::MissingFunctionResponseId.into());
        }
        self.send(json!({ "toolResponse": { "functionResponses": response.function_responses } }))
    }

    /// Next server message, or `None` once the connection has closed.
    ///
    /// A `goAway` is delivered and leaves the session closed.
    pub async fn receive(&self) -> Option<GenAiResult<LiveServerMessage>> {
        let event = self.inbound.lock().await.recv().await;
        match event {
            Some(SocketEvent::Message(text)) => Some(self.decode(&text)),
            Some(SocketEvent::Error(message)) => {
                self.set_state(SessionState::Closed);
                Some(Err(NetworkError::WebSocket { message }.into()))
            }
            Some(SocketEvent::Closed { code, reason }) => {
                tracing::debug!(?code, %reason, "Live session closed");
                self.set_state(SessionState::Closed);
                None
            }
            None => {
                self.set_state(SessionState::Closed);
                None
            }
        }
    }

    /// Closes the connection. Sending afterwards fails with a closed-session error.
    pub fn close(&self) {
        let _ = self.outbound.send(SocketCommand::Close);
        self.set_state(SessionState::Closed);
    }

    fn decode(&self, text: &str) -> GenAiResult<LiveServerMessage> {
        let frame: Value = serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame {
            message: e.to_string(),
        })?;
        let normalized = self.dialect.translate_server_message(&frame)?;
        let message = LiveServerMessage::from_normalized(&normalized)?;

        if message.is_go_away() {
            tracing::debug!("Live session received goAway");
            self.set_state(SessionState::Closed);
        } else {
            self.mark_active();
        }
        Ok(message)
    }

    fn send(&self, message: Value) -> GenAiResult<()> {
        if self.state() == SessionState::Closed {
            return Err(NetworkError::SessionClosed {
                reason: "session is closed".to_string(),
            }
            .into());
        }
        self.outbound
            .send(SocketCommand::Send(message.to_string()))
            .map_err(|_| NetworkError::SessionClosed {
                reason: "connection task has exited".to_string(),
            })?;
        self.mark_active();
        Ok(())
    }

    fn mark_active(&self) {
        let mut state = self.state.write();
        if *state == SessionState::Open {
            *state = SessionState::Active;
        }
    }

    fn set_state(&self, next: SessionState) {
        *self.state.write() = next;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("backend", &self.dialect.backend())
            .finish_non_exhaustive()
    }
}
