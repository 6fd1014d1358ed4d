//! Live bidirectional sessions over WebSocket.
//!
//! [`Live::connect`] opens the socket, waits for the open event, sends the
//! setup message and returns a [`Session`]. State moves
//! `Connecting → Open → Active → Closed`.

mod session;
mod socket;

pub use session::{Session, SessionState};
pub use socket::{
    SocketCommand, SocketEvent, SocketLink, SocketRequest, TungsteniteSocketFactory, WebSocketFactory,
};

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Backend;
use crate::error::{GenAiResult, NetworkError};
use crate::transport::ApiClient;
use crate::types::LiveConnectConfig;

/// Entry point for live sessions.
#[derive(Clone)]
pub struct Live {
    api_client: ApiClient,
    factory: Arc<dyn WebSocketFactory>,
}

impl Live {
    /// Live module over a request engine and socket factory.
    pub fn new(api_client: ApiClient, factory: Arc<dyn WebSocketFactory>) -> Self {
        Self { api_client, factory }
    }

    /// Opens a session with `model`.
    ///
    /// The direct backend authenticates with the key in the URL; the project-scoped
    /// backend adds credential headers to the handshake.
    pub async fn connect(&self, model: &str, config: &LiveConnectConfig) -> GenAiResult<Session> {
        let dialect = Arc::clone(self.api_client.dialect());
        let setup = dialect.translate_live_setup(model, &serde_json::to_value(config)?)?;

        let url = self.api_client.live_url()?;
        let mut headers = self.api_client.request_builder().default_headers();
        headers.extend(self.api_client.config().http_options.headers.clone());
        if dialect.backend() == Backend::ProjectScoped {
            headers.extend(self.api_client.auth_headers().await?);
        }

        let state = Arc::new(RwLock::new(SessionState::Connecting));
        let link = self.factory.open(SocketRequest { url, headers });

        link.opened.await.map_err(|_| NetworkError::ConnectionFailed {
            message: "socket closed before opening".to_string(),
        })??;
        *state.write() = SessionState::Open;
        tracing::debug!(model, backend = %dialect.backend(), "Live session open");

        link.outbound
            .send(SocketCommand::Send(setup.to_string()))
            .map_err(|_| NetworkError::SessionClosed {
                reason: "connection task has exited".to_string(),
            })?;

        Ok(Session::new(link.outbound, link.inbound, state, dialect))
    }
}

impl std::fmt::Debug for Live {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Live")
            .field("backend", &self.api_client.dialect().backend())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenAiClientBuilder;
    use crate::error::{GenAiError, ProtocolError, RequestError};
    use crate::mocks::{MockAuthManager, MockHttpTransport, MockSocketFactory};
    use crate::types::{
        Blob, Content, FunctionResponse, LiveClientContent, LiveRealtimeInput, LiveServerPayload,
    };
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;

    fn direct_live(factory: Arc<MockSocketFactory>) -> Live {
        GenAiClientBuilder::new()
            .api_key(SecretString::new("test-key".into()))
            .transport(Arc::new(MockHttpTransport::new()))
            .socket_factory(factory)
            .build()
            .unwrap()
            .live()
    }

    fn project_live(factory: Arc<MockSocketFactory>) -> Live {
        GenAiClientBuilder::new()
            .backend(Backend::ProjectScoped)
            .project("my-project")
            .location("us-central1")
            .auth(Arc::new(MockAuthManager::new()))
            .transport(Arc::new(MockHttpTransport::new()))
            .socket_factory(factory)
            .build()
            .unwrap()
            .live()
    }

    #[tokio::test]
    async fn test_direct_connect_sends_setup() {
        // Arrange
        let factory = Arc::new(MockSocketFactory::new());
        let live = direct_live(factory.clone());

        // Act
        let session = live.connect("gemini-live", &LiveConnectConfig::default()).await.unwrap();
        let mut peer = factory.take_peer().unwrap();

        // Assert
        assert_eq!(session.state(), SessionState::Open);
        let url = peer.request().url.as_str().to_string();
        assert!(url.starts_with(
            "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent"
        ));
        assert!(url.ends_with("key=test-key"));
        assert!(!crate::auth::has_header(&peer.request().headers, "authorization"));
        assert!(crate::auth::has_header(&peer.request().headers, "x-goog-api-client"));
        assert_eq!(peer.next_frame().await, Some(json!({ "setup": { "model": "models/gemini-live" } })));
    }

    #[tokio::test]
    async fn test_project_scoped_connect_uses_auth_headers() {
        // Arrange
        let factory = Arc::new(MockSocketFactory::new());
        let live = project_live(factory.clone());

        // Act
        live.connect("gemini-live", &LiveConnectConfig::default()).await.unwrap();
        let mut peer = factory.take_peer().unwrap();

        // Assert
        assert_eq!(
            peer.request().url.as_str(),
            "wss://us-central1-aiplatform.googleapis.com/ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent"
        );
        assert_eq!(
            peer.request().headers.get("Authorization").map(String::as_str),
            Some("Bearer test-token")
        );
        let setup = peer.next_frame().await.unwrap();
        assert_eq!(
            setup["setup"]["model"],
            "projects/my-project/locations/us-central1/publishers/google/models/gemini-live"
        );
        assert_eq!(setup["setup"]["generationConfig"]["responseModalities"], json!(["AUDIO"]));
    }

    #[tokio::test]
    async fn test_rejected_handshake_fails_connect() {
        let factory = Arc::new(MockSocketFactory::manual());
        let live = direct_live(factory.clone());

        let connect = tokio::spawn(async move { live.connect("gemini-live", &LiveConnectConfig::default()).await });
        let mut peer = loop {
            if let Some(peer) = factory.take_peer() {
                break peer;
            }
            tokio::task::yield_now().await;
        };
        peer.reject("handshake refused");

        let result = connect.await.unwrap();
        assert!(matches!(
            result,
            Err(GenAiError::Network(NetworkError::ConnectionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        // Arrange
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();
        let mut peer = factory.take_peer().unwrap();
        peer.next_frame().await.unwrap();

        // Act
        session
            .send_client_content(LiveClientContent::turns(vec![Content::user("Hi")]))
            .unwrap();
        session
            .send_realtime_input(LiveRealtimeInput::media(Blob::from_bytes("audio/pcm", b"\x00\x01")))
            .unwrap();
        peer.push_message(&json!({ "setupComplete": {} }));
        peer.push_message(&json!({
            "serverContent": { "modelTurn": { "role": "model", "parts": [{ "text": "Hello" }] }, "turnComplete": true }
        }));

        // Assert
        assert_eq!(session.state(), SessionState::Active);
        let content = peer.next_frame().await.unwrap();
        assert_eq!(content["clientContent"]["turnComplete"], true);
        assert_eq!(content["clientContent"]["turns"][0]["parts"][0]["text"], "Hi");
        let realtime = peer.next_frame().await.unwrap();
        assert_eq!(realtime["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm");

        let first = session.receive().await.unwrap().unwrap();
        assert!(matches!(first.payload, LiveServerPayload::SetupComplete));
        let second = session.receive().await.unwrap().unwrap();
        assert_eq!(second.text().as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_tool_response_requires_id_on_direct() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();
        let mut peer = factory.take_peer().unwrap();
        peer.next_frame().await.unwrap();

        let missing = session.send_tool_response(FunctionResponse::new("lookup", json!({ "ok": true })));
        let empty = session.send_tool_response(Vec::<FunctionResponse>::new());
        session
            .send_tool_response(FunctionResponse::new("lookup", json!({ "ok": true })).with_id("call-1"))
            .unwrap();

        assert!(matches!(missing, Err(GenAiError::Protocol(ProtocolError::MissingFunctionResponseId))));
        assert!(matches!(empty, Err(GenAiError::Request(RequestError::InvalidParameter { .. }))));
        let frame = peer.next_frame().await.unwrap();
        assert_eq!(frame["toolResponse"]["functionResponses"][0]["id"], "call-1");
        assert!(peer.drain_commands().is_empty());
    }

    #[tokio::test]
    async fn test_tool_response_without_id_on_project_scoped() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = project_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();

        let result = session.send_tool_response(FunctionResponse::new("lookup", json!({})));

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_realtime_input_requires_media() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory)
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();

        let result = session.send_realtime_input(LiveRealtimeInput::default());

        match result {
            Err(GenAiError::Request(RequestError::InvalidParameter { message, .. })) => {
                assert_eq!(message, "Media is required.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_go_away_closes_session() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();
        let peer = factory.take_peer().unwrap();

        peer.push_message(&json!({ "goAway": { "timeLeft": "5s" } }));
        let message = session.receive().await.unwrap().unwrap();

        assert!(message.is_go_away());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.send_client_content(LiveClientContent::default()),
            Err(GenAiError::Network(NetworkError::SessionClosed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_server_close_ends_receive() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();
        let peer = factory.take_peer().unwrap();

        peer.close(Some(1000), "bye");

        assert!(session.receive().await.is_none());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_sends_close_command() {
        let factory = Arc::new(MockSocketFactory::new());
        let session = direct_live(factory.clone())
            .connect("gemini-live", &LiveConnectConfig::default())
            .await
            .unwrap();
        let mut peer = factory.take_peer().unwrap();

        session.close();

        let commands = peer.drain_commands();
        assert_eq!(commands.last(), Some(&SocketCommand::Close));
        assert_eq!(session.state(), SessionState::Closed);
    }
}
