//! Multi-turn chat sessions.
//!
//! A [`Chat`] keeps the comprehensive history of a conversation and sends the
//! curated history with every new message. Calls on one chat are served strictly
//! one at a time, in the order they were made, so history entries never
//! interleave.

mod history;

pub use history::{extract_curated_history, validate_history};

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{Mutex as TurnLock, OwnedMutexGuard};

use crate::error::GenAiResult;
use crate::services::{ContentStream, ModelsService};
use crate::types::{Content, GenerateContentConfig, GenerateContentResponse, Role};

/// Creates chat sessions.
#[derive(Clone)]
pub struct Chats {
    models: Arc<dyn ModelsService>,
}

impl Chats {
    /// Factory over a models service.
    pub fn new(models: Arc<dyn ModelsService>) -> Self {
        Self { models }
    }

    /// Starts a chat. A supplied history is validated before anything is sent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use integrations_genai::GenAiClient;
    /// # use integrations_genai::types::GenerateContentConfig;
    /// # async fn example(client: GenAiClient) -> Result<(), integrations_genai::GenAiError> {
    /// let chat = client
    ///     .chats()
    ///     .create("gemini-2.0-flash", GenerateContentConfig::default(), Vec::new())?;
    /// let response = chat.send_message("Why is the sky blue?").await?;
    /// println!("{:?}", response.text());
    /// # Ok(())
    /// # }
    /// ```
    pub fn create(
        &self,
        model: impl Into<String>,
        config: GenerateContentConfig,
        history: Vec<Content>,
    ) -> GenAiResult<Chat> {
        validate_history(&history)?;
        Ok(Chat {
            models: Arc::clone(&self.models),
            model: model.into(),
            config,
            history: Arc::new(Mutex::new(history)),
            turn: Arc::new(TurnLock::new(())),
        })
    }
}

/// One conversation.
pub struct Chat {
    models: Arc<dyn ModelsService>,
    model: String,
    config: GenerateContentConfig,
    history: Arc<Mutex<Vec<Content>>>,
    turn: Arc<TurnLock<()>>,
}

impl Chat {
    /// Model this chat talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// History of the conversation.
    ///
    /// The comprehensive history includes empty or invalid model turns. The curated
    /// history drops them together with the user turns that produced them.
    pub fn get_history(&self, curated: bool) -> Vec<Content> {
        let history = self.history.lock();
        if curated {
            extract_curated_history(&history)
        } else {
            history.clone()
        }
    }

    /// Sends a message and waits for the complete response.
    pub async fn send_message(&self, message: impl Into<Content>) -> GenAiResult<GenerateContentResponse> {
        self.send_message_with_config(message, None).await
    }

    /// Like [`Chat::send_message`], with settings overriding the chat's for this turn.
    pub async fn send_message_with_config(
        &self,
        message: impl Into<Content>,
        config: Option<GenerateContentConfig>,
    ) -> GenAiResult<GenerateContentResponse> {
        let input = message.into();
        let _turn = self.turn.lock().await;

        let request = config
            .as_ref()
            .unwrap_or(&self.config)
            .to_request(self.contents_with(&input));
        let response = self.models.generate_content(&self.model, request).await?;

        let output: Vec<Content> = response.first_content().cloned().into_iter().collect();
        record_history(&self.history, input, output);
        Ok(response)
    }

    /// Sends a message and streams the response.
    ///
    /// The chat stays busy until the stream ends or is dropped. Valid chunks are
    /// recorded once the stream has been read to the end.
    pub async fn send_message_stream(&self, message: impl Into<Content>) -> GenAiResult<ContentStream> {
        self.send_message_stream_with_config(message, None).await
    }

    /// Like [`Chat::send_message_stream`], with per-turn settings.
    pub async fn send_message_stream_with_config(
        &self,
        message: impl Into<Content>,
        config: Option<GenerateContentConfig>,
    ) -> GenAiResult<ContentStream> {
        let input = message.into();
        let turn = Arc::clone(&self.turn).lock_owned().await;

        let request = config
            .as_ref()
            .unwrap_or(&self.config)
            .to_request(self.contents_with(&input));
        let inner = self.models.generate_content_stream(&self.model, request).await?;

        let state = RecordingStream {
            inner,
            input,
            output: Vec::new(),
            history: Arc::clone(&self.history),
            _turn: turn,
        };
        Ok(Box::pin(futures::stream::unfold(Some(state), |state| async move {
            let mut state = state?;
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    if chunk.is_valid() {
                        state.output.extend(chunk.first_content().cloned());
                    }
                    Some((Ok(chunk), Some(state)))
                }
                Some(Err(e)) => Some((Err(e), None)),
                None => {
                    record_history(&state.history, state.input, state.output);
                    None
                }
            }
        })))
    }

    fn contents_with(&self, input: &Content) -> Vec<Content> {
        let mut contents = self.get_history(true);
        contents.push(input.clone());
        contents
    }
}

impl std::fmt::Debug for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chat")
            .field("model", &self.model)
            .field("turns", &self.history.lock().len())
            .finish_non_exhaustive()
    }
}

/// Streamed exchange in flight. Holds the chat's turn until dropped.
struct RecordingStream {
    inner: ContentStream,
    input: Content,
    output: Vec<Content>,
    history: Arc<Mutex<Vec<Content>>>,
    _turn: OwnedMutexGuard<()>,
}

/// Appends one exchange. Output that is missing or not all model turns is
/// recorded as a single empty model turn.
fn record_history(history: &Mutex<Vec<Content>>, input: Content, output: Vec<Content>) {
    let output = if !output.is_empty() && output.iter().all(|c| c.has_role(Role::Model)) {
        output
    } else {
        vec![Content::empty_model()]
    };

    let mut history = history.lock();
    history.push(input);
    history.extend(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenAiClientBuilder;
    use crate::error::GenAiError;
    use crate::mocks::MockHttpTransport;
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn chats(transport: Arc<MockHttpTransport>) -> Chats {
        GenAiClientBuilder::new()
            .api_key(SecretString::new("test-key".into()))
            .transport(transport)
            .build()
            .unwrap()
            .chats()
    }

    fn reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
    }

    fn sent_contents(transport: &MockHttpTransport, index: usize) -> Vec<Value> {
        let request = &transport.get_requests()[index];
        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        body["contents"].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_send_message_records_exchange() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &reply("Hello!"));
        transport.enqueue_json_response(200, &reply("Fine."));
        let chat = chats(transport.clone())
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        chat.send_message("Hi").await.unwrap();
        chat.send_message("How are you?").await.unwrap();

        // Assert
        let history = chat.get_history(false);
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].text().as_deref(), Some("Hello!"));
        assert_eq!(sent_contents(&transport, 1).len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_response_is_excluded_from_curated_history() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &json!({ "candidates": [] }));
        transport.enqueue_json_response(200, &reply("ok"));
        let chat = chats(transport.clone())
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        chat.send_message("first").await.unwrap();
        chat.send_message("second").await.unwrap();

        // Assert
        let history = chat.get_history(false);
        assert_eq!(history.len(), 4);
        assert_eq!(history[1], Content::empty_model());
        assert_eq!(chat.get_history(true).len(), 2);
        let contents = sent_contents(&transport, 1);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["parts"][0]["text"], "second");
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_unchanged() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(500, &json!({ "error": { "message": "boom" } }));
        transport.enqueue_json_response(200, &reply("recovered"));
        let chat = chats(transport)
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        let failed = chat.send_message("first").await;
        let recovered = chat.send_message("second").await;

        // Assert
        assert!(matches!(failed, Err(GenAiError::Server(_))));
        assert!(recovered.is_ok());
        assert_eq!(chat.get_history(false).len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_serialized() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new().with_delay(Duration::from_millis(20)));
        transport.enqueue_json_response(200, &reply("one"));
        transport.enqueue_json_response(200, &reply("two"));
        let chat = chats(transport.clone())
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        let (first, second) = tokio::join!(chat.send_message("a"), chat.send_message("b"));

        // Assert
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(sent_contents(&transport, 1).len(), 3);
        let texts: Vec<_> = chat.get_history(false).iter().filter_map(Content::text).collect();
        assert_eq!(texts, vec!["a", "one", "b", "two"]);
    }

    #[tokio::test]
    async fn test_stream_records_valid_chunks_at_end() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_sse_response(&[reply("Hel"), json!({ "candidates": [] }), reply("lo")]);
        let chat = chats(transport)
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        let mut stream = chat.send_message_stream("Hi").await.unwrap();
        let mut chunks = 0;
        while let Some(chunk) = stream.next().await {
            chunk.unwrap();
            chunks += 1;
            assert!(chat.get_history(false).is_empty());
        }

        // Assert
        assert_eq!(chunks, 3);
        let history = chat.get_history(false);
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].text().as_deref(), Some("lo"));
    }

    #[tokio::test]
    async fn test_dropped_stream_records_nothing_and_frees_chat() {
        // Arrange
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_sse_response(&[reply("partial"), reply("more")]);
        transport.enqueue_json_response(200, &reply("next"));
        let chat = chats(transport)
            .create("gemini-pro", GenerateContentConfig::default(), Vec::new())
            .unwrap();

        // Act
        let mut stream = chat.send_message_stream("Hi").await.unwrap();
        stream.next().await.unwrap().unwrap();
        drop(stream);
        let next = tokio::time::timeout(Duration::from_secs(1), chat.send_message("again")).await;

        // Assert
        assert!(next.unwrap().is_ok());
        let history = chat.get_history(false);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text().as_deref(), Some("again"));
    }

    #[test]
    fn test_create_rejects_invalid_history() {
        let transport = Arc::new(MockHttpTransport::new());

        let result = chats(transport).create(
            "gemini-pro",
            GenerateContentConfig::default(),
            vec![Content::model("hi")],
        );

        assert!(matches!(
            result,
            Err(GenAiError::Request(crate::error::RequestError::InvalidHistory { .. }))
        ));
    }
}
