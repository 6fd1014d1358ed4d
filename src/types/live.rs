//! Live session messages.
//!
//! Client messages are serialized to the camelCase wire shape directly. Server
//! frames are first normalized by the active dialect and then decoded into a
//! [`LiveServerMessage`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{Blob, Content, FunctionCall, FunctionResponse};
use super::generation::GenerationConfig;
use super::tools::Tool;
use crate::error::{GenAiResult, ProtocolError};

/// Settings sent in the setup message when a session opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveConnectConfig {
    /// Sampling configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    /// Output modalities. The project-scoped backend defaults to `AUDIO`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    /// Voice configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<Value>,
    /// System instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Tools callable during the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Resumption settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resumption: Option<SessionResumptionConfig>,
    /// Context window compression settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_compression: Option<Value>,
    /// Realtime input settings such as voice activity detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_input_config: Option<Value>,
}

/// Session resumption settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionResumptionConfig {
    /// Handle from a previous `sessionResumptionUpdate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Transparent resumption. Only the project-scoped backend accepts it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
}

/// Ordered client content.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveClientContent {
    /// Turns appended to the session context, in order.
    pub turns: Option<Vec<Content>>,
    /// Whether the server should start generating.
    pub turn_complete: bool,
}

impl Default for LiveClientContent {
    fn default() -> Self {
        Self {
            turns: None,
            turn_complete: true,
        }
    }
}

impl LiveClientContent {
    /// Content with the given turns, completing the turn.
    pub fn turns(turns: Vec<Content>) -> Self {
        Self {
            turns: Some(turns),
            turn_complete: true,
        }
    }

    /// Sets whether the turn is complete.
    pub fn with_turn_complete(mut self, turn_complete: bool) -> Self {
        self.turn_complete = turn_complete;
        self
    }

    pub(crate) fn to_message(&self) -> Value {
        let mut content = serde_json::Map::new();
        if let Some(turns) = &self.turns {
            content.insert("turns".to_string(), serde_json::json!(turns));
        }
        content.insert("turnComplete".to_string(), Value::Bool(self.turn_complete));
        serde_json::json!({ "clientContent": content })
    }
}

/// One realtime chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveRealtimeInput {
    /// Audio or image data.
    pub media: Option<Blob>,
    /// Marks the start of user activity.
    pub activity_start: Option<Value>,
    /// Marks the end of user activity.
    pub activity_end: Option<Value>,
}

impl LiveRealtimeInput {
    /// Input carrying one media chunk.
    pub fn media(media: Blob) -> Self {
        Self {
            media: Some(media),
            ..Default::default()
        }
    }

    pub(crate) fn to_message(&self, media: &Blob) -> Value {
        let mut input = serde_json::Map::new();
        input.insert("mediaChunks".to_string(), serde_json::json!([media]));
        if let Some(start) = &self.activity_start {
            input.insert("activityStart".to_string(), start.clone());
        }
        if let Some(end) = &self.activity_end {
            input.insert("activityEnd".to_string(), end.clone());
        }
        serde_json::json!({ "realtimeInput": input })
    }
}

/// Answers to tool calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveToolResponse {
    /// Function results.
    pub function_responses: Vec<FunctionResponse>,
}

impl From<FunctionResponse> for LiveToolResponse {
    fn from(response: FunctionResponse) -> Self {
        Self {
            function_responses: vec![response],
        }
    }
}

impl From<Vec<FunctionResponse>> for LiveToolResponse {
    fn from(function_responses: Vec<FunctionResponse>) -> Self {
        Self { function_responses }
    }
}

/// Model output within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerContent {
    /// Generated content.
    pub model_turn: Option<Content>,
    /// The model finished its turn.
    pub turn_complete: Option<bool>,
    /// Client input interrupted generation.
    pub interrupted: Option<bool>,
    /// The model finished generating.
    pub generation_complete: Option<bool>,
    /// Grounding metadata.
    pub grounding_metadata: Option<Value>,
}

/// Function calls requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerToolCall {
    /// Calls to execute.
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

/// Previously issued tool calls that should not be executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LiveServerToolCallCancellation {
    /// Ids of the cancelled calls.
    #[serde(default)]
    pub ids: Vec<String>,
}

/// The server will disconnect soon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerGoAway {
    /// Time remaining before the connection is closed.
    pub time_left: Option<String>,
}

/// New resumption state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerSessionResumptionUpdate {
    /// Handle to pass in [`SessionResumptionConfig::handle`].
    pub new_handle: Option<String>,
    /// Whether the session can be resumed at this point.
    pub resumable: Option<bool>,
    /// Index of the last client message the server has processed.
    pub last_consumed_client_message_index: Option<String>,
}

/// Token accounting for a live session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveUsageMetadata {
    pub prompt_token_count: Option<i32>,
    pub cached_content_token_count: Option<i32>,
    pub response_token_count: Option<i32>,
    pub tool_use_prompt_token_count: Option<i32>,
    pub thoughts_token_count: Option<i32>,
    pub total_token_count: Option<i32>,
}

/// What a server frame carries.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveServerPayload {
    /// Setup was accepted.
    SetupComplete,
    /// Model output.
    ServerContent(LiveServerContent),
    /// Function calls.
    ToolCall(LiveServerToolCall),
    /// Cancelled function calls.
    ToolCallCancellation(LiveServerToolCallCancellation),
    /// Imminent disconnect.
    GoAway(LiveServerGoAway),
    /// Resumption state.
    SessionResumptionUpdate(LiveServerSessionResumptionUpdate),
    /// Frame carrying only usage metadata.
    UsageMetadata,
}

/// One decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveServerMessage {
    /// The frame's payload.
    pub payload: LiveServerPayload,
    /// Usage metadata sent alongside the payload.
    pub usage_metadata: Option<LiveUsageMetadata>,
}

impl LiveServerMessage {
    /// Decodes a dialect-normalized frame.
    pub fn from_normalized(frame: &Value) -> GenAiResult<Self> {
        let usage_metadata = frame
            .get("usageMetadata")
            .map(|v| decode_field::<LiveUsageMetadata>(v, "usageMetadata"))
            .transpose()?;

        let payload = if frame.get("setupComplete").is_some() {
            LiveServerPayload::SetupComplete
        } else if let Some(v) = frame.get("serverContent") {
            LiveServerPayload::ServerContent(decode_field(v, "serverContent")?)
        } else if let Some(v) = frame.get("toolCall") {
            LiveServerPayload::ToolCall(decode_field(v, "toolCall")?)
        } else if let Some(v) = frame.get("toolCallCancellation") {
            LiveServerPayload::ToolCallCancellation(decode_field(v, "toolCallCancellation")?)
        } else if let Some(v) = frame.get("goAway") {
            LiveServerPayload::GoAway(decode_field(v, "goAway")?)
        } else if let Some(v) = frame.get("sessionResumptionUpdate") {
            LiveServerPayload::SessionResumptionUpdate(decode_field(v, "sessionResumptionUpdate")?)
        } else if usage_metadata.is_some() {
            LiveServerPayload::UsageMetadata
        } else {
            return Err(ProtocolError::MalformedFrame {
                message: format!("no recognized message key in {frame}"),
            }
            .into());
        };

        Ok(Self {
            payload,
            usage_metadata,
        })
    }

    /// Concatenated text of the model turn, if this is server content.
    pub fn text(&self) -> Option<String> {
        match &self.payload {
            LiveServerPayload::ServerContent(content) => content.model_turn.as_ref()?.text(),
            _ => None,
        }
    }

    /// True for `goAway`.
    pub fn is_go_away(&self) -> bool {
        matches!(self.payload, LiveServerPayload::GoAway(_))
    }
}

fn decode_field<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> GenAiResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        ProtocolError::MalformedFrame {
            message: format!("{key}: {e}"),
        }
        .into()
    })
}
