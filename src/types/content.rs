//! Conversation content: role-tagged turns made of parts.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One part of a turn.
///
/// Parts are matched by the key they carry. Anything unrecognized, including an
/// empty object, is kept verbatim as [`Part::Other`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content.
    Text {
        /// The text content.
        text: String,
        /// Marks model reasoning output.
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Inline binary data.
    InlineData {
        /// The inline data blob.
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Reference to uploaded file data.
    FileData {
        /// The file data reference.
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    /// A function call requested by the model.
    FunctionCall {
        /// The function call details.
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    /// A function result sent back to the model.
    FunctionResponse {
        /// The function response details.
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    /// Code produced by the model for execution.
    ExecutableCode {
        /// The executable code details.
        #[serde(rename = "executableCode")]
        executable_code: ExecutableCode,
    },
    /// Outcome of executing model-produced code.
    CodeExecutionResult {
        /// The code execution result details.
        #[serde(rename = "codeExecutionResult")]
        code_execution_result: CodeExecutionResult,
    },
    /// Any other part shape.
    Other(Value),
}

impl Part {
    /// Text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }

    /// Inline data part from raw bytes.
    pub fn inline_bytes(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Part::InlineData {
            inline_data: Blob::from_bytes(mime_type, data),
        }
    }

    /// Function response part.
    pub fn function_response(response: FunctionResponse) -> Self {
        Part::FunctionResponse {
            function_response: response,
        }
    }

    /// Text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// True for parts that carry nothing: an empty object or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Part::Text { text, .. } => text.is_empty(),
            Part::Other(Value::Object(map)) => map.is_empty(),
            Part::Other(Value::Null) => true,
            _ => false,
        }
    }
}

/// Binary data with its MIME type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// The MIME type of the data.
    pub mime_type: String,
    /// Base64-encoded data.
    pub data: String,
}

impl Blob {
    /// Encodes raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }

    /// Decodes the payload.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }
}

/// Reference to an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// The URI of the file.
    pub file_uri: String,
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Correlation id, echoed back in the matching response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The name of the function to call.
    pub name: String,
    /// The arguments to pass to the function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// The result of a function call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    /// Id of the call this answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The name of the function that was called.
    pub name: String,
    /// The response data from the function.
    pub response: Value,
}

impl FunctionResponse {
    /// Response without a correlation id.
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            response,
        }
    }

    /// Sets the correlation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Code produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutableCode {
    /// The programming language of the code.
    pub language: String,
    /// The code to execute.
    pub code: String,
}

/// The result of code execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeExecutionResult {
    /// The outcome of the execution.
    pub outcome: String,
    /// The output from the execution, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// A role-tagged turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Content {
    /// The role of the content author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// The parts of the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Turn with the given role and parts.
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role),
            parts,
        }
    }

    /// User turn with one text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// Model turn with one text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Model turn without parts, recorded when a response carried no usable output.
    pub fn empty_model() -> Self {
        Self::new(Role::Model, Vec::new())
    }

    /// True when the turn has at least one part and none of them is empty.
    pub fn is_valid(&self) -> bool {
        !self.parts.is_empty() && !self.parts.iter().any(Part::is_empty)
    }

    /// Concatenated text of all text parts, if any.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self.parts.iter().filter_map(Part::as_text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// True when the turn is tagged with `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::user(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::user(text)
    }
}

impl From<Vec<Part>> for Content {
    fn from(parts: Vec<Part>) -> Self {
        Content::new(Role::User, parts)
    }
}

/// The author of a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User role.
    User,
    /// Model role.
    Model,
    /// System role, only valid for system instructions.
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Model => "model",
            Role::System => "system",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_wire_names() {
        let part = Part::FunctionCall {
            function_call: FunctionCall {
                id: Some("call-1".to_string()),
                name: "lookup".to_string(),
                args: Some(json!({"q": "x"})),
            },
        };

        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"functionCall": {"id": "call-1", "name": "lookup", "args": {"q": "x"}}})
        );
    }

    #[test]
    fn test_unknown_part_kept() {
        let part: Part = serde_json::from_value(json!({"videoMetadata": {"fps": 2}})).unwrap();
        assert!(matches!(part, Part::Other(_)));
        assert!(!part.is_empty());

        let empty: Part = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_content_validity() {
        assert!(Content::model("hi").is_valid());
        assert!(!Content::empty_model().is_valid());
        assert!(!Content::model("").is_valid());
        assert!(!Content::new(Role::Model, vec![Part::text("a"), Part::Other(json!({}))]).is_valid());
    }

    #[test]
    fn test_blob_round_trip() {
        let blob = Blob::from_bytes("audio/pcm", &[1, 2, 3]);
        assert_eq!(blob.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_content_without_parts_deserializes() {
        let content: Content = serde_json::from_value(json!({"role": "model"})).unwrap();
        assert_eq!(content.role, Some(Role::Model));
        assert!(content.parts.is_empty());
    }
}
