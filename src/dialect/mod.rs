//! Backend dialects.
//!
//! The two backends disagree on resource addressing, URL layout, the live socket
//! endpoint and a handful of wire fields. Everything that differs lives behind the
//! [`Dialect`] trait; the rest of the crate only talks to that trait.

mod direct;
mod project_scoped;

pub use direct::DirectDialect;
pub use project_scoped::ProjectScopedDialect;

use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{json, Value};
use url::Url;

use crate::config::{Backend, GenAiConfig, HttpOptions};
use crate::error::{ConfigurationError, GenAiResult, RequestError};
use crate::path::{get_value_by_path, parse_path, set_value_by_path};
use crate::transport::RequestDescriptor;

/// Kind of resource a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A model (`models/...`, `publishers/.../models/...`).
    Model,
    /// A cached content entry (`cachedContents/...`).
    CachedContent,
    /// An uploaded file (`files/...`).
    File,
}

impl ResourceKind {
    /// Collection segment used when prefixing bare names.
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Model => "models",
            ResourceKind::CachedContent => "cachedContents",
            ResourceKind::File => "files",
        }
    }
}

/// Backend-specific addressing and wire translation.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Backend this dialect speaks.
    fn backend(&self) -> Backend;

    /// Normalizes a resource name. Applying it to its own output is a no-op.
    fn resolve_resource_name(&self, name: &str, kind: ResourceKind) -> GenAiResult<String>;

    /// Fully qualified model name, used where the backend needs the complete path
    /// (cache creation and live setup).
    fn qualified_model_name(&self, model: &str) -> GenAiResult<String>;

    /// `projects/{p}/locations/{l}` segment to insert between version and path, if any.
    fn resource_prefix(&self, descriptor: &RequestDescriptor, has_api_key: bool) -> Option<String>;

    /// WebSocket endpoint for live sessions.
    fn live_url(&self, options: &HttpOptions, api_key: Option<&SecretString>) -> GenAiResult<Url>;

    /// Builds the live `setup` client message from a camelCase connect config.
    fn translate_live_setup(&self, model: &str, config: &Value) -> GenAiResult<Value>;

    /// Normalizes one inbound live frame.
    fn translate_server_message(&self, frame: &Value) -> GenAiResult<Value>;

    /// Whether tool responses must echo the function call id.
    fn requires_function_response_id(&self) -> bool;

    /// Whether the files API (upload, get, list, delete) is available.
    fn supports_files(&self) -> bool;

    /// Path used to list base models.
    fn model_list_path(&self) -> &'static str;

    /// Joins base URL, version, resource prefix and path, then appends query parameters.
    fn build_url(
        &self,
        options: &HttpOptions,
        descriptor: &RequestDescriptor,
        has_api_key: bool,
    ) -> GenAiResult<Url> {
        let base_url = options
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigurationError::InvalidConfiguration {
                message: "base URL is not set".to_string(),
            })?;

        let mut elements = vec![base_url.trim_end_matches('/')];
        if let Some(version) = options.api_version.as_deref().filter(|v| !v.is_empty()) {
            elements.push(version);
        }
        let prefix = self.resource_prefix(descriptor, has_api_key);
        if let Some(prefix) = prefix.as_deref() {
            elements.push(prefix);
        }
        if !descriptor.path.is_empty() {
            elements.push(&descriptor.path);
        }

        let mut url = Url::parse(&elements.join("/"))?;
        for (key, value) in &descriptor.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

/// Picks the dialect for a configuration.
pub fn for_config(config: &GenAiConfig) -> Arc<dyn Dialect> {
    match config.backend {
        Backend::Direct => Arc::new(DirectDialect::new()),
        Backend::ProjectScoped => Arc::new(ProjectScopedDialect::new(
            config.project.clone(),
            config.location.clone(),
        )),
    }
}

/// Rejects empty names before any prefixing.
fn require_name(name: &str, kind: ResourceKind) -> GenAiResult<()> {
    if name.trim().is_empty() {
        return Err(RequestError::InvalidParameter {
            parameter: kind.collection().to_string(),
            message: "name is required and must be a non-empty string".to_string(),
        }
        .into());
    }
    Ok(())
}

/// True for a single-segment name, which is the only form that gets a collection prefix.
fn is_bare(name: &str, collection: &str) -> bool {
    !name.starts_with(&format!("{collection}/")) && !name.contains('/')
}

/// WebSocket base: the HTTP base URL with its scheme switched and trailing slash removed.
fn websocket_base(options: &HttpOptions) -> GenAiResult<String> {
    let base_url = options
        .base_url
        .as_deref()
        .ok_or_else(|| ConfigurationError::InvalidConfiguration {
            message: "base URL is not set".to_string(),
        })?;
    let mut url = Url::parse(base_url)?;
    url.set_scheme("wss").map_err(|()| ConfigurationError::InvalidBaseUrl {
        url: base_url.to_string(),
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Copies `from` in `source` to `to` in `target` when present.
fn copy_field(source: &Value, from: &[&str], target: &mut Value, to: &[&str]) -> GenAiResult<()> {
    if let Some(value) = get_value_by_path(source, &parse_path(from)) {
        if !value.is_null() {
            set_value_by_path(target, &parse_path(to), value)?;
        }
    }
    Ok(())
}

/// Setup fields shared by both dialects, with the generation fields folded into
/// `generationConfig`.
fn translate_setup_common(model: String, config: &Value) -> GenAiResult<Value> {
    let mut message = json!({});
    set_value_by_path(&mut message, &parse_path(&["setup", "model"]), Value::String(model))?;

    copy_field(config, &["generationConfig"], &mut message, &["setup", "generationConfig"])?;
    copy_field(
        config,
        &["responseModalities"],
        &mut message,
        &["setup", "generationConfig", "responseModalities"],
    )?;
    copy_field(
        config,
        &["speechConfig"],
        &mut message,
        &["setup", "generationConfig", "speechConfig"],
    )?;
    for field in [
        "systemInstruction",
        "tools",
        "sessionResumption",
        "contextWindowCompression",
        "realtimeInputConfig",
    ] {
        copy_field(config, &[field], &mut message, &["setup", field])?;
    }
    Ok(message)
}

/// Top-level keys of an inbound live frame.
const SERVER_MESSAGE_KEYS: [&str; 7] = [
    "setupComplete",
    "serverContent",
    "toolCall",
    "toolCallCancellation",
    "goAway",
    "sessionResumptionUpdate",
    "usageMetadata",
];

/// Server message translation rules that vary between dialects.
struct ServerMessageRules {
    /// Source key for the response token count in usage metadata.
    response_token_count_key: &'static str,
    /// Whether function calls keep their `id`.
    function_call_ids: bool,
}

fn translate_server_message_with(frame: &Value, rules: &ServerMessageRules) -> GenAiResult<Value> {
    let mut message = json!({});

    for field in ["modelTurn", "turnComplete", "interrupted", "generationComplete", "groundingMetadata"] {
        copy_field(frame, &["serverContent", field], &mut message, &["serverContent", field])?;
    }
    if let Some(Value::Array(calls)) = get_value_by_path(frame, &parse_path(&["toolCall", "functionCalls"])) {
        let mut translated = Vec::with_capacity(calls.len());
        for call in &calls {
            let mut out = json!({});
            if rules.function_call_ids {
                copy_field(call, &["id"], &mut out, &["id"])?;
            }
            copy_field(call, &["name"], &mut out, &["name"])?;
            copy_field(call, &["args"], &mut out, &["args"])?;
            translated.push(out);
        }
        set_value_by_path(
            &mut message,
            &parse_path(&["toolCall", "functionCalls"]),
            Value::Array(translated),
        )?;
    }

    copy_field(frame, &["toolCallCancellation", "ids"], &mut message, &["toolCallCancellation", "ids"])?;
    copy_field(frame, &["goAway", "timeLeft"], &mut message, &["goAway", "timeLeft"])?;

    for field in ["newHandle", "resumable", "lastConsumedClientMessageIndex"] {
        copy_field(
            frame,
            &["sessionResumptionUpdate", field],
            &mut message,
            &["sessionResumptionUpdate", field],
        )?;
    }

    for field in [
        "promptTokenCount",
        "cachedContentTokenCount",
        "toolUsePromptTokenCount",
        "thoughtsTokenCount",
        "totalTokenCount",
        "promptTokensDetails",
        "cacheTokensDetails",
        "responseTokensDetails",
        "toolUsePromptTokensDetails",
    ] {
        copy_field(frame, &["usageMetadata", field], &mut message, &["usageMetadata", field])?;
    }
    copy_field(
        frame,
        &["usageMetadata", rules.response_token_count_key],
        &mut message,
        &["usageMetadata", "responseTokenCount"],
    )?;

    // Keys whose payload carried nothing translatable still mark the message kind.
    for key in SERVER_MESSAGE_KEYS {
        if frame.get(key).is_some() && message.get(key).is_none() {
            set_value_by_path(&mut message, &parse_path(&[key]), json!({}))?;
        }
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_url_joins_elements() {
        let dialect = DirectDialect::new();
        let options = HttpOptions::new()
            .with_base_url("https://example.com/")
            .with_api_version("v1beta");
        let descriptor = RequestDescriptor::post("models/gemini:generateContent", json!({}))
            .with_query("alt", "sse");

        let url = dialect.build_url(&options, &descriptor, true).unwrap();

        assert_eq!(url.as_str(), "https://example.com/v1beta/models/gemini:generateContent?alt=sse");
    }

    #[test]
    fn test_build_url_empty_version_and_path() {
        let dialect = DirectDialect::new();
        let options = HttpOptions::new()
            .with_base_url("https://upload.example.com/upload?upload_id=abc")
            .with_api_version("");
        let descriptor = RequestDescriptor::post_bytes("", bytes::Bytes::from_static(b"x"));

        let url = dialect.build_url(&options, &descriptor, true).unwrap();

        assert_eq!(url.as_str(), "https://upload.example.com/upload?upload_id=abc");
    }

    #[test]
    fn test_translate_server_message_keeps_known_keys() {
        let rules = ServerMessageRules {
            response_token_count_key: "responseTokenCount",
            function_call_ids: true,
        };
        let frame = json!({
            "serverContent": {"turnComplete": true, "unknown": 1},
            "usageMetadata": {"totalTokenCount": 7, "responseTokenCount": 3}
        });

        let message = translate_server_message_with(&frame, &rules).unwrap();

        assert_eq!(
            message,
            json!({
                "serverContent": {"turnComplete": true},
                "usageMetadata": {"totalTokenCount": 7, "responseTokenCount": 3}
            })
        );
    }

    #[test]
    fn test_translate_server_message_empty_markers() {
        let rules = ServerMessageRules {
            response_token_count_key: "responseTokenCount",
            function_call_ids: true,
        };
        let message = translate_server_message_with(&json!({"setupComplete": {}}), &rules).unwrap();
        assert_eq!(message, json!({"setupComplete": {}}));

        let message = translate_server_message_with(&json!({"goAway": {}}), &rules).unwrap();
        assert_eq!(message, json!({"goAway": {}}));
    }
}
