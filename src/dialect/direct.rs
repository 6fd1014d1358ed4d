use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use super::{
    is_bare, require_name, translate_server_message_with, translate_setup_common, websocket_base,
    Dialect, ResourceKind, ServerMessageRules,
};
use crate::config::{Backend, HttpOptions};
use crate::error::{ConfigurationError, GenAiResult, RequestError};
use crate::path::{get_value_by_path, parse_path};
use crate::transport::RequestDescriptor;

const RULES: ServerMessageRules = ServerMessageRules {
    response_token_count_key: "responseTokenCount",
    function_call_ids: true,
};

/// Dialect of the API-key service.
#[derive(Debug, Clone, Default)]
pub struct DirectDialect;

impl DirectDialect {
    /// Create the direct dialect.
    pub fn new() -> Self {
        Self
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") || model.starts_with("tunedModels/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }
}

impl Dialect for DirectDialect {
    fn backend(&self) -> Backend {
        Backend::Direct
    }

    fn resolve_resource_name(&self, name: &str, kind: ResourceKind) -> GenAiResult<String> {
        require_name(name, kind)?;
        Ok(match kind {
            ResourceKind::Model => Self::model_name(name),
            _ if is_bare(name, kind.collection()) => format!("{}/{name}", kind.collection()),
            _ => name.to_string(),
        })
    }

    fn qualified_model_name(&self, model: &str) -> GenAiResult<String> {
        self.resolve_resource_name(model, ResourceKind::Model)
    }

    fn resource_prefix(&self, _descriptor: &RequestDescriptor, _has_api_key: bool) -> Option<String> {
        None
    }

    fn live_url(&self, options: &HttpOptions, api_key: Option<&SecretString>) -> GenAiResult<Url> {
        let api_key = api_key.ok_or(ConfigurationError::MissingApiKey)?;
        let version = options.api_version.as_deref().unwrap_or_default();
        let mut url = Url::parse(&format!(
            "{}/ws/google.ai.generativelanguage.{version}.GenerativeService.BidiGenerateContent",
            websocket_base(options)?
        ))?;
        url.query_pairs_mut().append_pair("key", api_key.expose_secret());
        Ok(url)
    }

    fn translate_live_setup(&self, model: &str, config: &Value) -> GenAiResult<Value> {
        if get_value_by_path(config, &parse_path(&["sessionResumption", "transparent"])).is_some() {
            return Err(RequestError::InvalidParameter {
                parameter: "sessionResumption.transparent".to_string(),
                message: "transparent parameter is not supported in Gemini API.".to_string(),
            }
            .into());
        }
        translate_setup_common(self.qualified_model_name(model)?, config)
    }

    fn translate_server_message(&self, frame: &Value) -> GenAiResult<Value> {
        translate_server_message_with(frame, &RULES)
    }

    fn requires_function_response_id(&self) -> bool {
        true
    }

    fn supports_files(&self) -> bool {
        true
    }

    fn model_list_path(&self) -> &'static str {
        "models"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_model_names() {
        let dialect = DirectDialect::new();
        let resolve = |n| dialect.resolve_resource_name(n, ResourceKind::Model).unwrap();

        assert_eq!(resolve("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(resolve("models/gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(resolve("tunedModels/my-tune"), "tunedModels/my-tune");
    }

    #[test]
    fn test_collection_names() {
        let dialect = DirectDialect::new();

        assert_eq!(
            dialect.resolve_resource_name("abc", ResourceKind::CachedContent).unwrap(),
            "cachedContents/abc"
        );
        assert_eq!(dialect.resolve_resource_name("files/f1", ResourceKind::File).unwrap(), "files/f1");
        assert_eq!(dialect.resolve_resource_name("f1", ResourceKind::File).unwrap(), "files/f1");
    }

    #[test]
    fn test_empty_name_rejected() {
        let dialect = DirectDialect::new();
        assert!(dialect.resolve_resource_name("", ResourceKind::Model).is_err());
    }

    #[test]
    fn test_never_prefixes_resource_path() {
        let dialect = DirectDialect::new();
        let descriptor = RequestDescriptor::post("models/x:generateContent", json!({}));
        assert_eq!(dialect.resource_prefix(&descriptor, false), None);
    }

    #[test]
    fn test_live_url_carries_key() {
        let dialect = DirectDialect::new();
        let options = HttpOptions::new()
            .with_base_url("https://generativelanguage.googleapis.com/")
            .with_api_version("v1beta");

        let url = dialect.live_url(&options, Some(&SecretString::new("k".into()))).unwrap();

        assert_eq!(
            url.as_str(),
            "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent?key=k"
        );
        assert!(dialect.live_url(&options, None).is_err());
    }

    #[test]
    fn test_setup_rejects_transparent_resumption() {
        let dialect = DirectDialect::new();
        let config = json!({"sessionResumption": {"handle": "h", "transparent": true}});
        assert!(dialect.translate_live_setup("gemini", &config).is_err());
    }

    #[test]
    fn test_setup_has_no_default_modality() {
        let dialect = DirectDialect::new();
        let setup = dialect.translate_live_setup("gemini", &json!({})).unwrap();
        assert_eq!(setup, json!({"setup": {"model": "models/gemini"}}));
    }

    #[test]
    fn test_function_call_ids_kept() {
        let dialect = DirectDialect::new();
        let frame = json!({"toolCall": {"functionCalls": [{"id": "c1", "name": "f", "args": {"x": 1}}]}});

        let message = dialect.translate_server_message(&frame).unwrap();

        assert_eq!(message["toolCall"]["functionCalls"][0]["id"], "c1");
    }
}
