use secrecy::SecretString;
use serde_json::{json, Value};
use url::Url;

use super::{
    is_bare, require_name, translate_server_message_with, translate_setup_common, websocket_base,
    Dialect, ResourceKind, ServerMessageRules,
};
use crate::config::{Backend, HttpOptions};
use crate::error::GenAiResult;
use crate::path::{get_value_by_path, parse_path, set_value_by_path};
use crate::transport::{HttpMethod, RequestDescriptor};

const RULES: ServerMessageRules = ServerMessageRules {
    response_token_count_key: "candidatesTokenCount",
    function_call_ids: false,
};

/// Dialect of the cloud service scoped to a project and location.
#[derive(Debug, Clone, Default)]
pub struct ProjectScopedDialect {
    project: Option<String>,
    location: Option<String>,
}

impl ProjectScopedDialect {
    /// Create the dialect. Without both project and location, names are not
    /// qualified with a resource path.
    pub fn new(project: Option<String>, location: Option<String>) -> Self {
        Self { project, location }
    }

    fn resource_path(&self) -> Option<String> {
        match (&self.project, &self.location) {
            (Some(project), Some(location)) => Some(format!("projects/{project}/locations/{location}")),
            _ => None,
        }
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("publishers/") || model.starts_with("projects/") || model.starts_with("models/") {
            return model.to_string();
        }
        match model.split_once('/') {
            Some((publisher, name)) if !name.contains('/') => format!("publishers/{publisher}/models/{name}"),
            Some(_) => model.to_string(),
            None => format!("publishers/google/models/{model}"),
        }
    }
}

impl Dialect for ProjectScopedDialect {
    fn backend(&self) -> Backend {
        Backend::ProjectScoped
    }

    fn resolve_resource_name(&self, name: &str, kind: ResourceKind) -> GenAiResult<String> {
        require_name(name, kind)?;
        if kind == ResourceKind::Model {
            return Ok(Self::model_name(name));
        }

        let collection = kind.collection();
        let Some(resource_path) = self.resource_path() else {
            return Ok(if is_bare(name, collection) {
                format!("{collection}/{name}")
            } else {
                name.to_string()
            });
        };

        Ok(if name.starts_with("projects/") {
            name.to_string()
        } else if name.starts_with("locations/") {
            format!("projects/{}/{name}", self.project.as_deref().unwrap_or_default())
        } else if name.starts_with(&format!("{collection}/")) {
            format!("{resource_path}/{name}")
        } else if is_bare(name, collection) {
            format!("{resource_path}/{collection}/{name}")
        } else {
            name.to_string()
        })
    }

    fn qualified_model_name(&self, model: &str) -> GenAiResult<String> {
        let model = self.resolve_resource_name(model, ResourceKind::Model)?;
        let Some(resource_path) = self.resource_path() else {
            return Ok(model);
        };
        Ok(if model.starts_with("publishers/") {
            format!("{resource_path}/{model}")
        } else if model.starts_with("models/") {
            format!("{resource_path}/publishers/google/{model}")
        } else {
            model
        })
    }

    fn resource_prefix(&self, descriptor: &RequestDescriptor, has_api_key: bool) -> Option<String> {
        if has_api_key || descriptor.path.starts_with("projects/") {
            return None;
        }
        if descriptor.method == HttpMethod::Get && descriptor.path.starts_with("publishers/google/models") {
            return None;
        }
        self.resource_path()
    }

    fn live_url(&self, options: &HttpOptions, _api_key: Option<&SecretString>) -> GenAiResult<Url> {
        let version = options.api_version.as_deref().unwrap_or_default();
        Ok(Url::parse(&format!(
            "{}/ws/google.cloud.aiplatform.{version}.LlmBidiService/BidiGenerateContent",
            websocket_base(options)?
        ))?)
    }

    fn translate_live_setup(&self, model: &str, config: &Value) -> GenAiResult<Value> {
        let mut message = translate_setup_common(self.qualified_model_name(model)?, config)?;
        let modalities = parse_path(&["setup", "generationConfig", "responseModalities"]);
        if get_value_by_path(&message, &modalities).is_none() {
            set_value_by_path(&mut message, &modalities, json!(["AUDIO"]))?;
        }
        Ok(message)
    }

    fn translate_server_message(&self, frame: &Value) -> GenAiResult<Value> {
        translate_server_message_with(frame, &RULES)
    }

    fn requires_function_response_id(&self) -> bool {
        false
    }

    fn supports_files(&self) -> bool {
        false
    }

    fn model_list_path(&self) -> &'static str {
        "publishers/google/models"
    }
}
