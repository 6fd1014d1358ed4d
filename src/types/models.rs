//! Model metadata.
//!
//! One shape for both backends. Project-scoped responses name the version
//! `versionId` and the endpoints `deployedModels`; both are accepted on read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A base or tuned model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Resource name, e.g. `models/gemini-2.0-flash`.
    #[serde(default)]
    pub name: String,
    /// Model version.
    #[serde(skip_serializing_if = "Option::is_none", alias = "versionId")]
    pub version: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Short description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Maximum input tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_token_limit: Option<i32>,
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_token_limit: Option<i32>,
    /// Actions the model accepts (`generateContent`, `countTokens`, ...).
    #[serde(skip_serializing_if = "Option::is_none", alias = "supportedGenerationMethods")]
    pub supported_actions: Option<Vec<String>>,
    /// Deployments serving the model. Project-scoped backend only.
    #[serde(skip_serializing_if = "Option::is_none", alias = "deployedModels")]
    pub endpoints: Option<Vec<Endpoint>>,
    /// User labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Deployment of a model behind an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint resource name.
    #[serde(skip_serializing_if = "Option::is_none", alias = "endpoint")]
    pub name: Option<String>,
    /// Id of the deployment within the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_model_id: Option<String>,
}
