//! Safety settings and ratings.
//!
//! Categories, thresholds and probabilities are kept as the wire strings
//! (`HARM_CATEGORY_HARASSMENT`, `BLOCK_ONLY_HIGH`, ...). The two backends do not
//! share one closed set of values, and both are relayed unchanged.

use serde::{Deserialize, Serialize};

/// Blocking threshold for one harm category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    /// Harm category, e.g. `HARM_CATEGORY_DANGEROUS_CONTENT`.
    pub category: String,
    /// Threshold, e.g. `BLOCK_MEDIUM_AND_ABOVE`.
    pub threshold: String,
    /// Whether the threshold applies to probability or severity.
    /// Project-scoped backend only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl SafetySetting {
    /// Setting for `category` at `threshold`.
    pub fn new(category: impl Into<String>, threshold: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            threshold: threshold.into(),
            method: None,
        }
    }

    /// Sets the blocking method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// Safety rating attached to a candidate or prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    /// Harm category.
    #[serde(default)]
    pub category: String,
    /// Probability bucket, e.g. `NEGLIGIBLE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
    /// Raw probability score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_score: Option<f32>,
    /// Severity bucket. Project-scoped backend only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Raw severity score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<f32>,
    /// True when this rating caused the content to be withheld.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
}
