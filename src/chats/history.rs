//! History validation and curation.

use crate::error::{GenAiResult, RequestError};
use crate::types::{Content, Role};

/// Checks a caller-supplied history: it must open with a user turn and every
/// turn must be tagged `user` or `model`.
pub fn validate_history(history: &[Content]) -> GenAiResult<()> {
    let Some(first) = history.first() else {
        return Ok(());
    };
    if !first.has_role(Role::User) {
        return Err(RequestError::InvalidHistory {
            message: "History must start with a user turn.".to_string(),
        }
        .into());
    }
    for content in history {
        if !content.has_role(Role::User) && !content.has_role(Role::Model) {
            let role = content.role.map_or_else(|| "none".to_string(), |r| r.to_string());
            return Err(RequestError::InvalidHistory {
                message: format!("Role must be user or model, but got {role}."),
            }
            .into());
        }
    }
    Ok(())
}

/// Derives the history sent with the next request.
///
/// Each run of consecutive model turns is kept, together with the user turn
/// before it, only when every turn in the run is valid.
pub fn extract_curated_history(comprehensive: &[Content]) -> Vec<Content> {
    let Some(first) = comprehensive.first() else {
        return Vec::new();
    };

    let mut curated = Vec::with_capacity(comprehensive.len());
    let mut user_input = first;
    let mut i = 0;
    while i < comprehensive.len() {
        if comprehensive[i].has_role(Role::User) {
            user_input = &comprehensive[i];
            i += 1;
            continue;
        }

        let start = i;
        while i < comprehensive.len() && comprehensive[i].has_role(Role::Model) {
            i += 1;
        }
        if i == start {
            // Neither user nor model; validation rejects these up front.
            i += 1;
            continue;
        }

        let model_output = &comprehensive[start..i];
        if model_output.iter().all(Content::is_valid) {
            curated.push(user_input.clone());
            curated.extend_from_slice(model_output);
        }
    }
    curated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_curated_drops_invalid_exchange() {
        let history = vec![
            Content::user("A"),
            Content::empty_model(),
            Content::user("B"),
            Content::model("valid"),
        ];

        let curated = extract_curated_history(&history);

        assert_eq!(curated, vec![Content::user("B"), Content::model("valid")]);
    }

    #[test]
    fn test_curated_requires_every_model_turn_valid() {
        let history = vec![
            Content::user("A"),
            Content::model("first"),
            Content::model(""),
        ];

        assert!(extract_curated_history(&history).is_empty());
    }

    #[test]
    fn test_curated_keeps_valid_history() {
        let history = vec![
            Content::user("A"),
            Content::model("a"),
            Content::user("B"),
            Content::model("b1"),
            Content::model("b2"),
        ];

        assert_eq!(extract_curated_history(&history), history);
    }

    #[test]
    fn test_validate_history() {
        assert!(validate_history(&[]).is_ok());
        assert!(validate_history(&[Content::user("a"), Content::model("b")]).is_ok());

        let error = validate_history(&[Content::model("b")]).unwrap_err();
        assert!(error.to_string().contains("History must start with a user turn."));

        let system = Content::new(Role::System, vec![]);
        let error = validate_history(&[Content::user("a"), system]).unwrap_err();
        assert!(error.to_string().contains("Role must be user or model, but got system."));
    }
}
