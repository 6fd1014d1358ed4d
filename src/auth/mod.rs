//! Credential injection.
//!
//! The client never negotiates credentials. It hands the outgoing header map to an
//! [`AuthManager`], which adds whatever the backend expects.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::GenAiConfig;
use crate::error::{ConfigurationError, GenAiResult};

/// Header carrying the API key for the direct backend.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Standard authorization header.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Adds credentials to outgoing requests.
#[async_trait]
pub trait AuthManager: Send + Sync {
    /// Adds credential headers. Existing headers of the same name are left untouched.
    async fn add_auth_headers(&self, headers: &mut HashMap<String, String>) -> GenAiResult<()>;
}

/// Case-insensitive header presence check.
pub fn has_header(headers: &HashMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

/// API key authentication manager.
#[derive(Clone)]
pub struct ApiKeyAuthManager {
    api_key: SecretString,
}

impl ApiKeyAuthManager {
    /// Create a new API key auth manager.
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Create from config.
    pub fn from_config(config: &GenAiConfig) -> GenAiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ConfigurationError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl AuthManager for ApiKeyAuthManager {
    async fn add_auth_headers(&self, headers: &mut HashMap<String, String>) -> GenAiResult<()> {
        if !has_header(headers, API_KEY_HEADER) {
            headers.insert(API_KEY_HEADER.to_string(), self.api_key.expose_secret().to_string());
        }
        Ok(())
    }
}

/// Pre-minted bearer token, for the project-scoped backend.
#[derive(Clone)]
pub struct BearerTokenAuthManager {
    token: SecretString,
}

impl BearerTokenAuthManager {
    /// Create from an access token obtained elsewhere.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthManager for BearerTokenAuthManager {
    async fn add_auth_headers(&self, headers: &mut HashMap<String, String>) -> GenAiResult<()> {
        if !has_header(headers, AUTHORIZATION_HEADER) {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", self.token.expose_secret()),
            );
        }
        Ok(())
    }
}
