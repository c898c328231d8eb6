//! Authentication
//!
//! API key and bearer token authentication for the loyalty API.
//!
//! # Authentication Methods
//!
//! ## API Key (Header)
//! ```text
//! X-API-Key: your-api-key-here
//! ```
//!
//! ## Bearer Token
//! ```text
//! Authorization: Bearer your-token-here
//! ```
//!
//! # Configuration
//!
//! - `LOYALTY_AUTH_ENABLED`: Enable/disable authentication (default: false)
//! - `LOYALTY_API_KEYS` / `LOYALTY_API_KEY`: Comma-separated API keys
//! - `LOYALTY_BEARER_TOKENS`: Comma-separated bearer tokens

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether authentication is enabled
    pub enabled: bool,
    /// Accepted API keys
    pub api_keys: Vec<String>,
    /// Accepted bearer tokens
    pub bearer_tokens: Vec<String>,
    /// Paths that never require authentication
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_keys: Vec::new(),
            bearer_tokens: Vec::new(),
            public_paths: vec!["/".to_string(), "/health".to_string()],
        }
    }
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("LOYALTY_AUTH_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let api_keys: Vec<String> = std::env::var("LOYALTY_API_KEYS")
            .or_else(|_| std::env::var("LOYALTY_API_KEY"))
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        let bearer_tokens: Vec<String> = std::env::var("LOYALTY_BEARER_TOKENS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        Self {
            enabled,
            api_keys,
            bearer_tokens,
            ..Default::default()
        }
    }

    /// Check if a path is public
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path == p)
    }

    /// Check the supplied credentials
    pub fn authorize(&self, api_key: Option<&str>, bearer: Option<&str>) -> bool {
        if let Some(key) = api_key {
            if self.api_keys.iter().any(|k| k == key) {
                return true;
            }
        }
        if let Some(token) = bearer {
            if self.bearer_tokens.iter().any(|t| t == token) {
                return true;
            }
        }
        false
    }
}

/// Authentication error response body
#[derive(Serialize)]
pub struct AuthErrorResponse {
    pub code: String,
    pub message: String,
}

/// Axum middleware enforcing authentication on non-public paths
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.auth_config;
    if !config.enabled || config.is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if config.authorize(api_key, bearer) {
        return next.run(request).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            message: "Missing or invalid credentials".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> AuthConfig {
        AuthConfig {
            enabled: true,
            api_keys: vec!["key-1".to_string()],
            bearer_tokens: vec!["token-1".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_authorize_accepts_known_api_key() {
        let config = create_test_config();
        assert!(config.authorize(Some("key-1"), None));
        assert!(!config.authorize(Some("key-2"), None));
    }

    #[test]
    fn test_authorize_accepts_known_bearer_token() {
        let config = create_test_config();
        assert!(config.authorize(None, Some("token-1")));
        assert!(!config.authorize(None, None));
    }

    #[test]
    fn test_health_is_public() {
        let config = AuthConfig::default();
        assert!(config.is_public_path("/health"));
        assert!(!config.is_public_path("/transactions"));
    }
}
