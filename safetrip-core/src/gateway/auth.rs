//! Gateway authentication.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::GatewayConfig;
use super::error::ApiError;
use super::state::SharedState;

/// Bearer-token validation for the write endpoints.
#[derive(Debug, Clone)]
pub struct GatewayAuth {
    valid_tokens: Vec<String>,
}

impl GatewayAuth {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            valid_tokens: config.auth_tokens.clone(),
        }
    }

    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            valid_tokens: tokens,
        }
    }

    /// Validate a token.
    ///
    /// If no tokens are configured, all tokens are accepted (open mode).
    pub fn validate(&self, token: &str) -> bool {
        if self.valid_tokens.is_empty() {
            return true;
        }
        self.valid_tokens.iter().any(|t| t == token)
    }

    pub fn token_count(&self) -> usize {
        self.valid_tokens.len()
    }

    /// Whether any bearer token is accepted.
    pub fn is_open_mode(&self) -> bool {
        self.valid_tokens.is_empty()
    }
}

/// The token from an `Authorization: Bearer <token>` header. Empty tokens count as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let rest = value.strip_prefix("Bearer ")?;
    rest.split(' ').next().filter(|t| !t.is_empty())
}

/// Extractor that admits only requests carrying a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
}

impl FromRequestParts<SharedState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            warn!(path = %parts.uri.path(), "Request without bearer token");
            return Err(ApiError::Unauthorized("No token provided"));
        };
        if !state.auth.validate(token) {
            warn!(path = %parts.uri.path(), "Request with invalid bearer token");
            return Err(ApiError::Unauthorized("Invalid or expired token"));
        }
        if state.auth.is_open_mode() {
            debug!("Open auth mode, accepting bearer token");
        }
        Ok(Self {
            token: token.to_string(),
        })
    }
}
