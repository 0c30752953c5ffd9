//! # HTTP Gateway
//!
//! JSON REST API for the SafeTrip client: accident prediction, weather,
//! traffic and news proxies, live location checks, trips and hazard reports.
//! Supports bearer-token authentication, per-client rate limiting, a body
//! size cap, and a CORS allow-list.

mod auth;
mod error;
mod handlers;
mod rate_limit;
mod server;
mod state;

pub use auth::{Authenticated, GatewayAuth};
pub use error::ApiError;
pub use handlers::{AlertEntry, ExternalAlert};
pub use rate_limit::{RateDecision, RateLimiter};
pub use server::{router as gateway_router, run as run_gateway, serve};
pub use state::{AppState, SharedState};

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

/// Fixed-window request budget per client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window (0 disables limiting).
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Valid bearer tokens. Empty means any bearer token is accepted.
    pub auth_tokens: Vec<String>,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Maximum request body size.
    pub body_limit_bytes: usize,
    pub rate_limit: RateLimitConfig,
    /// Stored hazards included in `/api/alerts`.
    pub hazard_feed_limit: usize,
    /// Location fixes kept in memory.
    pub location_history_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            auth_tokens: Vec::new(),
            allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            body_limit_bytes: 10 * 1024,
            rate_limit: RateLimitConfig::default(),
            hazard_feed_limit: 10,
            location_history_limit: 10_000,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.host.trim().is_empty() {
            problems.push("gateway.host must not be empty".to_string());
        }
        if self.port == 0 {
            problems.push("gateway.port must be non-zero".to_string());
        }
        if self.body_limit_bytes == 0 {
            problems.push("gateway.body_limit_bytes must be greater than zero".to_string());
        }
        if self.rate_limit.max_requests > 0 && self.rate_limit.window_secs == 0 {
            problems.push("gateway.rate_limit.window_secs must be greater than zero".to_string());
        }
        for origin in &self.allowed_origins {
            if HeaderValue::from_str(origin).is_err() {
                problems.push(format!("gateway.allowed_origins contains invalid origin '{origin}'"));
            }
        }
        problems
    }
}
