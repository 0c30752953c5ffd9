//! Fixed-window rate limiting keyed by client address.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use super::RateLimitConfig;
use super::error::ApiError;
use super::state::SharedState;

/// Sweep expired windows once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets.
    pub reset_secs: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.max_requests > 0
    }

    /// Count one request from `key`.
    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let window_len = Duration::from_secs(self.config.window_secs);
        let limit = self.config.max_requests;
        let mut windows = self.windows.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let allowed = window.count < limit;
        if allowed {
            window.count += 1;
        }
        let elapsed = now.duration_since(window.started);
        RateDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_secs: window_len.saturating_sub(elapsed).as_secs(),
        }
    }
}

/// Identify the caller: socket address, then `X-Forwarded-For`, then a shared bucket.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    forwarded_for(request.headers()).unwrap_or_else(|| "anonymous".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn set_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(decision.reset_secs));
}

/// Middleware rejecting callers that exceed their budget with 429.
pub(crate) async fn enforce(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let limiter = &state.limiter;
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let decision = limiter.check(&key).await;
    if !decision.allowed {
        warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        let minutes = (limiter.config().window_secs / 60).max(1);
        let mut response = ApiError::TooManyRequests(format!(
            "Too many requests from this IP, please try again after {minutes} minutes"
        ))
        .into_response();
        set_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    set_headers(response.headers_mut(), &decision);
    response
}
