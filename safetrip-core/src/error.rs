//! Error types for the SafeTrip core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering configuration, upstream data providers, request validation,
//! and the trip store. The accident predictor itself is total and never
//! produces an error.

/// Top-level error type for the SafeTrip core library.
#[derive(Debug, thiserror::Error)]
pub enum SafeTripError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors from upstream weather, traffic, and news providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} returned status {status}")]
    Status { provider: String, status: u16 },

    #[error("{provider} response parse error: {message}")]
    ResponseParse { provider: String, message: String },

    #[error("{provider} returned no route data")]
    NoRoute { provider: String },
}

impl ProviderError {
    /// Build a request error from a `reqwest` failure.
    pub fn request(provider: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status {
                provider: provider.to_string(),
                status: status.as_u16(),
            };
        }
        Self::Request {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}

/// A request payload failed schema validation.
///
/// Every failing field is collected before the error is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {}", .details.join(", "))]
pub struct ValidationError {
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn new(details: Vec<String>) -> Self {
        Self { details }
    }
}

/// Errors from the trip and hazard store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

/// A type alias for results using the top-level `SafeTripError`.
pub type Result<T> = std::result::Result<T, SafeTripError>;
