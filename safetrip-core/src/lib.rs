//! # SafeTrip Core
//!
//! Core library for the SafeTrip driving-safety service.
//! Provides the accident-risk predictor, weather and traffic risk
//! classifiers with their upstream providers, road-safety news, the trip and
//! hazard store, request validation, configuration, and the HTTP gateway.

pub mod config;
pub mod error;
pub mod gateway;
pub mod location;
pub mod news;
pub mod predictor;
pub mod sanitize;
pub mod store;
pub mod traffic;
pub mod types;
pub mod upstream;
pub mod validate;
pub mod weather;

// Re-export commonly used types at the crate root.
pub use config::{ProvidersConfig, SafeTripConfig, load_config};
pub use error::{Result, SafeTripError};
pub use gateway::{AppState, GatewayConfig, SharedState, gateway_router, run_gateway};
pub use predictor::{AccidentPredictor, RiskInput, RiskRequest, RiskResult, ScoringProfile};
pub use store::{InMemoryTripStore, TripStore};
pub use types::{DrivingRisk, RiskLevel, Severity};
pub use upstream::Coordinates;
pub use weather::{WeatherRiskLevel, classify_driving_risk};
