//! # Accident Predictor
//!
//! Deterministic accident-risk scoring over a small feature vector: speed,
//! weather, hour of day, traffic level, and incident history at the location.
//!
//! Scoring runs in three explicit steps:
//! 1. [`RiskRequest::normalize`] fills in defaults for missing fields.
//! 2. [`RiskInput::new`] classifies the free-text fields into
//!    [`WeatherCategory`] and [`TrafficCategory`].
//! 3. [`AccidentPredictor::predict`] applies the weighted stages and clamps
//!    the result into a [`RiskResult`].

mod category;
mod input;
mod scorer;
mod weights;

pub use category::{TrafficCategory, WeatherCategory};
pub use input::{DEFAULT_TRAFFIC, DEFAULT_WEATHER, FieldValue, RiskInput, RiskRequest};
pub use scorer::{AccidentPredictor, RiskResult};
pub use weights::{RiskThresholds, ScoringProfile, ScoringWeights};
