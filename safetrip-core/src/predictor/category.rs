//! Canonical categories for the free-text weather and traffic inputs.
//!
//! Raw strings are classified once, before scoring, so the scorer only ever
//! branches on enums.

use serde::{Deserialize, Serialize};

/// Weather condition as seen by the accident predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCategory {
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Fog,
    Mist,
    /// Anything outside the adverse vocabulary (Clear, Clouds, ...).
    Other,
}

impl WeatherCategory {
    /// Adverse conditions in match order.
    pub const ADVERSE: [WeatherCategory; 6] = [
        WeatherCategory::Rain,
        WeatherCategory::Drizzle,
        WeatherCategory::Thunderstorm,
        WeatherCategory::Snow,
        WeatherCategory::Fog,
        WeatherCategory::Mist,
    ];

    /// Classify a condition string by case-sensitive substring match.
    ///
    /// The first vocabulary entry contained in `condition` wins, so
    /// `"Light Rain and Fog"` is `Rain`.
    pub fn classify(condition: &str) -> Self {
        Self::ADVERSE
            .into_iter()
            .find(|c| condition.contains(c.keyword()))
            .unwrap_or(WeatherCategory::Other)
    }

    /// The vocabulary word this category matches on.
    pub fn keyword(&self) -> &'static str {
        match self {
            WeatherCategory::Rain => "Rain",
            WeatherCategory::Drizzle => "Drizzle",
            WeatherCategory::Thunderstorm => "Thunderstorm",
            WeatherCategory::Snow => "Snow",
            WeatherCategory::Fog => "Fog",
            WeatherCategory::Mist => "Mist",
            WeatherCategory::Other => "",
        }
    }

    /// Whether this condition reduces grip or visibility.
    pub fn is_adverse(&self) -> bool {
        !matches!(self, WeatherCategory::Other)
    }

    /// Whether this condition leaves standing water on the road.
    pub fn is_wet(&self) -> bool {
        matches!(
            self,
            WeatherCategory::Rain | WeatherCategory::Drizzle | WeatherCategory::Thunderstorm
        )
    }
}

/// Traffic level as seen by the accident predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficCategory {
    Heavy,
    Severe,
    Standstill,
    /// Light, moderate, unknown, or unrecognized.
    Other,
}

impl TrafficCategory {
    const CONGESTED: [TrafficCategory; 3] = [
        TrafficCategory::Heavy,
        TrafficCategory::Severe,
        TrafficCategory::Standstill,
    ];

    /// Classify a traffic string by case-insensitive substring match.
    pub fn classify(level: &str) -> Self {
        let lower = level.to_lowercase();
        Self::CONGESTED
            .into_iter()
            .find(|c| lower.contains(c.keyword()))
            .unwrap_or(TrafficCategory::Other)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TrafficCategory::Heavy => "heavy",
            TrafficCategory::Severe => "severe",
            TrafficCategory::Standstill => "standstill",
            TrafficCategory::Other => "",
        }
    }

    pub fn is_congested(&self) -> bool {
        !matches!(self, TrafficCategory::Other)
    }
}
