//! Predictor inputs: the lenient wire request and the normalized feature vector.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};

use super::category::{TrafficCategory, WeatherCategory};
use crate::sanitize::escape_html;

/// Weather assumed when the caller sends none.
pub const DEFAULT_WEATHER: &str = "Clear";
/// Traffic level assumed when the caller sends none.
pub const DEFAULT_TRAFFIC: &str = "unknown";

/// A JSON field that may arrive as a number, a numeric string, or junk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Interpret the value as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Other(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Interpret the value as an integer, truncating any fraction.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|n| n.trunc() as i64)
    }

    /// Interpret the value as non-empty text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Body of a prediction request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskRequest {
    pub speed_kmh: Option<FieldValue>,
    pub weather_condition: Option<FieldValue>,
    pub time_hour: Option<FieldValue>,
    pub traffic_level: Option<FieldValue>,
    pub incident_history_count: Option<FieldValue>,
}

impl RiskRequest {
    /// Parse a raw request body, treating anything unparseable as empty.
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Escape the free-text fields, which are echoed back in factor messages.
    pub fn sanitized(mut self) -> Self {
        for field in [&mut self.weather_condition, &mut self.traffic_level] {
            if let Some(FieldValue::Text(text)) = field {
                *text = escape_html(text);
            }
        }
        self
    }

    /// Fill in defaults for missing or unusable fields.
    ///
    /// Speed defaults to 0, weather to `"Clear"`, hour to `current_hour`,
    /// traffic to `"unknown"`, and incident count to 0. Negative incident
    /// counts are treated as 0.
    pub fn normalize(&self, current_hour: u32) -> RiskInput {
        let speed_kmh = self
            .speed_kmh
            .as_ref()
            .and_then(FieldValue::as_number)
            .unwrap_or(0.0);
        let weather_condition = self
            .weather_condition
            .as_ref()
            .and_then(FieldValue::as_text)
            .unwrap_or(DEFAULT_WEATHER);
        let time_hour = self
            .time_hour
            .as_ref()
            .and_then(FieldValue::as_integer)
            .unwrap_or(i64::from(current_hour));
        let traffic_level = self
            .traffic_level
            .as_ref()
            .and_then(FieldValue::as_text)
            .unwrap_or(DEFAULT_TRAFFIC);
        let incident_history_count = self
            .incident_history_count
            .as_ref()
            .and_then(FieldValue::as_integer)
            .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
            .unwrap_or(0);

        RiskInput::new(
            speed_kmh,
            weather_condition,
            time_hour,
            traffic_level,
            incident_history_count,
        )
    }

    /// Normalize using the current local hour.
    pub fn normalize_now(&self) -> RiskInput {
        self.normalize(Local::now().hour())
    }
}

/// The normalized feature vector consumed by the predictor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskInput {
    pub speed_kmh: f64,
    /// Raw condition text, kept for factor messages.
    pub weather_condition: String,
    #[serde(skip)]
    pub weather: WeatherCategory,
    /// Hour of day. Not range-checked: anything >= 23 or <= 4 counts as late night.
    pub time_hour: i64,
    pub traffic_level: String,
    #[serde(skip)]
    pub traffic: TrafficCategory,
    pub incident_history_count: u32,
}

impl RiskInput {
    /// Build an input, classifying the free-text fields.
    pub fn new(
        speed_kmh: f64,
        weather_condition: impl Into<String>,
        time_hour: i64,
        traffic_level: impl Into<String>,
        incident_history_count: u32,
    ) -> Self {
        let weather_condition = weather_condition.into();
        let traffic_level = traffic_level.into();
        Self {
            speed_kmh,
            weather: WeatherCategory::classify(&weather_condition),
            weather_condition,
            time_hour,
            traffic: TrafficCategory::classify(&traffic_level),
            traffic_level,
            incident_history_count,
        }
    }
}
