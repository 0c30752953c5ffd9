//! Instant feedback for live GPS fixes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predictor::WeatherCategory;
use crate::types::{DrivingRisk, RiskLevel};

/// Above this speed the driver is told to slow down regardless of weather.
pub const SPEEDING_KMH: f64 = 80.0;
/// Above this speed on a wet road the driver is told to ease off.
pub const WET_ROAD_KMH: f64 = 50.0;

/// Quick speed/weather check run on every location update.
///
/// A missing speed counts as stationary.
pub fn quick_assess(speed_kmh: Option<f64>, weather_condition: &str) -> DrivingRisk {
    let speed = speed_kmh.unwrap_or(0.0);
    if speed > SPEEDING_KMH {
        return DrivingRisk::new(RiskLevel::High, "Speeding! Slow down immediately.");
    }
    if WeatherCategory::classify(weather_condition).is_wet() && speed > WET_ROAD_KMH {
        return DrivingRisk::new(RiskLevel::Medium, "Wet road. Reduce speed.");
    }
    DrivingRisk::new(RiskLevel::Low, "Driving safe.")
}

/// Response to a location update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAck {
    pub status: String,
    pub processed_at: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub message: String,
}

impl LocationAck {
    pub fn new(risk: DrivingRisk) -> Self {
        Self {
            status: "success".into(),
            processed_at: Utc::now(),
            risk_level: risk.level,
            message: risk.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speeding_wins() {
        let risk = quick_assess(Some(95.0), "Rain");
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.message, "Speeding! Slow down immediately.");
    }

    #[test]
    fn test_wet_road() {
        assert_eq!(quick_assess(Some(60.0), "Light Rain").level, RiskLevel::Medium);
        assert_eq!(quick_assess(Some(60.0), "Thunderstorm").level, RiskLevel::Medium);
        assert_eq!(quick_assess(Some(50.0), "Rain").level, RiskLevel::Low);
        assert_eq!(quick_assess(Some(60.0), "Fog").level, RiskLevel::Low);
    }

    #[test]
    fn test_boundaries_and_missing_speed() {
        assert_eq!(quick_assess(Some(80.0), "Clear").level, RiskLevel::Low);
        let risk = quick_assess(None, "Rain");
        assert_eq!(risk, DrivingRisk::new(RiskLevel::Low, "Driving safe."));
    }

    #[test]
    fn test_ack_json() {
        let ack = LocationAck::new(quick_assess(Some(90.0), "Clear"));
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["riskLevel"], "HIGH");
        assert!(json["processedAt"].is_string());
    }
}
