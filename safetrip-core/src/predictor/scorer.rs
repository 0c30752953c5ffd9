//! Weighted additive accident-risk scoring with a non-linear speed curve.

use serde::{Deserialize, Serialize};

use super::input::RiskInput;
use super::weights::ScoringProfile;
use crate::types::RiskLevel;

/// Output of a single prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    /// Heuristic accident likelihood, clamped to the profile's bounds.
    pub probability: u32,
    pub level: RiskLevel,
    pub message: String,
    /// Factors in evaluation order: speed, weather, time, traffic, history.
    pub contributing_factors: Vec<String>,
}

impl RiskResult {
    /// The first factor, which headlines the advisory message.
    pub fn headline_factor(&self) -> Option<&str> {
        self.contributing_factors.first().map(String::as_str)
    }
}

/// Running score and factor list for one evaluation.
struct Tally {
    score: f64,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: f64) {
        self.score += points;
    }

    fn add_with_factor(&mut self, points: f64, factor: impl Into<String>) {
        self.score += points;
        self.factors.push(factor.into());
    }
}

/// Deterministic accident-risk predictor.
///
/// Stateless apart from its immutable scoring profile, so a single instance
/// can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct AccidentPredictor {
    profile: ScoringProfile,
}

impl AccidentPredictor {
    /// Create a predictor with the default weights and thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a predictor with an alternate scoring profile.
    pub fn with_profile(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Score an input. Never fails; unmatched inputs contribute nothing.
    pub fn predict(&self, input: &RiskInput) -> RiskResult {
        let mut tally = Tally {
            score: 0.0,
            factors: Vec::new(),
        };

        self.score_speed(&mut tally, input);
        self.score_weather(&mut tally, input);
        self.score_time(&mut tally, input);
        self.score_traffic(&mut tally, input);
        self.score_history(&mut tally, input);

        let probability = self.clamp(tally.score);
        let (level, message) = self.classify(probability, &tally.factors);

        RiskResult {
            probability,
            level,
            message,
            contributing_factors: tally.factors,
        }
    }

    /// Exactly one bracket applies, checked from fastest down.
    fn score_speed(&self, tally: &mut Tally, input: &RiskInput) {
        let weight = self.profile.weights.speed;
        let speed = input.speed_kmh;
        if speed > 120.0 {
            tally.add_with_factor(60.0 * weight, "Extremely High Speed");
        } else if speed > 80.0 {
            tally.add_with_factor(30.0 * weight, "Speeding (>80km/h)");
        } else if speed > 50.0 {
            tally.add(10.0 * weight);
        }
    }

    fn score_weather(&self, tally: &mut Tally, input: &RiskInput) {
        if !input.weather.is_adverse() {
            return;
        }
        tally.add(20.0 * self.profile.weights.weather);
        if input.speed_kmh > 60.0 {
            tally.add_with_factor(
                15.0,
                format!(
                    "Creating hydroplaning risk in {}",
                    input.weather_condition
                ),
            );
        } else {
            tally.factors.push(format!(
                "Reduced visibility due to {}",
                input.weather_condition
            ));
        }
    }

    /// Late night (23:00-04:59) takes precedence over rush hour.
    fn score_time(&self, tally: &mut Tally, input: &RiskInput) {
        let hour = input.time_hour;
        if hour >= 23 || hour <= 4 {
            tally.add_with_factor(
                15.0 * self.profile.weights.time,
                "Late night driving (Fatigue Risk)",
            );
        } else if (8..=10).contains(&hour) || (17..=19).contains(&hour) {
            tally.add_with_factor(
                10.0 * self.profile.weights.traffic,
                "Rush hour traffic intensity",
            );
        }
    }

    /// Congestion raises the score, but crawling through it lowers it again.
    fn score_traffic(&self, tally: &mut Tally, input: &RiskInput) {
        if !input.traffic.is_congested() {
            return;
        }
        tally.add(10.0 * self.profile.weights.traffic);
        if input.speed_kmh < 20.0 {
            tally.add(-5.0);
        } else if input.speed_kmh > 40.0 {
            tally.add_with_factor(10.0, "Fast driving in heavy traffic");
        }
    }

    fn score_history(&self, tally: &mut Tally, input: &RiskInput) {
        let count = input.incident_history_count;
        if count > 0 {
            tally.add_with_factor(
                f64::from(count) * 5.0 * self.profile.weights.history,
                format!("High-accident zone ({count} past incidents)"),
            );
        }
    }

    /// Round, cap at the ceiling, then lift to the floor.
    fn clamp(&self, score: f64) -> u32 {
        let ceiling = f64::from(self.profile.max_probability);
        let floor = f64::from(self.profile.min_probability);
        let rounded = score.round().min(ceiling);
        rounded.max(floor) as u32
    }

    fn classify(&self, probability: u32, factors: &[String]) -> (RiskLevel, String) {
        let thresholds = &self.profile.thresholds;
        let headline = factors.first().map(String::as_str);

        if probability >= thresholds.danger {
            let cause = headline.unwrap_or("Unsafe driving conditions");
            (
                RiskLevel::High,
                format!("CRITICAL RISK: {cause}. Slow down immediately!"),
            )
        } else if probability >= thresholds.caution {
            let cause = headline.unwrap_or("Elevated risk detected");
            (
                RiskLevel::Medium,
                format!("CAUTION: {cause}. Stay alert."),
            )
        } else {
            let message = match headline {
                Some(cause) => format!("Safe, but note: {cause}"),
                None => "Safe driving detected.".to_string(),
            };
            (RiskLevel::Low, message)
        }
    }
}
