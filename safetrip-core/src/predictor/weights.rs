//! Scoring coefficients and classification thresholds.

use serde::{Deserialize, Serialize};

/// Per-stage multipliers applied to each stage's base points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Speed is the primary factor.
    pub speed: f64,
    /// Rain/fog multiplier.
    pub weather: f64,
    /// Late-night driving.
    pub time: f64,
    /// Congestion and rush hour.
    pub traffic: f64,
    /// Past incidents at the location.
    pub history: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            speed: 1.5,
            weather: 1.2,
            time: 0.8,
            traffic: 0.5,
            history: 2.0,
        }
    }
}

/// Probability cut-offs for the risk levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Informational only; classification uses `caution` and `danger`.
    pub safe: u32,
    /// Probabilities at or above this are MEDIUM.
    pub caution: u32,
    /// Probabilities at or above this are HIGH.
    pub danger: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            safe: 20,
            caution: 50,
            danger: 75,
        }
    }
}

/// Base points and bounds used by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub thresholds: RiskThresholds,
    /// Lowest probability ever reported.
    #[serde(default = "default_floor")]
    pub min_probability: u32,
    /// Highest probability ever reported.
    #[serde(default = "default_ceiling")]
    pub max_probability: u32,
}

fn default_floor() -> u32 {
    5
}

fn default_ceiling() -> u32 {
    100
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: RiskThresholds::default(),
            min_probability: default_floor(),
            max_probability: default_ceiling(),
        }
    }
}

impl ScoringProfile {
    /// Check the profile for values that would break the scorer's contract.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let w = &self.weights;
        for (name, value) in [
            ("speed", w.speed),
            ("weather", w.weather),
            ("time", w.time),
            ("traffic", w.traffic),
            ("history", w.history),
        ] {
            if !value.is_finite() || value < 0.0 {
                problems.push(format!(
                    "scoring.weights.{name} must be a non-negative number, got {value}"
                ));
            }
        }
        if self.thresholds.caution > self.thresholds.danger {
            problems.push(format!(
                "scoring.thresholds.caution ({}) must not exceed danger ({})",
                self.thresholds.caution, self.thresholds.danger
            ));
        }
        if self.min_probability > self.max_probability {
            problems.push(format!(
                "scoring.min_probability ({}) must not exceed max_probability ({})",
                self.min_probability, self.max_probability
            ));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let w = ScoringWeights::default();
        assert_eq!(w.speed, 1.5);
        assert_eq!(w.weather, 1.2);
        assert_eq!(w.time, 0.8);
        assert_eq!(w.traffic, 0.5);
        assert_eq!(w.history, 2.0);
    }

    #[test]
    fn test_default_profile_is_valid() {
        let profile = ScoringProfile::default();
        assert!(profile.validate().is_empty());
        assert_eq!(profile.min_probability, 5);
        assert_eq!(profile.max_probability, 100);
        assert_eq!(profile.thresholds.danger, 75);
    }

    #[test]
    fn test_invalid_profile_reports_every_problem() {
        let profile = ScoringProfile {
            weights: ScoringWeights {
                speed: -1.0,
                ..Default::default()
            },
            thresholds: RiskThresholds {
                safe: 20,
                caution: 80,
                danger: 75,
            },
            min_probability: 50,
            max_probability: 10,
        };
        let problems = profile.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("weights.speed"));
    }

    #[test]
    fn test_partial_profile_deserializes_with_defaults() {
        let profile: ScoringProfile =
            toml::from_str("min_probability = 0\n[weights]\nspeed = 2.0\nweather = 1.2\ntime = 0.8\ntraffic = 0.5\nhistory = 2.0\n")
                .unwrap();
        assert_eq!(profile.weights.speed, 2.0);
        assert_eq!(profile.min_probability, 0);
        assert_eq!(profile.max_probability, 100);
        assert_eq!(profile.thresholds, RiskThresholds::default());
    }
}
