//! Congestion labels and their driving risk.

use serde::{Deserialize, Serialize};

use crate::types::{DrivingRisk, RiskLevel};

/// Per-segment congestion as annotated by the directions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Congestion {
    Low,
    Moderate,
    Heavy,
    Severe,
    #[serde(other)]
    Unknown,
}

impl Congestion {
    /// Parse an annotation value; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "low" => Congestion::Low,
            "moderate" => Congestion::Moderate,
            "heavy" => Congestion::Heavy,
            "severe" => Congestion::Severe,
            _ => Congestion::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Congestion::Unknown => "unknown",
            Congestion::Low => "low",
            Congestion::Moderate => "moderate",
            Congestion::Heavy => "heavy",
            Congestion::Severe => "severe",
        }
    }

    /// Driver-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Congestion::Unknown => "Unknown",
            Congestion::Low => "Free Flow",
            Congestion::Moderate => "Moderate",
            Congestion::Heavy => "Heavy",
            Congestion::Severe => "Standstill",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Congestion::Unknown | Congestion::Low | Congestion::Moderate => RiskLevel::Low,
            Congestion::Heavy => RiskLevel::Medium,
            Congestion::Severe => RiskLevel::High,
        }
    }

    pub fn driving_risk(&self) -> DrivingRisk {
        let message = match self {
            Congestion::Unknown => "Traffic data unavailable.",
            Congestion::Low => "Light traffic. Road is clear.",
            Congestion::Moderate => "Moderate traffic. Stay alert.",
            Congestion::Heavy => "Heavy traffic. Reduce speed.",
            Congestion::Severe => "Traffic standstill. Use alternate route.",
        };
        DrivingRisk::new(self.risk_level(), message)
    }

    /// Rank used to pick the worst segment: severe > heavy > moderate > low > unknown.
    pub fn priority(&self) -> u8 {
        match self {
            Congestion::Unknown => 0,
            Congestion::Low => 1,
            Congestion::Moderate => 2,
            Congestion::Heavy => 3,
            Congestion::Severe => 4,
        }
    }
}

/// The worst congestion among the given segments, `Unknown` when empty.
pub fn worst_congestion<I>(segments: I) -> Congestion
where
    I: IntoIterator<Item = Congestion>,
{
    segments
        .into_iter()
        .max_by_key(Congestion::priority)
        .unwrap_or(Congestion::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_labels() {
        assert_eq!(Congestion::parse("severe"), Congestion::Severe);
        assert_eq!(Congestion::parse("SEVERE"), Congestion::Unknown);
        assert_eq!(Congestion::parse("gridlock"), Congestion::Unknown);
        assert_eq!(Congestion::Severe.label(), "Standstill");
        assert_eq!(Congestion::Low.label(), "Free Flow");
    }

    #[test]
    fn test_risk_table() {
        assert_eq!(Congestion::Unknown.risk_level(), RiskLevel::Low);
        assert_eq!(Congestion::Moderate.risk_level(), RiskLevel::Low);
        assert_eq!(Congestion::Heavy.risk_level(), RiskLevel::Medium);
        assert_eq!(Congestion::Severe.risk_level(), RiskLevel::High);
        assert_eq!(
            Congestion::Heavy.driving_risk().message,
            "Heavy traffic. Reduce speed."
        );
    }

    #[test]
    fn test_worst_congestion_priority() {
        use Congestion::*;
        assert_eq!(worst_congestion([Low, Moderate, Low]), Moderate);
        assert_eq!(worst_congestion([Heavy, Severe, Low]), Severe);
        assert_eq!(worst_congestion([Unknown, Low]), Low);
        assert_eq!(worst_congestion([Unknown]), Unknown);
        assert_eq!(worst_congestion(Vec::new()), Unknown);
    }

    #[test]
    fn test_deserialize_unrecognized_as_unknown() {
        let parsed: Vec<Congestion> =
            serde_json::from_str(r#"["low","heavy","closed","unknown"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Congestion::Low,
                Congestion::Heavy,
                Congestion::Unknown,
                Congestion::Unknown
            ]
        );
        assert_eq!(serde_json::to_string(&Congestion::Severe).unwrap(), "\"severe\"");
    }
}
