//! Property-based tests for the accident predictor using proptest.

use proptest::prelude::*;

use safetrip_core::predictor::{AccidentPredictor, RiskInput, RiskRequest};
use safetrip_core::RiskLevel;

fn weather() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Clear".to_string()),
        Just("Clouds".to_string()),
        Just("Rain".to_string()),
        Just("Light Rain".to_string()),
        Just("Drizzle".to_string()),
        Just("Thunderstorm".to_string()),
        Just("Snow".to_string()),
        Just("Fog".to_string()),
        Just("Mist".to_string()),
        Just("rain".to_string()),
        "[A-Za-z ]{0,12}",
    ]
}

fn traffic() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("light".to_string()),
        Just("moderate".to_string()),
        Just("heavy".to_string()),
        Just("SEVERE".to_string()),
        Just("standstill".to_string()),
        Just("unknown".to_string()),
        "[a-z]{0,10}",
    ]
}

fn input() -> impl Strategy<Value = RiskInput> {
    (0.0f64..250.0, weather(), -2i64..30, traffic(), 0u32..20).prop_map(
        |(speed, weather, hour, traffic, history)| RiskInput::new(speed, weather, hour, traffic, history),
    )
}

/// Evaluation stage a factor belongs to.
fn stage(factor: &str) -> usize {
    if factor.starts_with("Extremely High Speed") || factor.starts_with("Speeding") {
        0
    } else if factor.starts_with("Creating hydroplaning") || factor.starts_with("Reduced visibility") {
        1
    } else if factor.starts_with("Late night") || factor.starts_with("Rush hour") {
        2
    } else if factor.starts_with("Fast driving") {
        3
    } else if factor.starts_with("High-accident zone") {
        4
    } else {
        panic!("unexpected factor {factor}")
    }
}

proptest! {
    #[test]
    fn probability_is_bounded(input in input()) {
        let result = AccidentPredictor::new().predict(&input);
        prop_assert!((5..=100).contains(&result.probability));
    }

    #[test]
    fn level_matches_thresholds(input in input()) {
        let result = AccidentPredictor::new().predict(&input);
        let expected = if result.probability >= 75 {
            RiskLevel::High
        } else if result.probability >= 50 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        prop_assert_eq!(result.level, expected);
    }

    #[test]
    fn message_prefix_matches_level(input in input()) {
        let result = AccidentPredictor::new().predict(&input);
        let ok = match result.level {
            RiskLevel::High => result.message.starts_with("CRITICAL RISK: "),
            RiskLevel::Medium => result.message.starts_with("CAUTION: "),
            RiskLevel::Low => result.message.starts_with("Safe"),
        };
        prop_assert!(ok, "{:?} with message {}", result.level, result.message);
    }

    #[test]
    fn factors_follow_evaluation_order(input in input()) {
        let result = AccidentPredictor::new().predict(&input);
        let stages: Vec<usize> = result.contributing_factors.iter().map(|f| stage(f)).collect();
        prop_assert!(stages.windows(2).all(|w| w[0] < w[1]), "{:?}", result.contributing_factors);
    }

    #[test]
    fn prediction_is_deterministic(input in input()) {
        let predictor = AccidentPredictor::new();
        prop_assert_eq!(predictor.predict(&input), predictor.predict(&input));
    }

    #[test]
    fn probability_non_decreasing_in_speed(
        a in 0.0f64..250.0,
        b in 0.0f64..250.0,
        weather in weather(),
        hour in 0i64..24,
        traffic in traffic(),
        history in 0u32..10,
    ) {
        let (slow, fast) = if a <= b { (a, b) } else { (b, a) };
        let predictor = AccidentPredictor::new();
        let p_slow = predictor.predict(&RiskInput::new(slow, weather.clone(), hour, traffic.clone(), history));
        let p_fast = predictor.predict(&RiskInput::new(fast, weather, hour, traffic, history));
        prop_assert!(p_slow.probability <= p_fast.probability);
    }

    #[test]
    fn probability_non_decreasing_in_history(input in input(), extra in 0u32..10) {
        let predictor = AccidentPredictor::new();
        let more = RiskInput::new(
            input.speed_kmh,
            input.weather_condition.clone(),
            input.time_hour,
            input.traffic_level.clone(),
            input.incident_history_count + extra,
        );
        prop_assert!(predictor.predict(&input).probability <= predictor.predict(&more).probability);
    }

    #[test]
    fn arbitrary_bodies_never_panic(body in proptest::collection::vec(any::<u8>(), 0..256), hour in 0u32..24) {
        let input = RiskRequest::from_body(&body).normalize(hour);
        let result = AccidentPredictor::new().predict(&input);
        prop_assert!((5..=100).contains(&result.probability));
    }
}
