//! Integration tests for the gateway REST API endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use safetrip_core::gateway::{AppState, GatewayConfig, RateLimitConfig, SharedState, gateway_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_state(config: GatewayConfig) -> SharedState {
    AppState::new(config).into_shared()
}

fn default_state() -> SharedState {
    make_state(GatewayConfig::default())
}

fn make_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn make_post_request(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(state: SharedState, request: Request<Body>) -> (StatusCode, Value) {
    let app = gateway_router(state);
    let resp = ServiceExt::<Request<Body>>::oneshot(app, request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(state: SharedState, uri: &str) -> (StatusCode, Value) {
    send(state, make_request(uri)).await
}

async fn post_json(state: SharedState, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
    send(state, make_post_request(uri, &body.to_string(), token)).await
}

// --- /api/predict-accident ---

#[tokio::test]
async fn test_predict_extreme_speed() {
    let (status, json) = post_json(
        default_state(),
        "/api/predict-accident",
        json!({
            "speedKmh": 150,
            "weatherCondition": "Clear",
            "timeHour": 12,
            "trafficLevel": "light",
            "incidentHistoryCount": 0
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["probability"], 90);
    assert_eq!(json["level"], "HIGH");
    assert_eq!(json["contributingFactors"], json!(["Extremely High Speed"]));
    assert_eq!(
        json["message"],
        "CRITICAL RISK: Extremely High Speed. Slow down immediately!"
    );
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let (status, json) = post_json(
        default_state(),
        "/api/predict-accident",
        json!({
            "speedKmh": "70",
            "weatherCondition": "Rain",
            "timeHour": "2",
            "trafficLevel": "unknown",
            "incidentHistoryCount": "0"
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["probability"], 66);
    assert_eq!(json["level"], "MEDIUM");
    assert_eq!(
        json["contributingFactors"],
        json!([
            "Creating hydroplaning risk in Rain",
            "Late night driving (Fatigue Risk)"
        ])
    );
}

#[tokio::test]
async fn test_predict_malformed_body_still_succeeds() {
    let (status, json) = send(
        default_state(),
        make_post_request("/api/predict-accident", "{not json", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let probability = json["probability"].as_u64().unwrap();
    assert!((5..=100).contains(&probability));
}

#[tokio::test]
async fn test_predict_escapes_echoed_condition() {
    let (status, json) = post_json(
        default_state(),
        "/api/predict-accident",
        json!({
            "speedKmh": 30,
            "weatherCondition": "<img src=x onerror=alert(1)>Rain",
            "timeHour": 12
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["contributingFactors"],
        json!(["Reduced visibility due to &lt;img src=x onerror=alert(1)&gt;Rain"])
    );
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("&lt;img"));
    assert!(!message.contains("<img"));
}

// --- /api/weather, /api/traffic, /api/news ---

#[tokio::test]
async fn test_weather_requires_coordinates() {
    let (status, json) = get_json(default_state(), "/api/weather?lat=17.3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "lat and lon are required query parameters");
}

#[tokio::test]
async fn test_weather_mock_mode() {
    let (status, json) = get_json(default_state(), "/api/weather?lat=17.385&lon=78.4867").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isMock"], true);
    assert_eq!(json["drivingRisk"]["level"], "LOW");
}

#[tokio::test]
async fn test_traffic_point_mock_mode() {
    let (status, json) = get_json(default_state(), "/api/traffic?lat=17.385&lon=78.4867").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["provider"], "mock");
    assert_eq!(json["congestionLabel"], "Moderate");

    let (status, _) = get_json(default_state(), "/api/traffic").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_traffic_route() {
    let (status, json) = get_json(
        default_state(),
        "/api/traffic/route?origin=78.4867,17.385&destination=78.5,17.4",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["segments"].as_array().unwrap().len(), 4);

    let (status, json) = get_json(default_state(), "/api/traffic/route?origin=78.4867,17.385").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "origin and destination are required (format: lng,lat)");
}

#[tokio::test]
async fn test_traffic_incidents_default_to_origin() {
    let (status, json) = get_json(default_state(), "/api/traffic/incidents?lat=abc").await;
    assert_eq!(status, StatusCode::OK);
    let incidents = json["incidents"].as_array().unwrap();
    assert_eq!(incidents.len(), 3);
    assert_eq!(incidents[0]["type"], "Traffic Jam");
    assert_eq!(incidents[0]["geometry"]["coordinates"], json!([0.002, 0.003]));
}

#[tokio::test]
async fn test_news_and_alerts_mock_mode() {
    let (status, json) = get_json(default_state(), "/api/news").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isMock"], true);
    assert_eq!(json["articles"].as_array().unwrap().len(), 4);

    let (status, json) = get_json(default_state(), "/api/news/alerts").await;
    assert_eq!(status, StatusCode::OK);
    let alerts = json["alerts"].as_array().unwrap();
    assert!(alerts.iter().all(|a| a["severity"] == "high"));
}

// --- authenticated endpoints ---

#[tokio::test]
async fn test_location_requires_token() {
    let body = json!({"userId": "u1", "latitude": 17.3, "longitude": 78.4, "speed": 95});
    let (status, json) = post_json(default_state(), "/api/location", body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "No token provided");
}

#[tokio::test]
async fn test_empty_bearer_token_is_missing() {
    let body = json!({"userId": "u1", "startLocation": "Home"});
    let (status, json) = post_json(default_state(), "/api/trip/start", body, Some("")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "No token provided");
}

#[tokio::test]
async fn test_location_quick_assess() {
    let state = default_state();
    let body = json!({"userId": "u1", "latitude": 17.3, "longitude": 78.4, "speed": 95});
    let (status, json) = post_json(state.clone(), "/api/location", body, Some("dev")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["riskLevel"], "HIGH");
    assert_eq!(json["message"], "Speeding! Slow down immediately.");

    let body = json!({"userId": "u1", "latitude": 17.3, "longitude": 78.4, "speed": 30});
    let (_, json) = post_json(state, "/api/location", body, Some("dev")).await;
    assert_eq!(json["riskLevel"], "LOW");
}

#[tokio::test]
async fn test_location_validation_errors() {
    let body = json!({"latitude": 120, "longitude": 78.4});
    let (status, json) = post_json(default_state(), "/api/location", body, Some("dev")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Validation failed: \"userId\" is required, \"latitude\" must be less than or equal to 90"
    );
}

#[tokio::test]
async fn test_configured_tokens_reject_unknown() {
    let state = make_state(GatewayConfig {
        auth_tokens: vec!["secret".into()],
        ..GatewayConfig::default()
    });
    let body = json!({"userId": "u1", "startLocation": "Home"});
    let (status, json) = post_json(state.clone(), "/api/trip/start", body.clone(), Some("guess")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid or expired token");

    let (status, json) = post_json(state, "/api/trip/start", body, Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Trip started");
    assert!(json["tripId"].is_string());
}

#[tokio::test]
async fn test_trip_lifecycle() {
    let state = default_state();
    let (_, json) = post_json(
        state.clone(),
        "/api/trip/start",
        json!({"userId": "u1", "startLocation": "Home"}),
        Some("dev"),
    )
    .await;
    let trip_id = json["tripId"].as_str().unwrap().to_string();

    let (status, json) = post_json(
        state.clone(),
        "/api/trip/end",
        json!({"tripId": trip_id, "endLocation": "Office", "distance": 12.5, "duration": 1500}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], true);

    let (status, json) = post_json(state, "/api/trip/end", json!({"tripId": "missing"}), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], false);
}

#[tokio::test]
async fn test_trip_end_is_lenient() {
    let state = default_state();
    let (_, json) = post_json(
        state.clone(),
        "/api/trip/start",
        json!({"userId": "u1", "startLocation": "Home"}),
        Some("dev"),
    )
    .await;
    let trip_id = json["tripId"].as_str().unwrap().to_string();

    let (status, json) = post_json(
        state.clone(),
        "/api/trip/end",
        json!({"tripId": trip_id, "distance": "12.4", "duration": "1800"}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], true);

    let (status, json) = post_json(
        state.clone(),
        "/api/trip/end",
        json!({"tripId": 12345, "endLocation": ["x"]}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Trip ended. Saved to History.");
    assert_eq!(json["found"], false);

    let (status, _) = send(state, make_post_request("/api/trip/end", "{not json", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hazards_appear_in_alert_feed() {
    let state = default_state();
    for kind in ["Pothole", "Debris"] {
        let (status, _) = post_json(
            state.clone(),
            "/api/report-hazard",
            json!({"type": kind, "severity": "high", "location": "Main St", "userId": "u1"}),
            Some("dev"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = get_json(state, "/api/alerts").await;
    assert_eq!(status, StatusCode::OK);
    let feed = json.as_array().unwrap();
    assert_eq!(feed.len(), 4);
    assert_eq!(feed[0]["id"], "ext_1");
    assert_eq!(feed[1]["id"], "ext_2");
    assert_eq!(feed[2]["type"], "Debris");
    assert_eq!(feed[3]["type"], "Pothole");
}

#[tokio::test]
async fn test_hazard_feed_limit() {
    let state = make_state(GatewayConfig {
        hazard_feed_limit: 1,
        ..GatewayConfig::default()
    });
    for kind in ["Pothole", "Debris", "Flooding"] {
        post_json(
            state.clone(),
            "/api/report-hazard",
            json!({"type": kind, "severity": "low", "location": "Main St", "userId": "u1"}),
            Some("dev"),
        )
        .await;
    }
    let (_, json) = get_json(state, "/api/alerts").await;
    let feed = json.as_array().unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[2]["type"], "Flooding");
}

#[tokio::test]
async fn test_hazard_invalid_severity() {
    let (status, json) = post_json(
        default_state(),
        "/api/report-hazard",
        json!({"type": "Pothole", "severity": "extreme", "location": "Main St", "userId": "u1"}),
        Some("dev"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Validation failed: \"severity\" must be one of [low, medium, high]"
    );
}

// --- limits ---

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let state = make_state(GatewayConfig {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        },
        ..GatewayConfig::default()
    });
    for _ in 0..2 {
        let (status, _) = get_json(state.clone(), "/api/news").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, json) = get_json(state.clone(), "/api/news").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["error"].as_str().unwrap().starts_with("Too many requests"));

    // health is outside the limited API surface
    let (status, _) = get_json(state, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let state = make_state(GatewayConfig {
        rate_limit: RateLimitConfig {
            max_requests: 1,
            window_secs: 60,
        },
        ..GatewayConfig::default()
    });
    let request = |ip: &str| {
        Request::builder()
            .uri("/api/news")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(state.clone(), request("10.0.0.1")).await.0, StatusCode::OK);
    assert_eq!(
        send(state.clone(), request("10.0.0.1")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(state, request("10.0.0.2")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_body_limit() {
    let big = format!("{{\"userId\":\"{}\",\"startLocation\":\"Home\"}}", "x".repeat(20_000));
    let (status, _) = send(
        default_state(),
        make_post_request("/api/trip/start", &big, Some("dev")),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
