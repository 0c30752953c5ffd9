//! Route handlers for the HTTP gateway.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::auth::Authenticated;
use super::error::ApiError;
use super::state::SharedState;
use crate::location::{LocationAck, quick_assess};
use crate::predictor::RiskRequest;
use crate::store::StoredHazard;
use crate::types::Severity;
use crate::upstream::Coordinates;
use crate::validate;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PointQuery {
    lat: Option<String>,
    lon: Option<String>,
}

impl PointQuery {
    fn required(&self) -> Result<Coordinates, ApiError> {
        Coordinates::parse(self.lat.as_deref(), self.lon.as_deref()).ok_or_else(|| {
            ApiError::BadRequest("lat and lon are required query parameters".into())
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RouteQuery {
    origin: Option<String>,
    destination: Option<String>,
}

/// A system-generated alert shown alongside driver hazard reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// One entry of the combined alert feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlertEntry {
    External(ExternalAlert),
    Hazard(StoredHazard),
}

fn external_alerts(now: DateTime<Utc>) -> Vec<ExternalAlert> {
    vec![
        ExternalAlert {
            id: "ext_1".into(),
            kind: "Weather".into(),
            message: "Fog reported in 5km".into(),
            severity: Severity::Medium,
            created_at: now,
        },
        ExternalAlert {
            id: "ext_2".into(),
            kind: "Traffic".into(),
            message: "Congestion on Main St".into(),
            severity: Severity::Low,
            created_at: now,
        },
    ]
}

/// Parse a JSON body; an empty body is an empty object.
fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn mode(is_mock: bool) -> &'static str {
    if is_mock { "mock" } else { "live" }
}

pub(crate) async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let auth = if state.auth.is_open_mode() { "open" } else { "token" };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
        "auth": auth,
        "mode": {
            "weather": mode(state.weather.is_mock()),
            "traffic": mode(state.traffic.is_mock()),
            "news": mode(state.news.is_mock()),
            "store": state.store.backend(),
        },
    }))
}

/// Always answers 200: malformed bodies fall back to defaults. Text fields
/// are escaped since they come back inside the factor messages.
pub(crate) async fn predict_accident(State(state): State<SharedState>, body: Bytes) -> impl IntoResponse {
    let input = RiskRequest::from_body(&body).sanitized().normalize_now();
    let prediction = state.predictor.predict(&input);
    info!(
        probability = prediction.probability,
        level = %prediction.level,
        factor = prediction.headline_factor().unwrap_or("none"),
        "Accident risk predicted"
    );
    Json(prediction)
}

pub(crate) async fn weather(
    State(state): State<SharedState>,
    Query(query): Query<PointQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let at = query.required()?;
    Ok(Json(state.weather.current(at).await))
}

pub(crate) async fn traffic(
    State(state): State<SharedState>,
    Query(query): Query<PointQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let at = query.required()?;
    Ok(Json(state.traffic.point(at).await))
}

pub(crate) async fn traffic_route(
    State(state): State<SharedState>,
    Query(query): Query<RouteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let parse = |v: &Option<String>| v.as_deref().and_then(Coordinates::parse_lng_lat);
    let (Some(origin), Some(destination)) = (parse(&query.origin), parse(&query.destination)) else {
        return Err(ApiError::BadRequest(
            "origin and destination are required (format: lng,lat)".into(),
        ));
    };
    Ok(Json(state.traffic.route(origin, destination).await))
}

pub(crate) async fn traffic_incidents(
    State(state): State<SharedState>,
    Query(query): Query<PointQuery>,
) -> impl IntoResponse {
    let at = Coordinates::parse_or_origin(query.lat.as_deref(), query.lon.as_deref());
    Json(json!({ "incidents": state.traffic.incidents(at) }))
}

pub(crate) async fn news(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.news.feed().await)
}

pub(crate) async fn news_alerts(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.news.alerts().await)
}

pub(crate) async fn location(
    _auth: Authenticated,
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let update = validate::location(&json_body(&body)?)?;
    let at = Coordinates::new(update.latitude, update.longitude);
    let weather = state.weather.current(at).await;
    let risk = quick_assess(update.speed, &weather.condition);
    debug!(
        lat = update.latitude,
        lon = update.longitude,
        speed_kmh = update.speed.unwrap_or(0.0),
        risk = %risk.level,
        "Location received"
    );
    state.store.record_location(update).await?;
    Ok(Json(LocationAck::new(risk)))
}

pub(crate) async fn alerts(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let hazards = state.store.recent_hazards(state.config.hazard_feed_limit).await?;
    let feed: Vec<AlertEntry> = external_alerts(Utc::now())
        .into_iter()
        .map(AlertEntry::External)
        .chain(hazards.into_iter().map(AlertEntry::Hazard))
        .collect();
    Ok(Json(feed))
}

pub(crate) async fn trip_start(
    _auth: Authenticated,
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = validate::trip_start(&json_body(&body)?)?;
    let trip = state
        .store
        .start_trip(&request.user_id, &request.start_location)
        .await?;
    info!(trip_id = %trip.id, "Trip started");
    Ok(Json(json!({ "message": "Trip started", "tripId": trip.id })))
}

/// Only a body that is not JSON at all is rejected; odd field types are ignored.
pub(crate) async fn trip_end(State(state): State<SharedState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let end = validate::trip_end(&json_body(&body)?);
    let ended = state.store.end_trip(end).await?;
    if let Some(trip) = &ended {
        info!(trip_id = %trip.id, "Trip ended");
    }
    Ok(Json(json!({
        "message": "Trip ended. Saved to History.",
        "found": ended.is_some(),
    })))
}

pub(crate) async fn report_hazard(
    _auth: Authenticated,
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let report = validate::hazard(&json_body(&body)?)?;
    let stored = state.store.report_hazard(report).await?;
    info!(
        hazard_id = %stored.id,
        kind = %stored.report.kind,
        severity = %stored.report.severity,
        "Hazard reported"
    );
    Ok(Json(json!({
        "message": "Hazard reported successfully",
        "hazardId": stored.id,
    })))
}
