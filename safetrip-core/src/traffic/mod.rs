//! Traffic congestion and its driving risk.
//!
//! Point and route traffic come from the Mapbox driving-traffic directions
//! API when a token is configured. Without one, or when the upstream call
//! fails, fixed mock reports are served instead. Incidents are always
//! synthesized around the query point.

mod congestion;
mod mapbox;

pub use congestion::{Congestion, worst_congestion};
pub use mapbox::{DirectionsAnnotation, DirectionsLeg, DirectionsResponse, DirectionsRoute, MapboxClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use crate::types::{DrivingRisk, RiskLevel, Severity};
use crate::upstream::Coordinates;

/// Traffic sampled around a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReport {
    pub congestion_label: String,
    pub worst_segment: Congestion,
    /// `null` when the provider returned no speed annotations.
    pub avg_speed_kmh: Option<i64>,
    pub driving_risk: DrivingRisk,
    pub all_congestions: Vec<Congestion>,
    pub total_duration_sec: i64,
    pub total_distance_km: f64,
    pub provider: String,
}

/// One annotated stretch of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<usize>,
    pub segment: usize,
    pub congestion: Congestion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    pub speed_kmh: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub congestion_label: String,
    pub driving_risk: DrivingRisk,
    pub total_duration_min: i64,
    pub total_distance_km: f64,
}

/// Congestion along a full route, for colour-coding on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTraffic {
    pub summary: RouteSummary,
    pub segments: Vec<RouteSegment>,
    /// GeoJSON line geometry, passed through from the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentGeometry {
    /// `[lon, lat]`.
    pub coordinates: [f64; 2],
}

/// A reported disruption near the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: Severity,
    pub geometry: IncidentGeometry,
}

/// Three deterministic incidents placed around a point.
pub fn incidents_around(at: Coordinates) -> Vec<Incident> {
    let incident = |kind: &str, description: &str, severity, dlon: f64, dlat: f64| Incident {
        kind: kind.to_string(),
        description: description.to_string(),
        severity,
        geometry: IncidentGeometry {
            coordinates: [at.lon + dlon, at.lat + dlat],
        },
    };
    vec![
        incident("Traffic Jam", "Heavy congestion reported", Severity::High, 0.002, 0.003),
        incident(
            "Road Works",
            "Lane closure due to construction",
            Severity::Medium,
            -0.004,
            0.001,
        ),
        incident(
            "Accident",
            "Minor collision, expect delays",
            Severity::Medium,
            0.001,
            -0.002,
        ),
    ]
}

/// Fixed point report served when live traffic is unavailable.
pub fn mock_traffic() -> TrafficReport {
    let worst = Congestion::Moderate;
    TrafficReport {
        congestion_label: worst.label().to_string(),
        worst_segment: worst,
        avg_speed_kmh: Some(42),
        driving_risk: worst.driving_risk(),
        all_congestions: vec![
            Congestion::Low,
            Congestion::Moderate,
            Congestion::Moderate,
            Congestion::Low,
        ],
        total_duration_sec: 180,
        total_distance_km: 1.2,
        provider: "mock".into(),
    }
}

/// Fixed route report served when live traffic is unavailable.
pub fn mock_route_traffic() -> RouteTraffic {
    let segment = |segment, congestion: Congestion, speed_kmh| RouteSegment {
        leg: None,
        segment,
        congestion,
        speed_mps: None,
        speed_kmh: Some(speed_kmh),
        duration_sec: None,
        risk: congestion.risk_level(),
    };
    let worst = Congestion::Moderate;
    RouteTraffic {
        summary: RouteSummary {
            congestion_label: worst.label().to_string(),
            driving_risk: worst.driving_risk(),
            total_duration_min: 25,
            total_distance_km: 12.5,
        },
        segments: vec![
            segment(0, Congestion::Low, 55),
            segment(1, Congestion::Moderate, 38),
            segment(2, Congestion::Heavy, 22),
            segment(3, Congestion::Moderate, 40),
        ],
        geometry: None,
        provider: "mock".into(),
    }
}

/// A source of live traffic.
#[async_trait]
pub trait TrafficProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn point_traffic(&self, at: Coordinates) -> Result<TrafficReport, ProviderError>;

    async fn route_traffic(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteTraffic, ProviderError>;
}

/// Traffic lookups with mock fallback.
#[derive(Clone, Default)]
pub struct TrafficService {
    provider: Option<Arc<dyn TrafficProvider>>,
}

impl TrafficService {
    /// Use Mapbox when a usable token is configured, mock data otherwise.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ProviderError> {
        let provider = match config.mapbox_token() {
            Some(token) => Some(Arc::new(MapboxClient::new(
                token,
                config.traffic_timeout_secs,
                config.route_timeout_secs,
            )?) as Arc<dyn TrafficProvider>),
            None => None,
        };
        Ok(Self { provider })
    }

    pub fn with_provider(provider: Arc<dyn TrafficProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.provider.is_none()
    }

    /// Traffic around a point. Never fails.
    pub async fn point(&self, at: Coordinates) -> TrafficReport {
        let Some(provider) = &self.provider else {
            debug!("Traffic provider not configured, serving mock data");
            return mock_traffic();
        };
        match provider.point_traffic(at).await {
            Ok(report) => {
                debug!(
                    label = %report.congestion_label,
                    avg_speed_kmh = ?report.avg_speed_kmh,
                    "Traffic fetched"
                );
                report
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Traffic lookup failed, serving mock data");
                mock_traffic()
            }
        }
    }

    /// Congestion along a route. Never fails.
    pub async fn route(&self, origin: Coordinates, destination: Coordinates) -> RouteTraffic {
        let Some(provider) = &self.provider else {
            return mock_route_traffic();
        };
        match provider.route_traffic(origin, destination).await {
            Ok(route) => route,
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Route traffic lookup failed, serving mock data");
                mock_route_traffic()
            }
        }
    }

    pub fn incidents(&self, at: Coordinates) -> Vec<Incident> {
        incidents_around(at)
    }
}

impl std::fmt::Debug for TrafficService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficService")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
