//! Mapbox driving-traffic directions client.

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    Congestion, RouteSegment, RouteSummary, RouteTraffic, TrafficProvider, TrafficReport,
    worst_congestion,
};
use crate::error::ProviderError;
use crate::upstream::{self, Coordinates};

const DIRECTIONS_URL: &str = "https://api.mapbox.com/directions/v5/mapbox/driving-traffic";
const PROVIDER_NAME: &str = "mapbox";

/// Degrees added to both axes to form a short sampling route (~500 m).
const POINT_SAMPLE_OFFSET: f64 = 0.005;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsRoute {
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    /// Metres.
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
    pub geometry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsLeg {
    pub annotation: Option<DirectionsAnnotation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsAnnotation {
    #[serde(default)]
    pub congestion: Vec<Congestion>,
    /// Metres per second, per segment.
    #[serde(default)]
    pub speed: Vec<f64>,
    /// Seconds, per segment.
    #[serde(default)]
    pub duration: Vec<f64>,
}

/// Metres to kilometres, two decimals.
fn metres_to_km(distance: f64) -> f64 {
    (distance / 10.0).round() / 100.0
}

fn mps_to_kmh(speed: f64) -> i64 {
    (speed * 3.6).round() as i64
}

impl DirectionsRoute {
    fn annotations(&self) -> impl Iterator<Item = &DirectionsAnnotation> {
        self.legs.iter().filter_map(|leg| leg.annotation.as_ref())
    }

    /// Aggregate every leg into a single point report.
    pub fn to_point_report(&self) -> TrafficReport {
        let all_congestions: Vec<Congestion> = self
            .annotations()
            .flat_map(|a| a.congestion.iter().copied())
            .collect();
        let speeds: Vec<f64> = self.annotations().flat_map(|a| a.speed.iter().copied()).collect();
        let avg_speed_kmh = (!speeds.is_empty())
            .then(|| mps_to_kmh(speeds.iter().sum::<f64>() / speeds.len() as f64));

        let worst = worst_congestion(all_congestions.iter().copied());
        TrafficReport {
            congestion_label: worst.label().to_string(),
            worst_segment: worst,
            avg_speed_kmh,
            driving_risk: worst.driving_risk(),
            all_congestions,
            total_duration_sec: self.duration.round() as i64,
            total_distance_km: metres_to_km(self.distance),
            provider: PROVIDER_NAME.into(),
        }
    }

    /// Per-segment breakdown plus a summary.
    pub fn to_route_traffic(&self) -> RouteTraffic {
        let mut segments = Vec::new();
        for (leg_idx, leg) in self.legs.iter().enumerate() {
            let Some(annotation) = &leg.annotation else {
                continue;
            };
            for (i, congestion) in annotation.congestion.iter().enumerate() {
                let speed = annotation.speed.get(i).copied().filter(|s| *s != 0.0);
                segments.push(RouteSegment {
                    leg: Some(leg_idx),
                    segment: i,
                    congestion: *congestion,
                    speed_mps: speed,
                    speed_kmh: speed.map(mps_to_kmh),
                    duration_sec: annotation.duration.get(i).copied(),
                    risk: congestion.risk_level(),
                });
            }
        }

        let worst = worst_congestion(segments.iter().map(|s| s.congestion));
        RouteTraffic {
            summary: RouteSummary {
                congestion_label: worst.label().to_string(),
                driving_risk: worst.driving_risk(),
                total_duration_min: (self.duration / 60.0).round() as i64,
                total_distance_km: metres_to_km(self.distance),
            },
            segments,
            geometry: self.geometry.clone(),
            provider: PROVIDER_NAME.into(),
        }
    }
}

/// Client for the Mapbox directions API with congestion annotations.
pub struct MapboxClient {
    client: reqwest::Client,
    access_token: String,
    point_timeout_secs: u64,
    route_timeout_secs: u64,
}

impl MapboxClient {
    pub fn new(
        access_token: impl Into<String>,
        point_timeout_secs: u64,
        route_timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: upstream::build_client(
                PROVIDER_NAME,
                point_timeout_secs.max(route_timeout_secs),
            )?,
            access_token: access_token.into(),
            point_timeout_secs,
            route_timeout_secs,
        })
    }

    async fn first_route(
        &self,
        waypoints: String,
        annotations: &str,
        timeout_secs: u64,
    ) -> Result<DirectionsRoute, ProviderError> {
        let url = upstream::url_with_params(
            PROVIDER_NAME,
            &format!("{DIRECTIONS_URL}/{waypoints}"),
            &[
                ("annotations", annotations),
                ("overview", "full"),
                ("geometries", "geojson"),
                ("access_token", self.access_token.as_str()),
            ],
        )?;
        let response: DirectionsResponse =
            upstream::get_json(&self.client, PROVIDER_NAME, url, timeout_secs).await?;
        response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoRoute {
                provider: PROVIDER_NAME.into(),
            })
    }
}

#[async_trait]
impl TrafficProvider for MapboxClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn point_traffic(&self, at: Coordinates) -> Result<TrafficReport, ProviderError> {
        let waypoints = format!(
            "{};{}",
            at.to_lng_lat(),
            at.offset(POINT_SAMPLE_OFFSET).to_lng_lat()
        );
        let route = self
            .first_route(
                waypoints,
                "congestion,speed,duration,distance",
                self.point_timeout_secs,
            )
            .await?;
        Ok(route.to_point_report())
    }

    async fn route_traffic(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteTraffic, ProviderError> {
        let waypoints = format!("{};{}", origin.to_lng_lat(), destination.to_lng_lat());
        let route = self
            .first_route(waypoints, "congestion,speed,duration", self.route_timeout_secs)
            .await?;
        Ok(route.to_route_traffic())
    }
}
