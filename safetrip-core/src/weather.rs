//! Weather-based driving risk.
//!
//! Classifies current conditions into a four-level driving risk and serves
//! current weather from OpenWeatherMap, falling back to a fixed mock report
//! when no key is configured or the upstream call fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use crate::types::DrivingRisk;
use crate::upstream::{self, Coordinates};

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const PROVIDER_NAME: &str = "OpenWeatherMap";

/// Wind speed above which gusts become a steering hazard.
const STRONG_WIND_KMH: f64 = 60.0;
/// Visibility below which conditions count as dense fog.
const DENSE_FOG_KM: f64 = 0.5;

/// Weather-derived driving risk, one step finer than the predictor's levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeatherRiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl WeatherRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherRiskLevel::Low => "LOW",
            WeatherRiskLevel::Medium => "MEDIUM",
            WeatherRiskLevel::High => "HIGH",
            WeatherRiskLevel::Extreme => "EXTREME",
        }
    }
}

impl std::fmt::Display for WeatherRiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type WeatherRisk = DrivingRisk<WeatherRiskLevel>;

/// Classify driving risk from the headline condition, wind (m/s), and visibility (m).
///
/// Missing wind is taken as calm and missing visibility as 10 km.
pub fn classify_driving_risk(
    condition: Option<&str>,
    wind_speed_ms: Option<f64>,
    visibility_m: Option<f64>,
) -> WeatherRisk {
    let wind_kmh = wind_speed_ms.unwrap_or(0.0) * 3.6;
    let visibility_km = visibility_m.unwrap_or(10_000.0) / 1000.0;
    let condition = condition.unwrap_or_default();

    match condition {
        "Thunderstorm" | "Tornado" => {
            WeatherRisk::new(WeatherRiskLevel::Extreme, "Thunderstorm! Avoid driving.")
        }
        "Snow" | "Sleet" => WeatherRisk::new(WeatherRiskLevel::High, "Snow/Ice on road. Drive slowly."),
        _ if condition == "Fog" || visibility_km < DENSE_FOG_KM => {
            WeatherRisk::new(WeatherRiskLevel::High, "Dense fog. Use fog lights.")
        }
        "Rain" | "Drizzle" => WeatherRisk::new(WeatherRiskLevel::Medium, "Wet roads. Reduce speed."),
        _ if wind_kmh > STRONG_WIND_KMH => {
            WeatherRisk::new(WeatherRiskLevel::Medium, "Strong winds. Hold steering firmly.")
        }
        _ => clear_weather_risk(),
    }
}

fn clear_weather_risk() -> WeatherRisk {
    WeatherRisk::new(WeatherRiskLevel::Low, "Clear weather. Safe to drive.")
}

/// Current conditions at a location, in driver-facing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Headline condition (Clear, Clouds, Rain, Fog, ...).
    pub condition: String,
    pub description: String,
    /// Degrees Celsius.
    pub temp: i64,
    pub feels_like: i64,
    /// Percent.
    pub humidity: f64,
    /// km/h.
    pub wind_speed: i64,
    /// km.
    pub visibility: i64,
    pub city: String,
    pub driving_risk: WeatherRisk,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mock: bool,
}

impl WeatherReport {
    /// Build a report from an OpenWeatherMap current-weather payload.
    pub fn from_openweather(data: OpenWeatherResponse) -> Self {
        let headline = data.weather.into_iter().next();
        let main = data.main.unwrap_or_default();
        let wind_ms = data.wind.and_then(|w| w.speed);
        let condition = headline.as_ref().and_then(|w| w.main.clone());

        Self {
            driving_risk: classify_driving_risk(condition.as_deref(), wind_ms, data.visibility),
            condition: condition.unwrap_or_else(|| "Clear".to_string()),
            description: headline
                .and_then(|w| w.description)
                .unwrap_or_else(|| "clear sky".to_string()),
            temp: main.temp.unwrap_or(25.0).round() as i64,
            feels_like: main.feels_like.unwrap_or(25.0).round() as i64,
            humidity: main.humidity.unwrap_or(0.0),
            wind_speed: (wind_ms.unwrap_or(0.0) * 3.6).round() as i64,
            visibility: (data.visibility.unwrap_or(10_000.0) / 1000.0).round() as i64,
            city: data.name.unwrap_or_else(|| "Unknown".to_string()),
            is_mock: false,
        }
    }
}

/// Fixed report served when live weather is unavailable.
pub fn mock_weather() -> WeatherReport {
    WeatherReport {
        condition: "Clear".into(),
        description: "clear sky".into(),
        temp: 28,
        feels_like: 30,
        humidity: 65.0,
        wind_speed: 12,
        visibility: 10,
        city: "Mock City".into(),
        driving_risk: clear_weather_risk(),
        is_mock: true,
    }
}

/// Subset of the OpenWeatherMap current-weather response we consume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherResponse {
    #[serde(default)]
    pub weather: Vec<OpenWeatherCondition>,
    pub main: Option<OpenWeatherMain>,
    pub wind: Option<OpenWeatherWind>,
    /// Metres.
    pub visibility: Option<f64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherCondition {
    pub main: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherWind {
    /// Metres per second.
    pub speed: Option<f64>,
}

/// A source of current weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn current(&self, at: Coordinates) -> Result<WeatherReport, ProviderError>;
}

/// OpenWeatherMap current-weather client (metric units).
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    timeout_secs: u64,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER_NAME, timeout_secs)?,
            api_key: api_key.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn current(&self, at: Coordinates) -> Result<WeatherReport, ProviderError> {
        let url = upstream::url_with_params(
            PROVIDER_NAME,
            OPENWEATHER_URL,
            &[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ],
        )?;
        let data: OpenWeatherResponse =
            upstream::get_json(&self.client, PROVIDER_NAME, url, self.timeout_secs).await?;
        Ok(WeatherReport::from_openweather(data))
    }
}

/// Weather lookups with mock fallback.
#[derive(Clone, Default)]
pub struct WeatherService {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl WeatherService {
    /// Use OpenWeatherMap when a usable key is configured, mock data otherwise.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ProviderError> {
        let provider = match config.weather_key() {
            Some(key) => Some(Arc::new(OpenWeatherClient::new(key, config.weather_timeout_secs)?)
                as Arc<dyn WeatherProvider>),
            None => None,
        };
        Ok(Self { provider })
    }

    pub fn with_provider(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Whether lookups are served from mock data.
    pub fn is_mock(&self) -> bool {
        self.provider.is_none()
    }

    /// Current weather at a location. Never fails.
    pub async fn current(&self, at: Coordinates) -> WeatherReport {
        let Some(provider) = &self.provider else {
            debug!("Weather provider not configured, serving mock data");
            return mock_weather();
        };
        match provider.current(at).await {
            Ok(report) => {
                debug!(
                    lat = at.lat,
                    lon = at.lon,
                    condition = %report.condition,
                    risk = ?report.driving_risk.level,
                    "Weather fetched"
                );
                report
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Weather lookup failed, serving mock data");
                mock_weather()
            }
        }
    }
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
