//! Shared state for the gateway handlers.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::auth::GatewayAuth;
use super::rate_limit::RateLimiter;
use super::GatewayConfig;
use crate::config::SafeTripConfig;
use crate::error::ProviderError;
use crate::news::NewsService;
use crate::predictor::AccidentPredictor;
use crate::store::{InMemoryTripStore, TripStore};
use crate::traffic::TrafficService;
use crate::weather::WeatherService;

/// Thread-safe shared state reference for axum handlers.
pub type SharedState = Arc<AppState>;

/// Everything a request handler needs.
pub struct AppState {
    pub config: GatewayConfig,
    pub auth: GatewayAuth,
    pub limiter: RateLimiter,
    pub predictor: AccidentPredictor,
    pub weather: WeatherService,
    pub traffic: TrafficService,
    pub news: NewsService,
    pub store: Arc<dyn TripStore>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// State with mock providers, the default scoring profile, and an in-memory store.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            auth: GatewayAuth::from_config(&config),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            store: Arc::new(InMemoryTripStore::with_location_capacity(
                config.location_history_limit,
            )),
            config,
            predictor: AccidentPredictor::new(),
            weather: WeatherService::default(),
            traffic: TrafficService::default(),
            news: NewsService::default(),
            started_at: Utc::now(),
        }
    }

    /// Build state from the full configuration, wiring live providers where keys exist.
    pub fn from_config(config: &SafeTripConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(config.gateway.clone())
            .with_predictor(AccidentPredictor::with_profile(config.scoring))
            .with_weather(WeatherService::from_config(&config.providers)?)
            .with_traffic(TrafficService::from_config(&config.providers)?)
            .with_news(NewsService::from_config(&config.providers)?))
    }

    pub fn with_predictor(mut self, predictor: AccidentPredictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_weather(mut self, weather: WeatherService) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_traffic(mut self, traffic: TrafficService) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_news(mut self, news: NewsService) -> Self {
        self.news = news;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TripStore>) -> Self {
        self.store = store;
        self
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Uptime in seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("weather", &self.weather)
            .field("traffic", &self.traffic)
            .field("news", &self.news)
            .field("store", &self.store.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_to_mock_mode() {
        let state = AppState::new(GatewayConfig::default());
        assert!(state.weather.is_mock());
        assert!(state.traffic.is_mock());
        assert!(state.news.is_mock());
        assert_eq!(state.store.backend(), "memory");
        assert!(state.auth.is_open_mode());
        assert!(state.uptime_secs() < 5);
    }

    #[test]
    fn test_state_from_config_uses_scoring_profile() {
        let mut config = SafeTripConfig::default();
        config.scoring.thresholds.danger = 60;
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.predictor.profile().thresholds.danger, 60);
    }
}
