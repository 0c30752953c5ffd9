//! Configuration system for SafeTrip.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/safetrip/config.toml` and/or `.safetrip/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gateway::GatewayConfig;
use crate::predictor::ScoringProfile;

/// Top-level configuration for the SafeTrip service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafeTripConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub scoring: ScoringProfile,
}

impl SafeTripConfig {
    /// Validate the whole configuration, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.gateway.validate();
        problems.extend(self.providers.validate());
        problems.extend(self.scoring.validate());
        problems
    }
}

/// Credentials and timeouts for the upstream data providers.
///
/// A provider whose key is missing, empty, or still a `YOUR_...` placeholder
/// is treated as unconfigured and served from built-in mock data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenWeatherMap API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,
    /// Mapbox access token for the driving-traffic directions API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapbox_token: Option<String>,
    /// NewsAPI.org API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_api_key: Option<String>,
    pub weather_timeout_secs: u64,
    pub traffic_timeout_secs: u64,
    pub route_timeout_secs: u64,
    pub news_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            mapbox_token: None,
            news_api_key: None,
            weather_timeout_secs: 5,
            traffic_timeout_secs: 6,
            route_timeout_secs: 8,
            news_timeout_secs: 5,
        }
    }
}

impl ProvidersConfig {
    /// Return the key if it is usable.
    pub fn usable_key(key: Option<&String>) -> Option<&str> {
        key.map(String::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.contains("YOUR_"))
    }

    pub fn weather_key(&self) -> Option<&str> {
        Self::usable_key(self.weather_api_key.as_ref())
    }

    pub fn mapbox_token(&self) -> Option<&str> {
        Self::usable_key(self.mapbox_token.as_ref())
    }

    pub fn news_key(&self) -> Option<&str> {
        Self::usable_key(self.news_api_key.as_ref())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, value) in [
            ("weather_timeout_secs", self.weather_timeout_secs),
            ("traffic_timeout_secs", self.traffic_timeout_secs),
            ("route_timeout_secs", self.route_timeout_secs),
            ("news_timeout_secs", self.news_timeout_secs),
        ] {
            if value == 0 {
                problems.push(format!("providers.{name} must be greater than zero"));
            }
        }
        problems
    }
}

/// Upstream credentials read from their conventional unprefixed variables.
const PROVIDER_ENV_VARS: [&str; 4] = ["WEATHER_API_KEY", "MAPBOX_TOKEN", "NEWS_API_KEY", "PORT"];

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "safetrip", "safetrip")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".safetrip").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `SAFETRIP_`)
/// 3. Provider variables (`WEATHER_API_KEY`, `MAPBOX_TOKEN`, `NEWS_API_KEY`, `PORT`)
/// 4. Workspace-local config (`.safetrip/config.toml`)
/// 5. User config (`~/.config/safetrip/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&SafeTripConfig>,
) -> Result<SafeTripConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(SafeTripConfig::default()));

    // User-level config
    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::raw().only(&PROVIDER_ENV_VARS).map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        if key == "port" {
            "gateway.port".into()
        } else {
            format!("providers.{key}").into()
        }
    }));

    // Environment variables (SAFETRIP_GATEWAY__PORT, SAFETRIP_SCORING__WEIGHTS__SPEED, etc.)
    figment = figment.merge(Env::prefixed("SAFETRIP_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any SafeTrip configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

/// Write the default configuration to `<workspace>/.safetrip/config.toml`.
///
/// Returns the path and whether a new file was created. An existing file is
/// left untouched.
pub fn write_default_config(workspace: &Path) -> anyhow::Result<(PathBuf, bool)> {
    let config_path = workspace_config_path(workspace);
    if config_path.exists() {
        return Ok((config_path, false));
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let toml_str = toml::to_string_pretty(&SafeTripConfig::default())?;
    std::fs::write(&config_path, toml_str)?;
    Ok((config_path, true))
}
