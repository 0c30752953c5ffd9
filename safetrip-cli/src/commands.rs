//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use chrono::{Local, Timelike};
use safetrip_core::predictor::{AccidentPredictor, RiskInput, RiskResult};
use safetrip_core::weather::classify_driving_risk;
use safetrip_core::SafeTripConfig;
use std::path::Path;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => handle_serve(host, port, workspace).await,
        Commands::Predict {
            speed,
            weather,
            hour,
            traffic,
            incidents,
            json,
        } => {
            let hour = hour.unwrap_or_else(|| i64::from(Local::now().hour()));
            let input = RiskInput::new(speed, weather, hour, traffic, incidents);
            handle_predict(&input, json, workspace)
        }
        Commands::WeatherRisk {
            condition,
            wind,
            visibility,
        } => {
            let risk = classify_driving_risk(Some(&condition), wind, visibility);
            println!("{}: {}", risk.level, risk.message);
            Ok(())
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load(workspace: &Path) -> anyhow::Result<SafeTripConfig> {
    safetrip_core::config::load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    workspace: &Path,
) -> anyhow::Result<()> {
    let mut config = load(workspace)?;
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if !safetrip_core::config::config_exists(Some(workspace)) {
        tracing::info!("No config file found, using defaults (run `safetrip config init` to create one)");
    }
    safetrip_core::gateway::serve(&config).await?;
    Ok(())
}

fn handle_predict(input: &RiskInput, json: bool, workspace: &Path) -> anyhow::Result<()> {
    let config = load(workspace)?;
    let result = AccidentPredictor::with_profile(config.scoring).predict(input);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(&result));
    }
    Ok(())
}

/// Human-readable rendering of a prediction.
fn render_result(result: &RiskResult) -> String {
    let mut out = format!(
        "Risk: {} ({}%)\n{}\n",
        result.level, result.probability, result.message
    );
    if !result.contributing_factors.is_empty() {
        out.push_str("Contributing factors:\n");
        for factor in &result.contributing_factors {
            out.push_str(&format!("  - {factor}\n"));
        }
    }
    out
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let (config_path, created) = safetrip_core::config::write_default_config(workspace)?;
            if created {
                println!("Created default configuration at: {}", config_path.display());
            } else {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        let command = Commands::Config {
            action: ConfigAction::Init,
        };
        handle_command(command, workspace).await.unwrap();

        let config_path = workspace.join(".safetrip").join("config.toml");
        assert!(config_path.exists());

        let content = std::fs::read_to_string(&config_path).unwrap();
        let parsed: SafeTripConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.gateway.port, 5000);
        assert_eq!(parsed.gateway.rate_limit.max_requests, 100);
    }

    #[tokio::test]
    async fn test_config_init_idempotent() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        let command = Commands::Config {
            action: ConfigAction::Init,
        };
        handle_command(command, workspace).await.unwrap();

        let config_path = workspace.join(".safetrip").join("config.toml");
        std::fs::write(&config_path, "[gateway]\nport = 6000\n").unwrap();

        let command = Commands::Config {
            action: ConfigAction::Init,
        };
        handle_command(command, workspace).await.unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert_eq!(content, "[gateway]\nport = 6000\n");
    }

    #[tokio::test]
    async fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        let command = Commands::Config {
            action: ConfigAction::Show,
        };
        handle_command(command, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_predict_runs_with_workspace_profile() {
        let dir = TempDir::new().unwrap();
        let command = Commands::Predict {
            speed: 130.0,
            weather: "Rain".into(),
            hour: Some(2),
            traffic: "heavy".into(),
            incidents: 4,
            json: true,
        };
        handle_command(command, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_weather_risk_command() {
        let dir = TempDir::new().unwrap();
        let command = Commands::WeatherRisk {
            condition: "Fog".into(),
            wind: None,
            visibility: Some(300.0),
        };
        handle_command(command, dir.path()).await.unwrap();
    }

    #[test]
    fn test_render_result_lists_factors() {
        let input = RiskInput::new(130.0, "Clear", 12, "light", 0);
        let result = AccidentPredictor::new().predict(&input);
        let rendered = render_result(&result);
        assert!(rendered.starts_with(&format!("Risk: {} ({}%)\n", result.level, result.probability)));
        assert!(rendered.contains("Contributing factors:\n  - "));
    }

    #[test]
    fn test_render_result_without_factors() {
        let input = RiskInput::new(30.0, "Clear", 12, "light", 0);
        let result = AccidentPredictor::new().predict(&input);
        let rendered = render_result(&result);
        assert!(!rendered.contains("Contributing factors"));
        assert!(rendered.contains(&result.message));
    }
}
