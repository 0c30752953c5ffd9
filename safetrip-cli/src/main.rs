//! SafeTrip CLI: run the driving-safety gateway or score risk from the terminal.

mod commands;

use clap::Parser;
use safetrip_core::predictor::{DEFAULT_TRAFFIC, DEFAULT_WEATHER};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// SafeTrip: accident-risk scoring and road-safety gateway
#[derive(Parser, Debug)]
#[command(name = "safetrip", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds `.safetrip/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score accident risk for a single set of driving conditions
    Predict {
        /// Vehicle speed in km/h
        #[arg(short, long, default_value_t = 0.0)]
        speed: f64,
        /// Weather condition, e.g. "Rain" or "Fog"
        #[arg(long, default_value = DEFAULT_WEATHER)]
        weather: String,
        /// Hour of day (defaults to the current local hour)
        #[arg(long)]
        hour: Option<i64>,
        /// Traffic level: light, moderate, heavy, severe
        #[arg(long, default_value = DEFAULT_TRAFFIC)]
        traffic: String,
        /// Prior incidents recorded at this location
        #[arg(long, default_value_t = 0)]
        incidents: u32,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
    /// Classify driving risk from raw weather observations
    WeatherRisk {
        /// Headline condition, e.g. "Thunderstorm"
        condition: String,
        /// Wind speed in m/s
        #[arg(long)]
        wind: Option<f64>,
        /// Visibility in metres
        #[arg(long)]
        visibility: Option<f64>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default `.safetrip/config.toml` into the workspace
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "safetrip", "safetrip")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "safetrip.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace).await
}
