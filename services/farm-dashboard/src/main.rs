//! Farm dashboard CLI
//!
//! One-shot queries against the sensor backend, or a `watch` loop that keeps
//! polling and logs each update.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use farm_dashboard::{load_config, Config, DashboardClient, NewReading, PollTarget};
use tracing::Level;

#[derive(Parser)]
#[command(name = "farm-dashboard")]
#[command(about = "Soil-moisture dashboard client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file and environment)
    #[arg(long)]
    backend_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the most recent readings
    Latest,
    /// Print the readings of one sensor
    Sensor { sensor_id: String },
    /// Print the latest reading and the average
    Stats,
    /// Store a new reading
    Submit {
        #[arg(long)]
        sensor_id: String,
        #[arg(long)]
        moisture: f64,
        #[arg(long)]
        raw: f64,
        #[arg(long)]
        dry: f64,
        #[arg(long)]
        wet: f64,
    },
    /// Poll the configured target until Ctrl-C
    Watch {
        /// Polling interval in milliseconds (overrides config file)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Poll one sensor instead of the configured target
        #[arg(long)]
        sensor_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, backend_url={:?}, log_level={:?}",
        args.config,
        args.backend_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env();
    config.apply_backend_override(args.backend_url);

    match args.command {
        Command::Latest => print_json(&client_for(&config)?.fetch_latest().await?)?,
        Command::Sensor { sensor_id } => {
            print_json(&client_for(&config)?.fetch_by_sensor(&sensor_id).await?)?
        }
        Command::Stats => print_json(&client_for(&config)?.fetch_stats().await?)?,
        Command::Submit {
            sensor_id,
            moisture,
            raw,
            dry,
            wet,
        } => {
            let reading = NewReading {
                sensor_id,
                moisture_value: moisture,
                raw_value: raw,
                dry_value: dry,
                wet_value: wet,
            };
            print_json(&client_for(&config)?.submit_reading(&reading).await?)?
        }
        Command::Watch {
            interval_ms,
            sensor_id,
        } => {
            if let Some(interval_ms) = interval_ms {
                config.polling.interval_ms = interval_ms;
            }
            if let Some(sensor_id) = sensor_id {
                config.polling.target = PollTarget::Sensor { sensor_id };
            }
            tracing::info!("Starting farm dashboard against {}", config.client.base_url);
            farm_dashboard::run(config).await?;
        }
    }

    Ok(())
}

fn client_for(config: &Config) -> farm_dashboard::Result<DashboardClient> {
    config.validate()?;
    DashboardClient::from_config(&config.client)
}

fn print_json<T: serde::Serialize>(value: &T) -> farm_dashboard::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
