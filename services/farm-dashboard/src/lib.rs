//! Farm dashboard - soil-moisture backend client
//!
//! Talks to the farm sensor backend over HTTP and keeps the latest readings
//! fresh with a fixed-period poller.

pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod poller;
pub mod reading;

pub use client::DashboardClient;
pub use config::{load_config, ClientConfig, Config, PollTarget, PollingConfig};
pub use error::{DashboardError, ErrorKind, Result};
pub use poller::{LatestReadings, PollState, Poller, SensorReadings, Source, StatsReading};
pub use reading::{NewReading, SensorReading, Stats, Summary};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Poll the configured target and log every published state until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let client = Arc::new(DashboardClient::from_config(&config.client)?);
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    let period = config.polling.interval();
    match &config.polling.target {
        PollTarget::Latest => {
            watch(LatestReadings::new(client), period, cancel).await?;
        }
        PollTarget::Sensor { sensor_id } => {
            watch(SensorReadings::new(client, sensor_id.clone()), period, cancel).await?;
        }
        PollTarget::Stats => {
            watch(StatsReading::new(client), period, cancel).await?;
        }
    }

    tracing::info!("Farm dashboard stopped");
    Ok(())
}

/// Run a poller over `source` until `cancel` fires, logging each publication.
/// Returns the last published state.
pub async fn watch<S>(
    source: S,
    period: Duration,
    cancel: CancellationToken,
) -> Result<PollState<S::Output>>
where
    S: Source,
    S::Output: Summary,
{
    let mut poller = Poller::new(source, period)?;
    let mut updates = poller.subscribe();
    poller.start();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.error.is_some() {
                    tracing::warn!(
                        "{} (consecutive errors: {})",
                        state.headline(),
                        state.consecutive_errors
                    );
                } else {
                    tracing::info!("{}", state.headline());
                }
            }
        }
    }

    poller.stop();
    Ok(poller.state())
}
