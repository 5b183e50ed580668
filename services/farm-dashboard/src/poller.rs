//! Poller: keeps the latest result of one API operation fresh
//!
//! A [`Poller`] fetches once as soon as it is started and then on a fixed
//! period until stopped. Every completed fetch is published to a
//! [`tokio::sync::watch`] cell holding a [`PollState`]. A failed fetch sets the
//! error slot and leaves the last good payload in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::DashboardClient;
use crate::error::DashboardError;
use crate::reading::{SensorReading, Stats, Summary};

/// Something a [`Poller`] can fetch on every tick
#[async_trait]
pub trait Source: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Name used in log output
    fn name(&self) -> &str;

    async fn fetch(&self) -> crate::Result<Self::Output>;
}

/// `GET /dashboard/latest`
#[derive(Debug)]
pub struct LatestReadings {
    client: Arc<DashboardClient>,
}

impl LatestReadings {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Source for LatestReadings {
    type Output = Vec<SensorReading>;

    fn name(&self) -> &str {
        "latest"
    }

    async fn fetch(&self) -> crate::Result<Self::Output> {
        self.client.fetch_latest().await
    }
}

/// `GET /dashboard/sensor/{sensor_id}`
#[derive(Debug)]
pub struct SensorReadings {
    client: Arc<DashboardClient>,
    sensor_id: String,
}

impl SensorReadings {
    pub fn new(client: Arc<DashboardClient>, sensor_id: impl Into<String>) -> Self {
        Self {
            client,
            sensor_id: sensor_id.into(),
        }
    }
}

#[async_trait]
impl Source for SensorReadings {
    type Output = Vec<SensorReading>;

    fn name(&self) -> &str {
        &self.sensor_id
    }

    async fn fetch(&self) -> crate::Result<Self::Output> {
        self.client.fetch_by_sensor(&self.sensor_id).await
    }
}

/// `GET /dashboard/stats`
#[derive(Debug)]
pub struct StatsReading {
    client: Arc<DashboardClient>,
}

impl StatsReading {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Source for StatsReading {
    type Output = Stats;

    fn name(&self) -> &str {
        "stats"
    }

    async fn fetch(&self) -> crate::Result<Self::Output> {
        self.client.fetch_stats().await
    }
}

/// The published result cell
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<T> {
    /// Payload of the last successful fetch, kept across failures
    pub data: Option<T>,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
    /// True until the first fetch completes
    pub loading: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub consecutive_errors: u32,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: true,
            updated_at: None,
            consecutive_errors: 0,
        }
    }
}

impl<T> PollState<T> {
    fn record_success(&mut self, data: T, now: DateTime<Utc>) {
        self.data = Some(data);
        self.error = None;
        self.loading = false;
        self.updated_at = Some(now);
        self.consecutive_errors = 0;
    }

    fn record_failure(&mut self, error: &DashboardError, now: DateTime<Utc>) {
        self.error = Some(error.to_string());
        self.loading = false;
        self.updated_at = Some(now);
        self.consecutive_errors += 1;
    }
}

impl<T: Summary> PollState<T> {
    /// Status line in the order a reader cares about: loading, error, data
    pub fn headline(&self) -> String {
        if self.loading {
            return "Loading...".to_string();
        }
        if let Some(error) = &self.error {
            return error.clone();
        }
        self.data
            .as_ref()
            .and_then(Summary::summary)
            .unwrap_or_else(|| "No data".to_string())
    }
}

struct Run {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polling controller for a single [`Source`].
///
/// Idle until [`start`](Poller::start). While active, a background task
/// fetches on a fixed period measured from `start`. A tick that comes due
/// while a fetch is still running fires once that fetch completes; further
/// missed ticks are dropped, so fetches never overlap. Dropping the poller
/// stops it.
pub struct Poller<S: Source> {
    source: Arc<S>,
    period: Duration,
    state: Arc<watch::Sender<PollState<S::Output>>>,
    run: Option<Run>,
}

impl<S: Source> std::fmt::Debug for Poller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source.name())
            .field("period", &self.period)
            .field("active", &self.is_active())
            .finish()
    }
}

impl<S: Source> Poller<S> {
    /// Create an idle poller. `period` must be non-zero.
    pub fn new(source: S, period: Duration) -> crate::Result<Self> {
        if period.is_zero() {
            return Err(DashboardError::Config(format!(
                "Polling period for '{}' must be greater than zero",
                source.name()
            )));
        }
        let (state, _) = watch::channel(PollState::default());
        Ok(Self {
            source: Arc::new(source),
            period,
            state: Arc::new(state),
            run: None,
        })
    }

    /// Start polling. Fetches immediately, then every `period`.
    ///
    /// Must be called from within a tokio runtime. Does nothing if already
    /// active.
    pub fn start(&mut self) {
        if self.is_active() {
            tracing::debug!("Poller '{}' already active", self.source.name());
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            self.period,
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        tracing::info!(
            "Poller '{}' started (period {:?})",
            self.source.name(),
            self.period
        );
        self.run = Some(Run { cancel, handle });
    }

    /// Stop polling. Idempotent.
    ///
    /// No publication happens after this returns. A fetch already in flight
    /// is allowed to finish but its result is dropped.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            self.cancel(&run);
            tracing::info!("Poller '{}' stopped", self.source.name());
        }
    }

    /// Stop polling and wait for the background task to exit, including any
    /// fetch that was in flight
    pub async fn stop_and_join(&mut self) {
        if let Some(run) = self.run.take() {
            self.cancel(&run);
            if let Err(e) = run.handle.await {
                tracing::warn!("Poller '{}' task failed: {}", self.source.name(), e);
            }
            tracing::info!("Poller '{}' stopped", self.source.name());
        }
    }

    // Cancel while holding the cell's write lock so a concurrent publish
    // either lands before this point or sees the cancellation.
    fn cancel(&self, run: &Run) {
        self.state.send_if_modified(|_| {
            run.cancel.cancel();
            false
        });
    }

    pub fn is_active(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.cancel.is_cancelled() && !run.handle.is_finished())
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<PollState<S::Output>> {
        self.state.subscribe()
    }

    /// Snapshot of the published state
    pub fn state(&self) -> PollState<S::Output> {
        self.state.borrow().clone()
    }
}

impl<S: Source> Drop for Poller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<S: Source>(
    source: Arc<S>,
    period: Duration,
    state: Arc<watch::Sender<PollState<S::Output>>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tracing::debug!("Polling '{}'", source.name());
        let result = source.fetch().await;
        if let Err(e) = &result {
            tracing::warn!("Poll of '{}' failed: {}", source.name(), e);
        }

        if !publish(&state, &cancel, result) {
            tracing::debug!(
                "Poller '{}' stopped during fetch, result discarded",
                source.name()
            );
            break;
        }
    }

    tracing::debug!("Polling loop for '{}' exited", source.name());
}

/// Write a fetch result into the cell unless the run has been cancelled.
/// Returns false when the result was discarded.
fn publish<T>(
    state: &watch::Sender<PollState<T>>,
    cancel: &CancellationToken,
    result: crate::Result<T>,
) -> bool {
    let now = Utc::now();
    state.send_if_modified(|current| {
        if cancel.is_cancelled() {
            return false;
        }
        match result {
            Ok(data) => current.record_success(data, now),
            Err(e) => current.record_failure(&e, now),
        }
        true
    })
}
