//! Farm dashboard backend API client

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::DashboardError;
use crate::io::{HttpClient, HttpResponse, ReqwestHttpClient};
use crate::reading::{NewReading, SensorReading, Stats};

/// Client for the `/dashboard` REST API.
///
/// Holds no state between calls beyond its configuration. Every failure is
/// returned as a classified [`DashboardError`]; nothing is retried here.
pub struct DashboardClient {
    base_url: Url,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl DashboardClient {
    pub fn new(config: &ClientConfig, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            DashboardError::Config(format!("Invalid base URL {:?}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "Base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        tracing::debug!("Created DashboardClient for {}", base_url);

        Ok(Self { base_url, http })
    }

    /// Build a client backed by the production reqwest transport
    pub fn from_config(config: &ClientConfig) -> crate::Result<Self> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config)?);
        Self::new(config, http)
    }

    /// Most recent reading(s). An empty list means the backend has no data yet.
    pub async fn fetch_latest(&self) -> crate::Result<Vec<SensorReading>> {
        let url = self.endpoint(&["dashboard", "latest"])?;
        decode(self.http.get(&url).await?)
    }

    /// Readings for one sensor
    pub async fn fetch_by_sensor(&self, sensor_id: &str) -> crate::Result<Vec<SensorReading>> {
        check_sensor_path_id(sensor_id)?;
        let url = self.endpoint(&["dashboard", "sensor", sensor_id])?;
        decode(self.http.get(&url).await?)
    }

    /// Latest reading plus the backend-defined average
    pub async fn fetch_stats(&self) -> crate::Result<Stats> {
        let url = self.endpoint(&["dashboard", "stats"])?;
        decode(self.http.get(&url).await?)
    }

    /// Store a new reading, returning it with its server-assigned id and timestamp
    pub async fn submit_reading(&self, reading: &NewReading) -> crate::Result<SensorReading> {
        if reading.sensor_id.trim().is_empty() {
            return Err(DashboardError::InvalidInput(
                "sensor id must not be empty".to_string(),
            ));
        }
        let url = self.endpoint(&["dashboard"])?;
        let body = serde_json::to_value(reading)?;
        decode(self.http.post_json(&url, &body).await?)
    }

    fn endpoint(&self, segments: &[&str]) -> crate::Result<String> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                DashboardError::Config(format!("Base URL {} cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url.into())
    }
}

/// Reject sensor ids that cannot be carried as a single path segment.
///
/// Blank ids are refused, as are `.` and `..`, which URL normalization would
/// collapse into the parent path.
pub(crate) fn check_sensor_path_id(sensor_id: &str) -> crate::Result<()> {
    if sensor_id.trim().is_empty() {
        return Err(DashboardError::InvalidInput(
            "sensor id must not be empty".to_string(),
        ));
    }
    if sensor_id == "." || sensor_id == ".." {
        return Err(DashboardError::InvalidInput(format!(
            "sensor id {:?} is not a valid path segment",
            sensor_id
        )));
    }
    Ok(())
}

/// Turn a response into the expected payload or a `Server`/`Decode` error
fn decode<T: DeserializeOwned>(response: HttpResponse) -> crate::Result<T> {
    if !response.is_success() {
        return Err(DashboardError::Server {
            status: response.status,
            message: server_message(&response),
        });
    }
    serde_json::from_str(&response.body).map_err(|e| DashboardError::Decode(e.to_string()))
}

/// The `message` field of an error body, or a status-derived fallback
fn server_message(response: &HttpResponse) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| match body.get("message")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        })
        .filter(|message| !message.is_empty());

    from_body.unwrap_or_else(|| format!("Request failed with status code {}", response.status))
}
