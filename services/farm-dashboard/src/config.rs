//! Configuration types for the farm dashboard client

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `client.base_url`
pub const BACKEND_URL_ENV: &str = "DASHBOARD_BACKEND_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Settings for the backend API client, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Extra headers sent on every request. `Content-Type: application/json`
    /// is always sent.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Keep and replay cookies set by the backend
    #[serde(default = "default_true")]
    pub with_credentials: bool,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            headers: BTreeMap::new(),
            with_credentials: true,
        }
    }
}

/// Polling controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub target: PollTarget,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            target: PollTarget::default(),
        }
    }
}

/// Which API operation the poller keeps fresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollTarget {
    #[default]
    Latest,
    Sensor {
        sensor_id: String,
    },
    Stats,
}

fn default_base_url() -> String {
    "http://localhost:3005".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
    }

    /// Replace the base URL when `value` is present and non-empty
    pub fn apply_backend_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Backend URL overridden to {}", url);
            self.client.base_url = url;
        }
    }

    /// Check the values that would otherwise fail later at request time
    pub fn validate(&self) -> crate::Result<()> {
        if self.client.timeout_ms == 0 {
            return Err(crate::DashboardError::Config(
                "client.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.interval_ms == 0 {
            return Err(crate::DashboardError::Config(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        reqwest::Url::parse(&self.client.base_url).map_err(|e| {
            crate::DashboardError::Config(format!(
                "Invalid base URL {:?}: {}",
                self.client.base_url, e
            ))
        })?;
        if let PollTarget::Sensor { sensor_id } = &self.polling.target {
            crate::client::check_sensor_path_id(sensor_id).map_err(|e| {
                crate::DashboardError::Config(format!("polling.target.sensor_id: {}", e))
            })?;
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
