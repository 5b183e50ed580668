//! Sensor reading wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One soil-moisture measurement as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: String,
    /// Moisture percentage, derived server-side from `raw_value`
    pub moisture_value: f64,
    pub raw_value: f64,
    pub dry_value: f64,
    pub wet_value: f64,
    /// ISO-8601 capture timestamp, kept exactly as the backend sent it
    pub recorded_at: String,
}

impl SensorReading {
    /// Parse `recorded_at` as an RFC 3339 timestamp normalized to UTC
    pub fn recorded_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.recorded_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Whether `raw_value` lies between the calibration bounds.
    ///
    /// Capacitive probes read higher when dry, so the bounds may come in
    /// either order.
    pub fn within_calibration(&self) -> bool {
        let (low, high) = if self.dry_value <= self.wet_value {
            (self.dry_value, self.wet_value)
        } else {
            (self.wet_value, self.dry_value)
        };
        (low..=high).contains(&self.raw_value)
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}% (raw {}) at {}",
            self.sensor_id, self.moisture_value, self.raw_value, self.recorded_at
        )
    }
}

/// A reading submitted for storage; the backend assigns `id` and `recordedAt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReading {
    pub sensor_id: String,
    pub moisture_value: f64,
    pub raw_value: f64,
    pub dry_value: f64,
    pub wet_value: f64,
}

/// Aggregate view returned by `/dashboard/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub latest: SensorReading,
    pub average: f64,
}

/// One-line description of a payload for status output
pub trait Summary {
    /// `None` when the payload holds no reading yet
    fn summary(&self) -> Option<String>;
}

impl Summary for SensorReading {
    fn summary(&self) -> Option<String> {
        Some(format!(
            "Latest Moisture: {}% (raw {})",
            self.moisture_value, self.raw_value
        ))
    }
}

impl Summary for Vec<SensorReading> {
    fn summary(&self) -> Option<String> {
        self.first().and_then(Summary::summary)
    }
}

impl Summary for Stats {
    fn summary(&self) -> Option<String> {
        self.latest
            .summary()
            .map(|latest| format!("{}, average {}%", latest, self.average))
    }
}
