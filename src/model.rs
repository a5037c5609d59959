//! Core data types for the air-quality monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! stations, sensors, measurements, air-quality index snapshots and the
//! crate-wide error type. It performs no I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sentinels and index keys
// ---------------------------------------------------------------------------

/// Value stored for a measurement the remote service reported as `null`.
/// Always fails `Measurement::is_valid`.
pub const MISSING_VALUE: f64 = -1.0;

/// Overall index level for a station.
pub const INDEX_OVERALL: &str = "Ogólny";
pub const INDEX_PM10: &str = "PM10";
pub const INDEX_PM25: &str = "PM2.5";
pub const INDEX_O3: &str = "O3";
pub const INDEX_NO2: &str = "NO2";
pub const INDEX_SO2: &str = "SO2";
pub const INDEX_CO: &str = "CO";

// ---------------------------------------------------------------------------
// Domain records
// ---------------------------------------------------------------------------

/// A fixed air-quality monitoring location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: i64,
    pub name: String,
}

impl Station {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// An instrument at a station measuring one parameter.
///
/// `parameter_formula` is empty when the sensor was rebuilt from the local
/// cache, which only stores the parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub id: i64,
    pub parameter_name: String,
    pub parameter_formula: String,
}

impl Sensor {
    pub fn new(id: i64, parameter_name: impl Into<String>, parameter_formula: impl Into<String>) -> Self {
        Self {
            id,
            parameter_name: parameter_name.into(),
            parameter_formula: parameter_formula.into(),
        }
    }
}

/// A single timestamped reading from a sensor.
///
/// Serialized as `{"date": ..., "value": ...}`, the layout used by both the
/// remote service and the cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "date")]
    pub timestamp: String, // "YYYY-MM-DD HH:MM:SS"
    pub value: f64,
}

impl Measurement {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self { timestamp: timestamp.into(), value }
    }

    /// A reading the remote service had no value for.
    pub fn missing(timestamp: impl Into<String>) -> Self {
        Self::new(timestamp, MISSING_VALUE)
    }

    /// Valid iff `value >= 0`. The `MISSING_VALUE` sentinel and NaN are invalid.
    pub fn is_valid(&self) -> bool {
        self.value >= 0.0
    }
}

/// Pollutant key (see `INDEX_*`) to textual quality level.
///
/// Only keys the source actually supplied are present.
pub type AirQualityIndex = BTreeMap<String, String>;

/// Keeps the valid measurements of a series, in order.
pub fn valid_only(measurements: &[Measurement]) -> Vec<Measurement> {
    measurements.iter().filter(|m| m.is_valid()).cloned().collect()
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// How a transport failure should be reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// DNS failure, refused connection or timeout.
    Connectivity,
    /// Any other failure, including non-2xx responses.
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Connectivity => write!(f, "No connection to the monitoring service"),
            TransportKind::Other => write!(f, "Failed to fetch data"),
        }
    }
}

/// Errors that can arise when fetching, caching or configuring.
///
/// A missing cache entry is not an error; lookups return `Option` instead.
#[derive(Debug, thiserror::Error)]
pub enum AirQualityError {
    #[error("{kind}: {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AirQualityError {
    /// Every transport failure sends the session into offline mode.
    pub fn is_offline_trigger(&self) -> bool {
        matches!(self, AirQualityError::Transport { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AirQualityError::Transport { kind: TransportKind::Connectivity, .. }
        )
    }
}

impl From<serde_json::Error> for AirQualityError {
    fn from(err: serde_json::Error) -> Self {
        AirQualityError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AirQualityError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
