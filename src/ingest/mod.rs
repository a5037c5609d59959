//! Remote data sources.
//!
//! - `gios`: blocking client for the GIOS air-quality REST API.

pub mod gios;

use crate::model::{AirQualityIndex, Measurement, Result, Sensor, Station};

/// The four read operations a remote air-quality source offers.
///
/// Each call runs to completion and is independent of the others; a
/// failure is reported immediately and never retried.
pub trait AirQualitySource {
    fn list_stations(&self) -> Result<Vec<Station>>;

    fn list_sensors(&self, station_id: i64) -> Result<Vec<Sensor>>;

    /// Full unfiltered series; missing readings carry the sentinel value.
    fn get_measurements(&self, sensor_id: i64) -> Result<Vec<Measurement>>;

    fn get_air_quality_index(&self, station_id: i64) -> Result<AirQualityIndex>;
}
