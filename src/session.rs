//! Online/offline routing for one user session.
//!
//! The mode is decided once, when the session starts: if the remote
//! station list can be fetched the session is online and every read goes
//! to the remote source; otherwise it is offline and every read is served
//! from the local cache. Saving always goes to the cache, and the
//! `cached_*` reads go to it regardless of mode.

use std::fmt;

use crate::cache::CacheStore;
use crate::ingest::AirQualitySource;
use crate::logging::{self, DataSource};
use crate::model::{AirQualityIndex, Measurement, Result, Sensor, Station};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Online,
    Offline,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Online => write!(f, "online"),
            Mode::Offline => write!(f, "offline (local cache)"),
        }
    }
}

pub struct Session<S: AirQualitySource> {
    source: S,
    cache: CacheStore,
    mode: Mode,
    stations: Vec<Station>,
}

impl<S: AirQualitySource> Session<S> {
    /// Fetch the remote station list and pick the mode from the outcome.
    pub fn start(source: S, cache: CacheStore) -> Self {
        match source.list_stations() {
            Ok(stations) => {
                logging::info(
                    DataSource::System,
                    None,
                    &format!("Online mode: {} stations available", stations.len()),
                );
                Self { source, cache, mode: Mode::Online, stations }
            }
            Err(err) => {
                let reason = if err.is_connectivity() { "no connectivity" } else { "remote error" };
                let stations = cache.list_saved_stations();
                logging::warn(
                    DataSource::System,
                    None,
                    &format!(
                        "Station list unavailable ({}), switching to offline mode with {} saved stations",
                        reason,
                        stations.len()
                    ),
                );
                Self { source, cache, mode: Mode::Offline, stations }
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_offline(&self) -> bool {
        self.mode == Mode::Offline
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn find_station(&self, station_id: i64) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Sensors of a station. Offline sensors carry no formula.
    pub fn sensors(&self, station_id: i64) -> Result<Vec<Sensor>> {
        match self.mode {
            Mode::Online => self.source.list_sensors(station_id),
            Mode::Offline => Ok(self.cache.list_saved_sensors(station_id)),
        }
    }

    /// The full unfiltered series of a sensor.
    ///
    /// `Ok(None)` only happens offline, when nothing was saved for the pair.
    pub fn measurements(&self, station_id: i64, sensor_id: i64) -> Result<Option<Vec<Measurement>>> {
        match self.mode {
            Mode::Online => self.source.get_measurements(sensor_id).map(Some),
            Mode::Offline => Ok(self.cache.load_measurements(station_id, sensor_id)),
        }
    }

    /// `Ok(None)` only happens offline, when no snapshot was saved.
    pub fn air_quality_index(&self, station_id: i64) -> Result<Option<AirQualityIndex>> {
        match self.mode {
            Mode::Online => self.source.get_air_quality_index(station_id).map(Some),
            Mode::Offline => Ok(self.cache.load_air_quality_index(station_id)),
        }
    }

    /// The saved series for a pair, read from the cache in either mode.
    pub fn cached_measurements(&self, station_id: i64, sensor_id: i64) -> Option<Vec<Measurement>> {
        self.cache.load_measurements(station_id, sensor_id)
    }

    pub fn cached_air_quality_index(&self, station_id: i64) -> Option<AirQualityIndex> {
        self.cache.load_air_quality_index(station_id)
    }

    /// Save a fetched series to the cache.
    ///
    /// Online, the station's current index snapshot is fetched and saved
    /// alongside; if that fetch fails the series is saved without it.
    pub fn save(&mut self, station: &Station, sensor: &Sensor, measurements: &[Measurement]) -> Result<()> {
        let index = match self.mode {
            Mode::Online => match self.source.get_air_quality_index(station.id) {
                Ok(index) => index,
                Err(err) => {
                    logging::warn(
                        DataSource::System,
                        Some(&format!("station {}", station.id)),
                        &format!("Saving without air quality index: {}", err),
                    );
                    AirQualityIndex::new()
                }
            },
            Mode::Offline => AirQualityIndex::new(),
        };

        self.cache.save(
            station.id,
            &station.name,
            sensor.id,
            &sensor.parameter_name,
            measurements,
            &index,
        )
    }
}
