//! Local cache of previously saved air-quality data.
//!
//! Everything lives in one pretty-printed JSON document with three
//! top-level mappings:
//!
//! ```json
//! {
//!   "stations": { "114": { "name": "...", "sensors": { "642": "dwutlenek azotu" } } },
//!   "data":     { "114_642": [ { "date": "2024-05-01 13:00:00", "value": 17.3 } ] },
//!   "indexes":  { "index_114": { "Ogólny": "Dobry", "NO2": "Dobry" } }
//! }
//! ```
//!
//! The document is loaded once and kept in memory. Each save writes the
//! whole document to a temporary file next to the target and renames it
//! into place; the in-memory copy is only updated once that succeeded, so
//! memory and disk never disagree. Single process, single writer.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::logging::{self, DataSource};
use crate::model::{
    valid_only, AirQualityError, AirQualityIndex, Measurement, Result, Sensor, Station,
};

// ---------------------------------------------------------------------------
// Document layout
// ---------------------------------------------------------------------------

/// Station entry: display name plus sensor id → parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedStation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sensors: BTreeMap<String, String>,
}

/// The whole cache file. Any mapping missing from the file loads empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default)]
    pub stations: BTreeMap<String, CachedStation>,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Measurement>>,
    /// Loads empty when the file holds anything other than an object here;
    /// the next save writes a proper mapping back.
    #[serde(default, deserialize_with = "object_or_empty")]
    pub indexes: BTreeMap<String, AirQualityIndex>,
}

fn object_or_empty<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, AirQualityIndex>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        value @ serde_json::Value::Object(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        other => {
            logging::warn(
                DataSource::Cache,
                Some("indexes"),
                &format!("Expected an object, found {}; treating as empty", other),
            );
            Ok(BTreeMap::new())
        }
    }
}

/// Composite key addressing one measurement series.
pub fn series_key(station_id: i64, sensor_id: i64) -> String {
    format!("{}_{}", station_id, sensor_id)
}

pub fn index_key(station_id: i64) -> String {
    format!("index_{}", station_id)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct CacheStore {
    path: PathBuf,
    document: CacheDocument,
}

impl CacheStore {
    /// Open the cache at `path` and load it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            document: CacheDocument::default(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &CacheDocument {
        &self.document
    }

    /// (Re)read the backing file.
    ///
    /// A missing file is a fresh, empty cache. A file that exists but is
    /// not a valid cache document is a `Parse` error and leaves the
    /// in-memory document untouched.
    pub fn load(&mut self) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                logging::info(
                    DataSource::Cache,
                    None,
                    &format!("No cache at {}, starting empty", self.path.display()),
                );
                self.document = CacheDocument::default();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let document: CacheDocument = serde_json::from_str(&contents).map_err(|e| {
            AirQualityError::Parse(format!("cache file {}: {}", self.path.display(), e))
        })?;

        logging::debug(
            DataSource::Cache,
            None,
            &format!(
                "Loaded {} stations, {} series, {} index snapshots",
                document.stations.len(),
                document.data.len(),
                document.indexes.len()
            ),
        );
        self.document = document;
        Ok(())
    }

    /// Store one sensor's series and persist the document.
    ///
    /// - the station entry is created if absent (an existing name is kept)
    /// - the sensor name is always overwritten
    /// - the series at `"{station}_{sensor}"` is replaced by the valid
    ///   subset of `measurements`, in order
    /// - the station's index snapshot is replaced only if `index` is non-empty
    ///
    /// On error nothing changes, on disk or in memory.
    pub fn save(
        &mut self,
        station_id: i64,
        station_name: &str,
        sensor_id: i64,
        sensor_name: &str,
        measurements: &[Measurement],
        index: &AirQualityIndex,
    ) -> Result<()> {
        let mut next = self.document.clone();

        let station = next
            .stations
            .entry(station_id.to_string())
            .or_insert_with(|| CachedStation {
                name: station_name.to_string(),
                sensors: BTreeMap::new(),
            });
        station
            .sensors
            .insert(sensor_id.to_string(), sensor_name.to_string());

        let series = valid_only(measurements);
        let stored = series.len();
        let key = series_key(station_id, sensor_id);
        next.data.insert(key.clone(), series);

        if !index.is_empty() {
            next.indexes.insert(index_key(station_id), index.clone());
        }

        if let Err(e) = self.persist(&next) {
            logging::error(
                DataSource::Cache,
                Some(&key),
                &format!("Failed to write {}: {}", self.path.display(), e),
            );
            return Err(e);
        }
        self.document = next;

        logging::log_save_summary(&key, measurements.len(), stored);
        Ok(())
    }

    /// Write `document` next to the target and rename it into place.
    fn persist(&self, document: &CacheDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut contents = serde_json::to_string_pretty(document).map_err(std::io::Error::from)?;
        contents.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AirQualityError::Io(e.error))?;
        Ok(())
    }

    /// The cached series for a station/sensor pair, or `None` if it was
    /// never saved. An empty `Vec` means a series was saved with no valid points.
    pub fn load_measurements(&self, station_id: i64, sensor_id: i64) -> Option<Vec<Measurement>> {
        self.document
            .data
            .get(&series_key(station_id, sensor_id))
            .cloned()
    }

    /// Every saved station, in key order.
    pub fn list_saved_stations(&self) -> Vec<Station> {
        self.document
            .stations
            .iter()
            .filter_map(|(key, entry)| match key.parse::<i64>() {
                Ok(id) => Some(Station::new(id, entry.name.clone())),
                Err(_) => {
                    logging::warn(
                        DataSource::Cache,
                        Some(key),
                        "Skipping station entry with non-numeric id",
                    );
                    None
                }
            })
            .collect()
    }

    /// Saved sensors of a station. The formula is not cached, so it is empty.
    pub fn list_saved_sensors(&self, station_id: i64) -> Vec<Sensor> {
        let Some(station) = self.document.stations.get(&station_id.to_string()) else {
            return Vec::new();
        };

        station
            .sensors
            .iter()
            .filter_map(|(key, name)| match key.parse::<i64>() {
                Ok(id) => Some(Sensor::new(id, name.clone(), "")),
                Err(_) => {
                    logging::warn(
                        DataSource::Cache,
                        Some(key),
                        "Skipping sensor entry with non-numeric id",
                    );
                    None
                }
            })
            .collect()
    }

    /// The saved index snapshot of a station, or `None` if there is none.
    pub fn load_air_quality_index(&self, station_id: i64) -> Option<AirQualityIndex> {
        self.document
            .indexes
            .get(&index_key(station_id))
            .filter(|index| !index.is_empty())
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
