//! GIOS (Chief Inspectorate of Environmental Protection) air-quality API client
//!
//! Retrieves the station list, per-station sensors, per-sensor measurement
//! series and per-station air-quality index from the public GIOS REST API.
//! All endpoints are plain unauthenticated GETs returning JSON.
//!
//! API Documentation: https://powietrze.gios.gov.pl/pjp/content/api

use serde::Deserialize;

use crate::config::AppConfig;
use crate::ingest::AirQualitySource;
use crate::logging;
use crate::model::{
    AirQualityError, AirQualityIndex, Measurement, Result, Sensor, Station, TransportKind,
    INDEX_CO, INDEX_NO2, INDEX_O3, INDEX_OVERALL, INDEX_PM10, INDEX_PM25, INDEX_SO2,
};

// ============================================================================
// GIOS API Response Structures
// ============================================================================

/// Entry of `/station/findAll`
#[derive(Debug, Deserialize)]
pub struct GiosStation {
    pub id: i64,
    #[serde(rename = "stationName", default)]
    pub station_name: Option<String>,
}

/// Entry of `/station/sensors/{stationId}`
#[derive(Debug, Deserialize)]
pub struct GiosSensor {
    pub id: i64,
    #[serde(default)]
    pub param: Option<GiosParam>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GiosParam {
    #[serde(rename = "paramName", default)]
    pub param_name: Option<String>,
    #[serde(rename = "paramFormula", default)]
    pub param_formula: Option<String>,
}

/// Body of `/data/getData/{sensorId}`
#[derive(Debug, Deserialize)]
pub struct GiosDataResponse {
    #[serde(default)]
    pub values: Vec<GiosValue>,
}

#[derive(Debug, Deserialize)]
pub struct GiosValue {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub value: Option<f64>, // null while the hour is not yet measured
}

/// Body of `/aqindex/getIndex/{stationId}`
///
/// Each sublevel is `null` when the station does not measure it.
#[derive(Debug, Deserialize)]
pub struct GiosIndexResponse {
    #[serde(rename = "stIndexLevel", default)]
    pub overall: Option<GiosIndexLevel>,
    #[serde(rename = "pm10IndexLevel", default)]
    pub pm10: Option<GiosIndexLevel>,
    #[serde(rename = "pm25IndexLevel", default)]
    pub pm25: Option<GiosIndexLevel>,
    #[serde(rename = "o3IndexLevel", default)]
    pub o3: Option<GiosIndexLevel>,
    #[serde(rename = "no2IndexLevel", default)]
    pub no2: Option<GiosIndexLevel>,
    #[serde(rename = "so2IndexLevel", default)]
    pub so2: Option<GiosIndexLevel>,
    #[serde(rename = "coIndexLevel", default)]
    pub co: Option<GiosIndexLevel>,
}

#[derive(Debug, Deserialize)]
pub struct GiosIndexLevel {
    #[serde(rename = "indexLevelName", default)]
    pub index_level_name: Option<String>,
}

// ============================================================================
// URL Construction
// ============================================================================

pub fn stations_url(base_url: &str) -> String {
    format!("{}/station/findAll", base_url.trim_end_matches('/'))
}

pub fn sensors_url(base_url: &str, station_id: i64) -> String {
    format!("{}/station/sensors/{}", base_url.trim_end_matches('/'), station_id)
}

pub fn measurements_url(base_url: &str, sensor_id: i64) -> String {
    format!("{}/data/getData/{}", base_url.trim_end_matches('/'), sensor_id)
}

pub fn index_url(base_url: &str, station_id: i64) -> String {
    format!("{}/aqindex/getIndex/{}", base_url.trim_end_matches('/'), station_id)
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Parse the station list. An unparsable body is an error, never an empty list.
///
/// Text fields that are missing or `null` read as empty strings.
pub fn parse_stations(body: &str) -> Result<Vec<Station>> {
    let raw: Vec<GiosStation> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .map(|s| Station::new(s.id, s.station_name.unwrap_or_default()))
        .collect())
}

pub fn parse_sensors(body: &str) -> Result<Vec<Sensor>> {
    let raw: Vec<GiosSensor> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .map(|s| {
            let param = s.param.unwrap_or_default();
            Sensor::new(
                s.id,
                param.param_name.unwrap_or_default(),
                param.param_formula.unwrap_or_default(),
            )
        })
        .collect())
}

/// Parse a measurement series; `null` values become the missing-value sentinel.
pub fn parse_measurements(body: &str) -> Result<Vec<Measurement>> {
    let raw: GiosDataResponse = serde_json::from_str(body)?;
    Ok(raw
        .values
        .into_iter()
        .map(|v| {
            let date = v.date.unwrap_or_default();
            match v.value {
                Some(value) => Measurement::new(date, value),
                None => Measurement::missing(date),
            }
        })
        .collect())
}

/// Parse an index snapshot, keeping only sublevels the service supplied.
pub fn parse_air_quality_index(body: &str) -> Result<AirQualityIndex> {
    let raw: GiosIndexResponse = serde_json::from_str(body)?;

    let levels = [
        (INDEX_OVERALL, raw.overall),
        (INDEX_PM10, raw.pm10),
        (INDEX_PM25, raw.pm25),
        (INDEX_O3, raw.o3),
        (INDEX_NO2, raw.no2),
        (INDEX_SO2, raw.so2),
        (INDEX_CO, raw.co),
    ];

    Ok(levels
        .into_iter()
        .filter_map(|(key, level)| {
            level.map(|l| (key.to_string(), l.index_level_name.unwrap_or_default()))
        })
        .collect())
}

// ============================================================================
// API Client
// ============================================================================

/// Turn a reqwest failure into a transport error, separating lost
/// connectivity (DNS, refused connection, timeout) from everything else.
pub fn classify_transport_error(err: &reqwest::Error) -> AirQualityError {
    let kind = if err.is_connect() || err.is_timeout() {
        TransportKind::Connectivity
    } else {
        TransportKind::Other
    };
    AirQualityError::Transport {
        kind,
        message: err.to_string(),
    }
}

/// Blocking client for the GIOS REST API.
///
/// Holds no state between calls besides the connection pool; every call
/// is a single GET with no retries.
pub struct GiosClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl GiosClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::build(config.api_base_url.clone(), config.request_timeout())
    }

    fn build(base_url: String, timeout: Option<std::time::Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| classify_transport_error(&e))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and return the body of a 2xx response.
    fn fetch_body(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| classify_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(AirQualityError::Transport {
                kind: TransportKind::Other,
                message: format!("HTTP error: {}", response.status()),
            });
        }

        response.text().map_err(|e| classify_transport_error(&e))
    }

    fn fetch_and_parse<T>(
        &self,
        url: &str,
        subject: &str,
        operation: &str,
        parse: fn(&str) -> Result<T>,
    ) -> Result<T> {
        logging::debug(logging::DataSource::Gios, Some(subject), &format!("GET {}", url));
        let result = self.fetch_body(url).and_then(|body| parse(&body));
        if let Err(ref err) = result {
            logging::log_remote_failure(subject, operation, err);
        }
        result
    }
}

impl AirQualitySource for GiosClient {
    fn list_stations(&self) -> Result<Vec<Station>> {
        self.fetch_and_parse(&stations_url(&self.base_url), "all", "list stations", parse_stations)
    }

    fn list_sensors(&self, station_id: i64) -> Result<Vec<Sensor>> {
        self.fetch_and_parse(
            &sensors_url(&self.base_url, station_id),
            &format!("station {}", station_id),
            "list sensors",
            parse_sensors,
        )
    }

    fn get_measurements(&self, sensor_id: i64) -> Result<Vec<Measurement>> {
        self.fetch_and_parse(
            &measurements_url(&self.base_url, sensor_id),
            &format!("sensor {}", sensor_id),
            "get measurements",
            parse_measurements,
        )
    }

    fn get_air_quality_index(&self, station_id: i64) -> Result<AirQualityIndex> {
        self.fetch_and_parse(
            &index_url(&self.base_url, station_id),
            &format!("station {}", station_id),
            "get air quality index",
            parse_air_quality_index,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
