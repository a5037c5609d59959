//! Service configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables (a `.env` file in the working directory is loaded
//! first). Every field has a default, so running with no file at all works.
//!
//! ```toml
//! api_base_url = "https://api.gios.gov.pl/pjp-api/rest"
//! cache_path = "data/air_quality_data.json"
//! log_level = "info"
//! # log_file = "aqmon.log"
//! # request_timeout_secs = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::{AirQualityError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.gios.gov.pl/pjp-api/rest";
pub const DEFAULT_CACHE_PATH: &str = "data/air_quality_data.json";
pub const DEFAULT_CONFIG_PATH: &str = "./aqmon.toml";

const ENV_API_BASE_URL: &str = "AQMON_API_BASE_URL";
const ENV_CACHE_PATH: &str = "AQMON_CACHE_PATH";
const ENV_LOG_LEVEL: &str = "AQMON_LOG_LEVEL";
const ENV_LOG_FILE: &str = "AQMON_LOG_FILE";
const ENV_TIMEOUT_SECS: &str = "AQMON_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Root of the remote REST API; endpoint paths are appended to it.
    pub api_base_url: String,
    /// Location of the JSON cache document.
    pub cache_path: PathBuf,
    pub log_level: String,
    pub log_file: Option<String>,
    /// `None` leaves the HTTP client's own default in place.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            log_level: "info".to_string(),
            log_file: None,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| AirQualityError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the TOML file at `path`; an absent file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            AirQualityError::Config(msg) => AirQualityError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// File settings, then `.env`, then process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `AQMON_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(path) = lookup(ENV_CACHE_PATH) {
            self.cache_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(file) = lookup(ENV_LOG_FILE) {
            self.log_file = if file.trim().is_empty() { None } else { Some(file) };
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                AirQualityError::Config(format!("{} must be a whole number of seconds: {}", ENV_TIMEOUT_SECS, e))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        self.validate()
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        self.log_level.parse().map_err(AirQualityError::Config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(AirQualityError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(AirQualityError::Config("cache_path must not be empty".to_string()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(AirQualityError::Config("request_timeout_secs must be positive".to_string()));
        }
        self.log_level()?;
        Ok(())
    }
}
