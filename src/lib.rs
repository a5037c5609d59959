//! Air-quality monitoring core.
//!
//! Fetches stations, sensors, measurement series and air-quality index
//! snapshots from the GIOS REST API, keeps a local JSON cache for offline
//! use, and derives summary statistics from a series.
//!
//! Modules:
//! - `model`   : domain records and the crate error type
//! - `ingest`  : remote data sources (`ingest::gios`)
//! - `cache`   : the single-document local cache
//! - `analysis`: extrema, mean, trend and date-range selection
//! - `session` : picks online or offline mode and routes reads
//! - `config`, `logging`: service plumbing

pub mod analysis;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod session;
