//! Measurement analysis for the air-quality monitoring service.
//!
//! Pure functions over measurement series; nothing here performs I/O.
//!
//! Submodules:
//! - `analyzer`: extrema, mean and least-squares trend over valid readings.
//! - `window`  : inclusive date-range selection for display.

pub mod analyzer;
pub mod window;

pub use analyzer::{AnalysisSummary, MeasurementAnalyzer, Trend};
pub use window::filter_by_date_range;
