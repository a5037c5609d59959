//! Summary statistics over a measurement series.

use std::fmt;

use crate::model::{valid_only, Measurement};

/// Minimum absolute slope (value units per reading) for a series to count
/// as rising or falling.
pub const TREND_THRESHOLD: f64 = 0.01;

/// Placeholder date returned by `min_date`/`max_date` for an empty series.
pub const NO_DATA: &str = "no data";

/// Returned by `min_value`, `max_value` and `average` for an empty series.
pub const NO_VALUE: f64 = -1.0;

/// Direction of a series, from the least-squares slope over reading index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
    /// Fewer than two valid readings.
    Unknown,
}

impl Trend {
    pub fn description(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
            Trend::Unknown => "unknown (not enough data)",
        }
    }

    fn from_slope(slope: f64) -> Self {
        if slope > TREND_THRESHOLD {
            Trend::Rising
        } else if slope < -TREND_THRESHOLD {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Statistics over the valid readings of a series.
///
/// Invalid readings (negative values, including the missing-value
/// sentinel) are dropped on construction and never looked at again.
#[derive(Debug, Clone)]
pub struct MeasurementAnalyzer {
    valid: Vec<Measurement>,
}

impl MeasurementAnalyzer {
    pub fn new(measurements: &[Measurement]) -> Self {
        Self {
            valid: valid_only(measurements),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.valid.is_empty()
    }

    /// Number of valid readings.
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    /// First reading holding the smallest value.
    fn min_entry(&self) -> Option<&Measurement> {
        self.valid.iter().fold(None, |best, m| match best {
            Some(b) if b.value <= m.value => Some(b),
            _ => Some(m),
        })
    }

    /// First reading holding the largest value.
    fn max_entry(&self) -> Option<&Measurement> {
        self.valid.iter().fold(None, |best, m| match best {
            Some(b) if b.value >= m.value => Some(b),
            _ => Some(m),
        })
    }

    pub fn min_value(&self) -> f64 {
        self.min_entry().map_or(NO_VALUE, |m| m.value)
    }

    pub fn max_value(&self) -> f64 {
        self.max_entry().map_or(NO_VALUE, |m| m.value)
    }

    pub fn min_date(&self) -> String {
        self.min_entry()
            .map_or_else(|| NO_DATA.to_string(), |m| m.timestamp.clone())
    }

    pub fn max_date(&self) -> String {
        self.max_entry()
            .map_or_else(|| NO_DATA.to_string(), |m| m.timestamp.clone())
    }

    pub fn average(&self) -> f64 {
        if self.valid.is_empty() {
            return NO_VALUE;
        }
        let sum: f64 = self.valid.iter().map(|m| m.value).sum();
        sum / self.valid.len() as f64
    }

    /// Ordinary least-squares slope with x = 0, 1, 2, … and y = value.
    ///
    /// `None` below two readings. With n ≥ 2 distinct x values the
    /// denominator is strictly positive.
    pub fn slope(&self) -> Option<f64> {
        if self.valid.len() < 2 {
            return None;
        }

        let n = self.valid.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
        for (i, m) in self.valid.iter().enumerate() {
            let x = i as f64;
            let y = m.value;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
        }

        Some((n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x))
    }

    pub fn trend(&self) -> Trend {
        self.slope().map_or(Trend::Unknown, Trend::from_slope)
    }

    pub fn trend_description(&self) -> &'static str {
        self.trend().description()
    }

    /// Snapshot of every statistic, labelled with the sensor it describes.
    pub fn summary(&self, sensor_label: &str) -> AnalysisSummary {
        AnalysisSummary {
            sensor_label: sensor_label.to_string(),
            count: self.len(),
            min_value: self.min_value(),
            min_date: self.min_date(),
            max_value: self.max_value(),
            max_date: self.max_date(),
            average: self.average(),
            trend: self.trend(),
        }
    }
}

/// Plain-data result of an analysis, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    pub sensor_label: String,
    pub count: usize,
    pub min_value: f64,
    pub min_date: String,
    pub max_value: f64,
    pub max_date: String,
    pub average: f64,
    pub trend: Trend,
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis for sensor: {}", self.sensor_label)?;
        if self.count == 0 {
            return writeln!(f, "No valid measurements.");
        }
        writeln!(f, "Measurements: {}", self.count)?;
        writeln!(f, "Min: {:.2} ({})", self.min_value, self.min_date)?;
        writeln!(f, "Max: {:.2} ({})", self.max_value, self.max_date)?;
        writeln!(f, "Average: {:.2}", self.average)?;
        writeln!(f, "Trend: {}", self.trend)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
