//! Date-range selection over a measurement series.
//!
//! Fetch and cache operations always hand back the full series; callers
//! that display a user-chosen range narrow it down here before analysis.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::model::Measurement;

/// Timestamp layout used by the remote service and the cache.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT).ok()
}

/// Measurements whose timestamp falls on any day from `from` to `to`,
/// both inclusive, in their original order.
///
/// The upper bound is exclusive: a reading stamped exactly at midnight
/// after `to` (`to + 1 day 00:00:00`) belongs to the next day and is left
/// out, so adjacent ranges never share a reading.
///
/// Readings with an unparsable timestamp are dropped. Invalid values are
/// kept; analysis filters those itself. An inverted range selects nothing.
pub fn filter_by_date_range(series: &[Measurement], from: NaiveDate, to: NaiveDate) -> Vec<Measurement> {
    let start = from.and_hms_opt(0, 0, 0);
    let end = to.checked_add_days(Days::new(1)).and_then(|d| d.and_hms_opt(0, 0, 0));

    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };

    series
        .iter()
        .filter(|m| {
            parse_timestamp(&m.timestamp)
                .map(|t| t >= start && t < end)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Measurement> {
        vec![
            Measurement::new("2024-05-03 00:00:00", 4.0),
            Measurement::new("2024-05-02 23:59:59", 3.0),
            Measurement::missing("2024-05-02 12:00:00"),
            Measurement::new("2024-05-01 00:00:00", 1.0),
            Measurement::new("2024-04-30 23:00:00", 0.5),
        ]
    }

    #[test]
    fn test_range_includes_whole_end_day() {
        let picked = filter_by_date_range(&sample(), date(2024, 5, 1), date(2024, 5, 2));
        let stamps: Vec<_> = picked.iter().map(|m| m.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec!["2024-05-02 23:59:59", "2024-05-02 12:00:00", "2024-05-01 00:00:00"]
        );
    }

    #[test]
    fn test_midnight_after_end_day_is_excluded() {
        let series = vec![
            Measurement::new("2024-05-02 00:00:00", 2.0),
            Measurement::new("2024-05-01 23:00:00", 1.0),
        ];
        let may_first = filter_by_date_range(&series, date(2024, 5, 1), date(2024, 5, 1));
        let may_second = filter_by_date_range(&series, date(2024, 5, 2), date(2024, 5, 2));
        assert_eq!(may_first, vec![Measurement::new("2024-05-01 23:00:00", 1.0)]);
        assert_eq!(may_second, vec![Measurement::new("2024-05-02 00:00:00", 2.0)]);
    }

    #[test]
    fn test_single_day_range() {
        let picked = filter_by_date_range(&sample(), date(2024, 5, 3), date(2024, 5, 3));
        assert_eq!(picked, vec![Measurement::new("2024-05-03 00:00:00", 4.0)]);
    }

    #[test]
    fn test_inverted_range_selects_nothing() {
        assert!(filter_by_date_range(&sample(), date(2024, 5, 3), date(2024, 5, 1)).is_empty());
    }

    #[test]
    fn test_unparsable_timestamps_are_dropped() {
        let series = vec![
            Measurement::new("yesterday", 1.0),
            Measurement::new("2024-05-01T10:00:00Z", 2.0),
            Measurement::new("2024-05-01 10:00:00", 3.0),
        ];
        let picked = filter_by_date_range(&series, date(2024, 5, 1), date(2024, 5, 1));
        assert_eq!(picked, vec![Measurement::new("2024-05-01 10:00:00", 3.0)]);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-05-01 13:00:00").is_some());
        assert!(parse_timestamp("2024-05-01").is_none());
    }
}
