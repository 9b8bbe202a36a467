//! Error types.
//!
//! Aggregation errors are pure input-validation failures; ingestion errors
//! cover the file and text parsing done before aggregation.

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

/// Errors raised by the interval aggregator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The window starts after it ends.
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The gap threshold is zero or negative.
    #[error("invalid gap threshold: {0} seconds (must be positive)")]
    InvalidGapThreshold(i64),

    /// The gap threshold does not fit in a duration.
    #[error("gap threshold out of range: {0} minutes")]
    GapThresholdOutOfRange(i64),
}

impl AggregateError {
    pub(crate) fn invalid_gap(gap: Duration) -> Self {
        AggregateError::InvalidGapThreshold(gap.num_seconds())
    }
}

/// Errors raised while reading observations or parsing window bounds.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' in header")]
    MissingColumn(String),

    #[error("delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),

    #[error("unrecognized date/time '{0}' (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_invalid_window_message() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = AggregateError::InvalidWindow { start, end };
        let msg = err.to_string();
        assert!(msg.contains("2021-01-06 00:00:00"));
        assert!(msg.contains("2021-01-05 00:00:00"));
    }

    #[test]
    fn test_invalid_gap_reports_seconds() {
        let err = AggregateError::invalid_gap(Duration::minutes(-5));
        assert_eq!(err, AggregateError::InvalidGapThreshold(-300));
        assert!(err.to_string().contains("-300 seconds"));
    }

    #[test]
    fn test_out_of_range_gap_reports_minutes() {
        let err = AggregateError::GapThresholdOutOfRange(200_000_000_000_000);
        assert!(err.to_string().contains("200000000000000 minutes"));
    }
}
