//! Observation ingestion from delimited files.
//!
//! Rows are read with a header lookup for the timestamp and state columns.
//! Timestamps that fail to parse are coerced to "invalid" and dropped, so
//! the aggregator only ever receives a clean series.

use crate::error::IngestError;
use crate::models::Observation;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Formats accepted for window bounds typed by the user.
const WINDOW_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Options for reading observations.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Header of the timestamp column.
    pub timestamp_column: String,
    /// Header of the state column.
    pub state_column: String,
    /// chrono format string for the timestamp column.
    pub timestamp_format: String,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            timestamp_column: "Local Date & Time".to_string(),
            state_column: "State".to_string(),
            timestamp_format: "%m/%d/%y %H:%M".to_string(),
            delimiter: b',',
        }
    }
}

impl TryFrom<&crate::config::IngestConfig> for IngestOptions {
    type Error = IngestError;

    fn try_from(config: &crate::config::IngestConfig) -> Result<Self, Self::Error> {
        let delimiter = match config.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => return Err(IngestError::InvalidDelimiter(config.delimiter.clone())),
        };

        Ok(Self {
            timestamp_column: config.timestamp_column.clone(),
            state_column: config.state_column.clone(),
            timestamp_format: config.timestamp_format.clone(),
            delimiter,
        })
    }
}

/// Result of reading an input file.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Valid observations in file order.
    pub observations: Vec<Observation>,
    /// Rows dropped for an unparseable timestamp or an empty state.
    pub invalid_rows: usize,
}

/// Read observations from a file on disk.
pub fn read_observations(path: &Path, options: &IngestOptions) -> Result<Ingested, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;

    debug!("Reading observations from {}", path.display());
    parse_observations(file, options)
}

/// Parse observations from any reader.
pub fn parse_observations<R: Read>(
    reader: R,
    options: &IngestOptions,
) -> Result<Ingested, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let ts_idx = column_index(&headers, &options.timestamp_column)?;
    let state_idx = column_index(&headers, &options.state_column)?;

    let mut ingested = Ingested::default();

    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let raw_ts = record.get(ts_idx).unwrap_or("").trim();
        let label = record.get(state_idx).unwrap_or("").trim();

        let timestamp = match NaiveDateTime::parse_from_str(raw_ts, &options.timestamp_format) {
            Ok(ts) => ts,
            Err(e) => {
                debug!("Row {}: invalid timestamp '{}': {}", row + 1, raw_ts, e);
                ingested.invalid_rows += 1;
                continue;
            }
        };

        if label.is_empty() {
            debug!("Row {}: empty state", row + 1);
            ingested.invalid_rows += 1;
            continue;
        }

        ingested.observations.push(Observation::new(timestamp, label));
    }

    if ingested.invalid_rows > 0 {
        warn!(
            "Dropped {} rows with an invalid timestamp or empty state",
            ingested.invalid_rows
        );
    }

    Ok(ingested)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

/// Parse a window bound such as `2021-01-05 20:00:00`.
///
/// A bare date means midnight.
pub fn parse_window_bound(text: &str) -> Result<NaiveDateTime, IngestError> {
    let text = text.trim();

    for format in WINDOW_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| IngestError::InvalidTimestamp(text.to_string()))
}

/// Earliest and latest timestamp of a series.
pub fn series_bounds(series: &[Observation]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = series.iter().map(|obs| obs.timestamp).min()?;
    let end = series.iter().map(|obs| obs.timestamp).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Local Date & Time,State,Tower
01/05/21 20:00,New York,A1
01/05/21 21:00,New York,A2
not a date,Connecticut,B1
01/05/21 22:00,Connecticut,B2
01/05/21 23:00,,B3
";

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_observations_drops_invalid_rows() {
        let ingested = parse_observations(SAMPLE.as_bytes(), &IngestOptions::default()).unwrap();

        assert_eq!(ingested.observations.len(), 3);
        assert_eq!(ingested.invalid_rows, 2);
        assert_eq!(ingested.observations[0], Observation::new(at(5, 20), "New York"));
        assert_eq!(ingested.observations[2], Observation::new(at(5, 22), "Connecticut"));
    }

    #[test]
    fn test_missing_column() {
        let options = IngestOptions {
            state_column: "Region".to_string(),
            ..IngestOptions::default()
        };
        let err = parse_observations(SAMPLE.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ref c) if c == "Region"));
    }

    #[test]
    fn test_custom_delimiter_and_format() {
        let data = "when;where\n2021-01-05 20:15:00;NJ\n2021-01-05 20:45:00;NY\n";
        let options = IngestOptions {
            timestamp_column: "when".to_string(),
            state_column: "where".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            delimiter: b';',
        };
        let ingested = parse_observations(data.as_bytes(), &options).unwrap();
        assert_eq!(ingested.observations.len(), 2);
        assert_eq!(ingested.observations[1].label, "NY");
        assert_eq!(ingested.invalid_rows, 0);
    }

    #[test]
    fn test_options_from_config_rejects_long_delimiter() {
        let mut config = crate::config::IngestConfig::default();
        config.delimiter = "||".to_string();
        assert!(matches!(
            IngestOptions::try_from(&config),
            Err(IngestError::InvalidDelimiter(_))
        ));

        config.delimiter = "\t".to_string();
        assert_eq!(IngestOptions::try_from(&config).unwrap().delimiter, b'\t');
    }

    #[test]
    fn test_read_observations_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let ingested = read_observations(file.path(), &IngestOptions::default()).unwrap();
        assert_eq!(ingested.observations.len(), 3);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_observations(&dir.path().join("absent.csv"), &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Open { .. }));
    }

    #[test]
    fn test_fixture_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/observations.csv");
        let ingested = read_observations(&path, &IngestOptions::default()).unwrap();
        assert_eq!(ingested.observations.len(), 10);
        assert_eq!(ingested.invalid_rows, 1);
        assert_eq!(
            series_bounds(&ingested.observations),
            Some((at(5, 20), at(6, 5)))
        );
    }

    #[test]
    fn test_parse_window_bound() {
        assert_eq!(parse_window_bound("2021-01-05 20:00:00").unwrap(), at(5, 20));
        assert_eq!(parse_window_bound(" 2021-01-05 20:00 ").unwrap(), at(5, 20));
        assert_eq!(parse_window_bound("2021-01-05T20:00:00").unwrap(), at(5, 20));
        assert_eq!(parse_window_bound("2021-01-05").unwrap(), at(5, 0));
        assert!(matches!(
            parse_window_bound("yesterday"),
            Err(IngestError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_series_bounds_empty() {
        assert_eq!(series_bounds(&[]), None);
    }
}
