//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.locconf.toml` files.

use crate::cli::OutputFormat;
use crate::models::{TieBreak, DEFAULT_GAP_MINUTES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".locconf.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Segmentation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Header of the timestamp column.
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// Header of the state column.
    #[serde(default = "default_state_column")]
    pub state_column: String,

    /// chrono format string for timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Field delimiter (a single character).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timestamp_column: default_timestamp_column(),
            state_column: default_state_column(),
            timestamp_format: default_timestamp_format(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_timestamp_column() -> String {
    "Local Date & Time".to_string()
}

fn default_state_column() -> String {
    "State".to_string()
}

fn default_timestamp_format() -> String {
    "%m/%d/%y %H:%M".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Largest gap in minutes between observations of one interval.
    #[serde(default = "default_gap_minutes")]
    pub gap_threshold_minutes: i64,

    /// Rule for labels tied on count.
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_minutes: default_gap_minutes(),
            tie_break: TieBreak::default(),
        }
    }
}

fn default_gap_minutes() -> i64 {
    DEFAULT_GAP_MINUTES
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Include the whole-window summary.
    #[serde(default = "default_true")]
    pub include_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_summary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref column) = args.timestamp_column {
            self.ingest.timestamp_column = column.clone();
        }
        if let Some(ref column) = args.state_column {
            self.ingest.state_column = column.clone();
        }
        if let Some(ref format) = args.timestamp_format {
            self.ingest.timestamp_format = format.clone();
        }

        if let Some(minutes) = args.gap_minutes {
            self.aggregation.gap_threshold_minutes = minutes;
        }
        if let Some(tie_break) = args.tie_break {
            self.aggregation.tie_break = tie_break.into();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.no_summary {
            self.report.include_summary = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::cli::TieBreakArg;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingest.timestamp_column, "Local Date & Time");
        assert_eq!(config.ingest.timestamp_format, "%m/%d/%y %H:%M");
        assert_eq!(config.aggregation.gap_threshold_minutes, 30);
        assert_eq!(config.aggregation.tie_break, TieBreak::FirstOccurrence);
        assert_eq!(config.report.format, OutputFormat::Table);
        assert!(config.report.include_summary);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[ingest]
state_column = "Region"
delimiter = ";"

[aggregation]
gap_threshold_minutes = 120
tie_break = "lexicographic"

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.ingest.state_column, "Region");
        assert_eq!(config.ingest.timestamp_column, "Local Date & Time");
        assert_eq!(config.ingest.delimiter, ";");
        assert_eq!(config.aggregation.gap_threshold_minutes, 120);
        assert_eq!(config.aggregation.tie_break, TieBreak::Lexicographic);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.include_summary);
    }

    #[test]
    fn test_merge_only_overrides_explicit_args() {
        let mut config: Config = toml::from_str(
            r#"
[aggregation]
gap_threshold_minutes = 90

[report]
format = "markdown"
"#,
        )
        .unwrap();

        let args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.aggregation.gap_threshold_minutes, 90);
        assert_eq!(config.report.format, OutputFormat::Markdown);

        let mut args = make_args();
        args.gap_minutes = Some(15);
        args.tie_break = Some(TieBreakArg::Lexicographic);
        args.format = Some(OutputFormat::Json);
        args.state_column = Some("Region".to_string());
        args.no_summary = true;
        config.merge_with_args(&args);
        assert_eq!(config.aggregation.gap_threshold_minutes, 15);
        assert_eq!(config.aggregation.tie_break, TieBreak::Lexicographic);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.ingest.state_column, "Region");
        assert!(!config.report.include_summary);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[aggregation]\ngap_threshold_minutes = 45\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.aggregation.gap_threshold_minutes, 45);

        std::fs::write(&path, "[aggregation\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[ingest]"));
        assert!(toml_str.contains("[aggregation]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("first_occurrence"));

        let round_trip: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round_trip.aggregation.gap_threshold_minutes, 30);
    }
}
