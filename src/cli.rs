//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::TieBreak;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// locconf - Location confidence calculator
///
/// Summarize timestamped location observations (e.g. states inferred from
/// cell-tower triangulation) into contiguous intervals, each with its
/// dominant state and a confidence score.
///
/// Examples:
///   locconf --input towers.csv
///   locconf --input towers.csv --start "2021-01-05 20:00" --end "2021-01-06 02:00"
///   locconf --input towers.csv --gap-minutes 120 --format markdown -o report.md
///   locconf --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Delimited file with a timestamp column and a state column
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Window start (YYYY-MM-DD HH:MM:SS)
    ///
    /// Defaults to the earliest observation in the input.
    #[arg(short, long, value_name = "TIME")]
    pub start: Option<String>,

    /// Window end (YYYY-MM-DD HH:MM:SS)
    ///
    /// Defaults to the latest observation in the input.
    #[arg(short, long, value_name = "TIME")]
    pub end: Option<String>,

    /// Largest gap in minutes between observations of one interval
    ///
    /// Default: from config or 30.
    #[arg(short, long, value_name = "MINUTES", env = "LOCCONF_GAP_MINUTES")]
    pub gap_minutes: Option<i64>,

    /// Rule for states tied on count
    #[arg(long, value_name = "RULE")]
    pub tie_break: Option<TieBreakArg>,

    /// Header of the timestamp column
    #[arg(long, value_name = "NAME")]
    pub timestamp_column: Option<String>,

    /// Header of the state column
    #[arg(long, value_name = "NAME")]
    pub state_column: Option<String>,

    /// chrono format string for timestamps in the input
    ///
    /// Example: --timestamp-format "%m/%d/%y %H:%M"
    #[arg(long, value_name = "FORMAT")]
    pub timestamp_format: Option<String>,

    /// Output format (table, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the first N ingested observations before the report
    #[arg(long, value_name = "ROWS")]
    pub preview: Option<usize>,

    /// Omit the whole-window summary
    #[arg(long)]
    pub no_summary: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .locconf.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .locconf.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain-text table (default)
    #[default]
    Table,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// Tie-break rule for --tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TieBreakArg {
    FirstOccurrence,
    Lexicographic,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::FirstOccurrence => TieBreak::FirstOccurrence,
            TieBreakArg::Lexicographic => TieBreak::Lexicographic,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(minutes) = self.gap_minutes {
            if minutes <= 0 {
                return Err("Gap threshold must be at least 1 minute".to_string());
            }
        }

        if self.preview == Some(0) {
            return Err("Preview must show at least 1 row".to_string());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                Err(format!("Input file does not exist: {}", input.display()))
            }
            Some(_) => Ok(()),
            None => Err("An input file is required (--input)".to_string()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
