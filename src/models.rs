//! Data models for the location confidence calculator.
//!
//! This module contains the observation input types, the validated
//! aggregation parameters, and the interval summaries produced from them.

use crate::error::AggregateError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label reported for a window summary with no observations.
pub const UNKNOWN_STATE: &str = "Unknown";

/// Default maximum gap between consecutive observations of one interval.
pub const DEFAULT_GAP_MINUTES: i64 = 30;

/// A single timestamped state reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Local date and time of the reading.
    pub timestamp: NaiveDateTime,
    /// Opaque state label (e.g. "New York").
    pub label: String,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, label: impl Into<String>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}

/// Inclusive time window used to select observations.
///
/// Deserialization goes through [`TimeWindow::new`], so an inverted window
/// is rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct WindowBounds {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = AggregateError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl TimeWindow {
    /// Creates a window, rejecting `start > end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AggregateError> {
        if start > end {
            return Err(AggregateError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns true if `timestamp` lies within `[start, end]`.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Maximum allowed gap between consecutive observations of one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapThreshold(Duration);

impl GapThreshold {
    /// Creates a threshold, rejecting zero and negative durations.
    pub fn new(gap: Duration) -> Result<Self, AggregateError> {
        if gap <= Duration::zero() {
            return Err(AggregateError::invalid_gap(gap));
        }
        Ok(Self(gap))
    }

    /// Creates a threshold from whole minutes.
    pub fn from_minutes(minutes: i64) -> Result<Self, AggregateError> {
        let gap = Duration::try_minutes(minutes)
            .ok_or(AggregateError::GapThresholdOutOfRange(minutes))?;
        Self::new(gap)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    pub fn num_minutes(&self) -> i64 {
        self.0.num_minutes()
    }
}

impl Default for GapThreshold {
    fn default() -> Self {
        Self(Duration::minutes(DEFAULT_GAP_MINUTES))
    }
}

/// Rule for choosing among labels tied for the highest count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The tied label seen first in the run wins.
    #[default]
    FirstOccurrence,
    /// The tied label that sorts first wins.
    Lexicographic,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::FirstOccurrence => write!(f, "first occurrence"),
            TieBreak::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

/// Summary of one maximal contiguous run of observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    /// Earliest observation in the run.
    pub start: NaiveDateTime,
    /// Latest observation in the run.
    pub end: NaiveDateTime,
    /// Most frequent label in the run.
    pub dominant_state: String,
    /// Share of the run agreeing with `dominant_state`, in percent.
    pub confidence_percent: f64,
    /// Number of observations in the run.
    pub observation_count: usize,
}

/// Overall dominant state across every observation in a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub dominant_state: String,
    pub confidence_percent: f64,
    pub observation_count: usize,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Path of the input file.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Selected window.
    pub window: TimeWindow,
    /// Gap threshold in minutes.
    pub gap_minutes: i64,
    /// Tie-break rule applied.
    pub tie_break: TieBreak,
    /// Observations with a valid timestamp.
    pub observations_ingested: usize,
    /// Rows dropped for an unparseable timestamp or empty label.
    pub rows_dropped: usize,
    /// Observations inside the window.
    pub observations_in_window: usize,
    /// Intervals found in the window.
    pub interval_count: usize,
}

/// The complete result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub intervals: Vec<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<WindowSummary>,
}
