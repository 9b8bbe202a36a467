//! Interval segmentation and majority-vote aggregation.
//!
//! Observations are filtered to a window, stably sorted by timestamp and
//! split into maximal runs whose consecutive gaps never exceed the
//! threshold. Each run is summarized by its most frequent label and the
//! share of the run that agrees with it.

use crate::models::{
    GapThreshold, Interval, Observation, TieBreak, TimeWindow, WindowSummary, UNKNOWN_STATE,
};
use chrono::Duration;
use std::collections::HashMap;
use tracing::debug;

/// Select the observations inside `window`, sorted by timestamp.
///
/// The sort is stable, so observations sharing a timestamp keep their
/// input order.
pub fn select_window<'o>(series: &'o [Observation], window: &TimeWindow) -> Vec<&'o Observation> {
    let mut selected: Vec<&Observation> = series
        .iter()
        .filter(|obs| window.contains(obs.timestamp))
        .collect();
    selected.sort_by_key(|obs| obs.timestamp);
    selected
}

/// Lazy iterator over the contiguous runs of a sorted observation slice.
pub struct Runs<'s, 'o> {
    remaining: &'s [&'o Observation],
    gap: Duration,
}

impl<'s, 'o> Iterator for Runs<'s, 'o> {
    type Item = &'s [&'o Observation];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let mut len = 1;
        while len < self.remaining.len()
            && self.remaining[len].timestamp - self.remaining[len - 1].timestamp <= self.gap
        {
            len += 1;
        }

        let (run, rest) = self.remaining.split_at(len);
        self.remaining = rest;
        Some(run)
    }
}

/// Split chronologically sorted observations into runs.
///
/// A new run starts whenever the gap to the previous observation is
/// strictly greater than `gap`.
pub fn runs<'s, 'o>(sorted: &'s [&'o Observation], gap: GapThreshold) -> Runs<'s, 'o> {
    Runs {
        remaining: sorted,
        gap: gap.duration(),
    }
}

/// Aggregate a series into per-run interval summaries.
///
/// Returns an empty vector when no observation falls inside the window.
pub fn aggregate(
    series: &[Observation],
    window: &TimeWindow,
    gap: GapThreshold,
    tie_break: TieBreak,
) -> Vec<Interval> {
    let selected = select_window(series, window);
    if selected.is_empty() {
        debug!("No observations in window {}", window);
        return Vec::new();
    }

    let intervals: Vec<Interval> = runs(&selected, gap)
        .filter_map(|run| summarize_run(run, tie_break))
        .collect();

    debug!(
        "Segmented {} observations into {} intervals (gap {} min)",
        selected.len(),
        intervals.len(),
        gap.num_minutes()
    );

    intervals
}

/// Dominant label and agreement over every observation in the window.
///
/// An empty selection yields an "Unknown" summary with zero confidence.
pub fn summarize_window(
    series: &[Observation],
    window: &TimeWindow,
    tie_break: TieBreak,
) -> WindowSummary {
    let selected = select_window(series, window);

    match majority(selected.iter().map(|obs| obs.label.as_str()), tie_break) {
        Some(tally) => WindowSummary {
            start: window.start(),
            end: window.end(),
            dominant_state: tally.label.to_string(),
            confidence_percent: round_percent(tally.count, tally.total),
            observation_count: tally.total,
        },
        None => WindowSummary {
            start: window.start(),
            end: window.end(),
            dominant_state: UNKNOWN_STATE.to_string(),
            confidence_percent: 0.0,
            observation_count: 0,
        },
    }
}

/// Summarize one run. Returns `None` only for an empty slice.
pub fn summarize_run(run: &[&Observation], tie_break: TieBreak) -> Option<Interval> {
    let first = run.first()?;
    let last = run.last()?;
    let tally = majority(run.iter().map(|obs| obs.label.as_str()), tie_break)?;

    Some(Interval {
        start: first.timestamp,
        end: last.timestamp,
        dominant_state: tally.label.to_string(),
        confidence_percent: round_percent(tally.count, tally.total),
        observation_count: tally.total,
    })
}

/// Winning label of a majority vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tally<'a> {
    label: &'a str,
    count: usize,
    total: usize,
}

/// Count labels and pick the most frequent one under `tie_break`.
fn majority<'a, I>(labels: I, tie_break: TieBreak) -> Option<Tally<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    // Counts in first-occurrence order.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut total = 0;

    for label in labels {
        total += 1;
        let slot = *index.entry(label).or_insert_with(|| {
            counts.push((label, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        best = match best {
            Some((best_label, best_count))
                if count < best_count
                    || (count == best_count
                        && (tie_break == TieBreak::FirstOccurrence || label >= best_label)) =>
            {
                Some((best_label, best_count))
            }
            _ => Some((label, count)),
        };
    }

    best.map(|(label, count)| Tally {
        label,
        count,
        total,
    })
}

/// `100 * count / total`, rounded half away from zero to 2 decimals.
pub fn round_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = count as f64 * 100.0 / total as f64;
    (percent * 100.0).round() / 100.0
}
