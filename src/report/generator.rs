//! Report generation.
//!
//! Renders interval summaries as a plain-text table, a Markdown document
//! or JSON.

use crate::models::{Interval, Observation, Report, ReportMetadata, WindowSummary};
use anyhow::Result;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADERS: [&str; 5] = [
    "Start Time",
    "End Time",
    "Dominant State",
    "Confidence (%)",
    "Observations",
];

/// Generate a plain-text table report.
pub fn generate_table_report(report: &Report) -> String {
    let mut output = String::new();

    if report.intervals.is_empty() {
        output.push_str(&format!(
            "No observations between {}.\n",
            report.metadata.window
        ));
    } else {
        let rows: Vec<[String; 5]> = report.intervals.iter().map(interval_row).collect();
        output.push_str(&render_table(&HEADERS, &rows));
    }

    if let Some(ref summary) = report.summary {
        output.push('\n');
        output.push_str(&format!(
            "Overall: {} ({:.2}% of {} observations)\n",
            summary.dominant_state, summary.confidence_percent, summary.observation_count
        ));
    }

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Location Confidence Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_intervals_section(&report.intervals));

    if let Some(ref summary) = report.summary {
        output.push_str(&generate_summary_section(summary));
    }

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render the first `rows` observations as a table.
pub fn preview_table(observations: &[Observation], rows: usize) -> String {
    let body: Vec<[String; 2]> = observations
        .iter()
        .take(rows)
        .map(|obs| {
            [
                obs.timestamp.format(TIME_FORMAT).to_string(),
                obs.label.clone(),
            ]
        })
        .collect();

    render_table(&["Timestamp", "State"], &body)
}

fn interval_row(interval: &Interval) -> [String; 5] {
    [
        interval.start.format(TIME_FORMAT).to_string(),
        interval.end.format(TIME_FORMAT).to_string(),
        interval.dominant_state.clone(),
        format!("{:.2}", interval.confidence_percent),
        interval.observation_count.to_string(),
    ]
}

/// Render left-aligned columns padded to the widest cell.
fn render_table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths = (*headers).map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut table = format_line(headers.to_vec());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    table.push_str(&format!("{}\n", rule.join("-+-")));

    for row in rows {
        table.push_str(&format_line(row.iter().map(String::as_str).collect()));
    }

    table
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Window:** {}\n", metadata.window));
    section.push_str(&format!(
        "- **Gap Threshold:** {} min\n",
        metadata.gap_minutes
    ));
    section.push_str(&format!("- **Tie Break:** {}\n", metadata.tie_break));
    section.push_str(&format!(
        "- **Observations:** {} ingested, {} in window\n",
        metadata.observations_ingested, metadata.observations_in_window
    ));
    section.push_str(&format!("- **Intervals:** {}\n", metadata.interval_count));
    if metadata.rows_dropped > 0 {
        section.push_str(&format!(
            "- **Rows Dropped:** {}\n",
            metadata.rows_dropped
        ));
    }
    section.push('\n');

    section
}

/// Generate the intervals section.
fn generate_intervals_section(intervals: &[Interval]) -> String {
    let mut section = String::new();

    section.push_str("## Intervals\n\n");

    if intervals.is_empty() {
        section.push_str("No observations fall inside the selected window.\n\n");
        return section;
    }

    section.push_str(&format!("| {} |\n", HEADERS.join(" | ")));
    section.push_str("|:---|:---|:---|---:|---:|\n");

    for interval in intervals {
        section.push_str(&format!("| {} |\n", interval_row(interval).join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the whole-window summary section.
fn generate_summary_section(summary: &WindowSummary) -> String {
    let mut section = String::new();

    section.push_str("## Overall\n\n");
    section.push_str(&format!(
        "- **Dominant State:** {}\n",
        summary.dominant_state
    ));
    section.push_str(&format!(
        "- **Confidence:** {:.2}%\n",
        summary.confidence_percent
    ));
    section.push_str(&format!(
        "- **Observations:** {}\n\n",
        summary.observation_count
    ));

    section
}
