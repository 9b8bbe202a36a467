//! locconf - Location Confidence Calculator
//!
//! A CLI tool that reads timestamped location observations (such as states
//! inferred from cell-tower triangulation), splits them into contiguous
//! intervals, and reports the dominant state of each interval together
//! with how strongly the observations agree.
//!
//! Exit codes:
//!   0 - Success (including an empty result)
//!   1 - Error (unreadable input, bad config, invalid window or gap)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod report;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use ingest::{Ingested, IngestOptions};
use models::{GapThreshold, Report, ReportMetadata, TimeWindow};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("locconf v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Calculation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .locconf.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize columns, timestamp format, gap threshold, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Read the input, aggregate it and emit the report.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args
        .input
        .as_deref()
        .context("An input file is required (--input)")?;

    let options = IngestOptions::try_from(&config.ingest).context("Invalid [ingest] settings")?;
    let ingested = ingest::read_observations(input, &options)
        .with_context(|| format!("Failed to read observations from {}", input.display()))?;

    info!(
        "Loaded {} observations from {}",
        ingested.observations.len(),
        input.display()
    );

    if let Some(rows) = args.preview {
        println!("{}", report::preview_table(&ingested.observations, rows));
    }

    let report = build_report(
        &ingested,
        &input.display().to_string(),
        args.start.as_deref(),
        args.end.as_deref(),
        &config,
    )?;

    let output = match config.report.format {
        OutputFormat::Table => report::generate_table_report(&report),
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Resolve the window and aggregate the ingested observations.
///
/// Missing window bounds default to the extent of the series.
fn build_report(
    ingested: &Ingested,
    source: &str,
    start: Option<&str>,
    end: Option<&str>,
    config: &Config,
) -> Result<Report> {
    let observations = &ingested.observations;
    let bounds = ingest::series_bounds(observations);

    let start = match (start, bounds) {
        (Some(text), _) => ingest::parse_window_bound(text).context("Invalid start time")?,
        (None, Some((first, _))) => first,
        (None, None) => bail!("{} has no valid observations and no --start was given", source),
    };
    let end = match (end, bounds) {
        (Some(text), _) => ingest::parse_window_bound(text).context("Invalid end time")?,
        (None, Some((_, last))) => last,
        (None, None) => bail!("{} has no valid observations and no --end was given", source),
    };

    let window = TimeWindow::new(start, end)?;
    let gap = GapThreshold::from_minutes(config.aggregation.gap_threshold_minutes)?;
    let tie_break = config.aggregation.tie_break;

    info!(
        "Aggregating {} with gap {} min ({} tie break)",
        window,
        gap.num_minutes(),
        tie_break
    );

    let intervals = analysis::aggregate(observations, &window, gap, tie_break);
    let in_window: usize = intervals.iter().map(|i| i.observation_count).sum();

    if intervals.is_empty() {
        warn!("No observations fall inside {}", window);
    }

    let summary = config
        .report
        .include_summary
        .then(|| analysis::summarize_window(observations, &window, tie_break));

    Ok(Report {
        metadata: ReportMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            window,
            gap_minutes: gap.num_minutes(),
            tie_break,
            observations_ingested: observations.len(),
            rows_dropped: ingested.invalid_rows,
            observations_in_window: in_window,
            interval_count: intervals.len(),
        },
        intervals,
        summary,
    })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AggregateError;
    use crate::models::TieBreak;

    fn fixture() -> Ingested {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/observations.csv");
        ingest::read_observations(&path, &IngestOptions::default()).unwrap()
    }

    #[test]
    fn test_build_report_defaults_to_series_extent() {
        let report = build_report(&fixture(), "fixture", None, None, &Config::default()).unwrap();

        assert_eq!(report.intervals.len(), 10);
        assert_eq!(report.metadata.interval_count, 10);
        assert_eq!(report.metadata.observations_in_window, 10);
        assert_eq!(report.metadata.rows_dropped, 1);
        assert!(report.intervals.iter().all(|i| i.confidence_percent == 100.0));

        let summary = report.summary.unwrap();
        assert_eq!(summary.dominant_state, "New York");
        assert_eq!(summary.confidence_percent, 70.0);
    }

    #[test]
    fn test_build_report_with_wide_gap_and_window() {
        let mut config = Config::default();
        config.aggregation.gap_threshold_minutes = 120;
        config.report.include_summary = false;

        let report = build_report(
            &fixture(),
            "fixture",
            Some("2021-01-05 20:00:00"),
            Some("2021-01-05 22:00:00"),
            &config,
        )
        .unwrap();

        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.intervals[0].dominant_state, "New York");
        assert_eq!(report.intervals[0].confidence_percent, 66.67);
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_build_report_rejects_inverted_window() {
        let err = build_report(
            &fixture(),
            "fixture",
            Some("2021-01-06 00:00"),
            Some("2021-01-05 00:00"),
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AggregateError>(),
            Some(AggregateError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_build_report_rejects_huge_gap() {
        let mut config = Config::default();
        config.aggregation.gap_threshold_minutes = 200_000_000_000_000;

        let err = build_report(&fixture(), "fixture", None, None, &config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AggregateError>(),
            Some(AggregateError::GapThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn test_build_report_window_outside_series() {
        let mut config = Config::default();
        config.aggregation.tie_break = TieBreak::Lexicographic;

        let report = build_report(
            &fixture(),
            "fixture",
            Some("2022-01-01"),
            Some("2022-01-02"),
            &config,
        )
        .unwrap();

        assert!(report.intervals.is_empty());
        assert_eq!(report.metadata.interval_count, 0);
        assert_eq!(report.summary.unwrap().dominant_state, "Unknown");
    }

    #[test]
    fn test_build_report_empty_input_needs_window() {
        let empty = Ingested::default();
        assert!(build_report(&empty, "empty.csv", None, None, &Config::default()).is_err());

        let report = build_report(
            &empty,
            "empty.csv",
            Some("2021-01-05"),
            Some("2021-01-06"),
            &Config::default(),
        )
        .unwrap();
        assert!(report.intervals.is_empty());
    }
}
