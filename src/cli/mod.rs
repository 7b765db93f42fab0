//! Command-line parsing for the capability forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch and the forecasting code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "capfc",
    version,
    about = "Forecast when AI capabilities cross benchmark thresholds",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every capability in a score CSV, print a summary, and write result files.
    Forecast(BatchArgs),
    /// Run the built-in example series plus a synthetic series.
    Demo(DemoArgs),
}

/// Settings shared by every command that forecasts.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Thresholds to forecast (repeat the flag or separate with commas).
    #[arg(long = "threshold", value_delimiter = ',', default_values_t = [85.0, 90.0, 95.0])]
    pub thresholds: Vec<f64>,

    /// Saturation ceiling L (fixed during fitting).
    #[arg(long, default_value_t = 100.0)]
    pub saturation: f64,

    /// Confidence level of the crossing-date intervals.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Forecast curve horizon, in days past the last observation.
    #[arg(long, default_value_t = 730)]
    pub days_ahead: u32,

    /// Monte Carlo draws per threshold.
    #[arg(long, default_value_t = 10_000)]
    pub samples: usize,

    /// Base random seed for the Monte Carlo intervals.
    #[arg(long, env = "CAPFC_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Date treated as "now" (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Threshold shown in the summary table.
    #[arg(long, default_value_t = 90.0)]
    pub key_threshold: f64,
}

/// Options for `capfc forecast`.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Score CSV with `date`, `score`, and `capability` columns.
    #[arg(long, env = "CAPFC_DATA", value_name = "CSV")]
    pub data: PathBuf,

    /// Directory for forecast_results.json, forecast_nodes.json, and forecast_summary.csv.
    #[arg(long, env = "CAPFC_OUT", value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Capabilities with fewer distinct dates are skipped.
    #[arg(long, default_value_t = 4)]
    pub min_points: usize,

    #[command(flatten)]
    pub forecast: ForecastArgs,
}

/// Options for `capfc demo`.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Standard deviation of the synthetic series' score noise.
    #[arg(long, default_value_t = 2.0)]
    pub noise: f64,

    /// Observations in the synthetic series.
    #[arg(long, default_value_t = 16)]
    pub points: usize,

    /// Optional output directory for the demo's result files.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub forecast: ForecastArgs,
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
