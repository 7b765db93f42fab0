//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (`.env` defaults are loaded by `main`)
//! - builds the run configuration
//! - runs the batch pipeline
//! - prints reports and writes result files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::cli::{BatchArgs, Command, DemoArgs, ForecastArgs};
use crate::data::{SampleConfig, code_generation_reference, generate_series};
use crate::domain::{ForecasterConfig, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `capfc` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_forecast(args: BatchArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let output = pipeline::run_batch(&config)?;

    println!("{}", crate::report::format_batch_summary(&output, config.key_threshold));

    if let Some(dir) = &config.output_dir {
        print_written(&pipeline::write_outputs(&output, dir)?);
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let sample = SampleConfig {
        n_points: args.points,
        noise_std: args.noise,
        seed: args.forecast.seed,
        ..SampleConfig::default()
    };

    let mut series = BTreeMap::new();
    series.insert("code_generation".to_string(), code_generation_reference());
    series.insert(sample.capability.clone(), generate_series(&sample)?);

    let config = RunConfig {
        data_path: PathBuf::from("built-in"),
        output_dir: args.out.clone(),
        thresholds: args.forecast.thresholds.clone(),
        min_points: 2,
        days_ahead: args.forecast.days_ahead,
        key_threshold: args.forecast.key_threshold,
        forecaster: forecaster_config_from_args(&args.forecast),
    };
    pipeline::validate_run_config(&config)?;
    info!(capabilities = series.len(), "Running demo series");

    let reports = pipeline::forecast_series(&series, &config);
    for report in reports.values() {
        println!("{}", crate::report::format_capability_detail(report));
    }

    if let Some(dir) = &config.output_dir {
        let output = pipeline::BatchOutput {
            metadata: pipeline::run_metadata(&config, "built-in demo series"),
            rows_read: series.values().map(Vec::len).sum(),
            reports,
            skipped: Vec::new(),
            out_of_range: Vec::new(),
            row_errors: Vec::new(),
        };
        print_written(&pipeline::write_outputs(&output, dir)?);
    }
    Ok(())
}

fn print_written(paths: &[impl AsRef<Path>]) {
    for p in paths {
        println!("Wrote {}", p.as_ref().display());
    }
}

pub fn forecaster_config_from_args(args: &ForecastArgs) -> ForecasterConfig {
    let defaults = ForecasterConfig::default();
    ForecasterConfig {
        saturation_ceiling: args.saturation,
        confidence_level: args.confidence,
        mc_samples: args.samples,
        seed: args.seed,
        as_of: args.as_of.unwrap_or(defaults.as_of),
        ..defaults
    }
}

pub fn run_config_from_args(args: &BatchArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.clone(),
        output_dir: args.out.clone(),
        thresholds: args.forecast.thresholds.clone(),
        min_points: args.min_points,
        days_ahead: args.forecast.days_ahead,
        key_threshold: args.forecast.key_threshold,
        forecaster: forecaster_config_from_args(&args.forecast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use chrono::NaiveDate;

    #[test]
    fn run_config_carries_cli_settings() {
        let cli = Cli::try_parse_from([
            "capfc",
            "forecast",
            "--data",
            "scores.csv",
            "--out",
            "out",
            "--saturation",
            "95",
            "--samples",
            "500",
            "--seed",
            "7",
            "--as-of",
            "2024-06-01",
        ])
        .unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };

        let config = run_config_from_args(&args);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.forecaster.saturation_ceiling, 95.0);
        assert_eq!(config.forecaster.mc_samples, 500);
        assert_eq!(config.forecaster.seed, 7);
        assert_eq!(config.forecaster.as_of, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(config.forecaster.curve_cadence_days, 7);
    }
}
