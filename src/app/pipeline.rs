//! Shared batch pipeline used by the `forecast` and `demo` commands.
//!
//! CSV ingest -> series preparation -> parallel fits -> per-capability reports
//!
//! The command handlers only decide where series come from and how results are
//! presented.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::{SkippedSeries, prepare_series};
use crate::domain::{
    CapabilityReport, FitQuality, ForecastNode, ModelParameters, Observation, RunConfig, RunMetadata,
    ThresholdFailure,
};
use crate::error::AppError;
use crate::forecast::CapabilityForecaster;
use crate::io::ingest::{RowError, load_observations};
use crate::io::{NODES_FILE, RESULTS_FILE, SUMMARY_FILE, write_nodes_json, write_results_json, write_summary_csv};

pub const MODEL_NAME: &str = "logistic_growth";

/// All computed outputs of a single batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub metadata: RunMetadata,
    pub reports: BTreeMap<String, CapabilityReport>,
    pub skipped: Vec<SkippedSeries>,
    pub out_of_range: Vec<String>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

impl BatchOutput {
    pub fn n_succeeded(&self) -> usize {
        self.reports.values().filter(|r| r.success).count()
    }

    pub fn n_failed(&self) -> usize {
        self.reports.len() - self.n_succeeded()
    }
}

/// Load the configured CSV and forecast every usable capability.
pub fn run_batch(config: &RunConfig) -> Result<BatchOutput, AppError> {
    validate_run_config(config)?;

    let ingest = load_observations(&config.data_path)?;
    let prepared = prepare_series(&ingest.rows, config.min_points, config.forecaster.saturation_ceiling);
    info!(
        rows = ingest.rows_used(),
        capabilities = prepared.series.len(),
        skipped = prepared.skipped.len(),
        "Prepared capability series"
    );

    if prepared.series.is_empty() {
        return Err(AppError::new(
            3,
            format!("No capability has at least {} data points.", config.min_points),
        ));
    }

    let reports = forecast_series(&prepared.series, config);
    Ok(BatchOutput {
        metadata: run_metadata(config, config.data_path.display().to_string()),
        reports,
        skipped: prepared.skipped,
        out_of_range: prepared.out_of_range,
        rows_read: ingest.rows_read,
        row_errors: ingest.row_errors,
    })
}

/// Fit and forecast prepared series; one report per capability.
///
/// A failing capability gets a failed report and never stops the others.
pub fn forecast_series(
    series: &BTreeMap<String, Vec<Observation>>,
    config: &RunConfig,
) -> BTreeMap<String, CapabilityReport> {
    let mut forecaster = CapabilityForecaster::new(config.forecaster.clone());
    let fits = forecaster.fit_many(series);

    let forecaster = &forecaster;
    fits.par_iter()
        .map(|(name, fit)| {
            let report = match fit {
                Ok(_) => build_report(forecaster, name, config),
                Err(err) => CapabilityReport::failed(name.as_str(), err.to_string()),
            };
            (name.clone(), report)
        })
        .collect()
}

fn build_report(forecaster: &CapabilityForecaster, capability: &str, config: &RunConfig) -> CapabilityReport {
    let model = match forecaster.fitted(capability) {
        Ok(m) => m,
        Err(err) => return CapabilityReport::failed(capability, err.to_string()),
    };
    let level = config.forecaster.confidence_level;

    let mut threshold_predictions = Vec::with_capacity(config.thresholds.len());
    let mut threshold_failures = Vec::new();
    for &threshold in &config.thresholds {
        match forecaster.predict_threshold(capability, threshold, level) {
            Ok(p) => threshold_predictions.push(p),
            Err(err) => {
                warn!(capability, threshold, error = %err, "Threshold prediction failed");
                threshold_failures.push(ThresholdFailure {
                    threshold,
                    error: err.to_string(),
                });
            }
        }
    }

    let forecast_curve = match forecaster.forecast_curve(capability, config.days_ahead) {
        Ok(curve) => Some(curve),
        Err(err) => {
            warn!(capability, error = %err, "Forecast curve generation failed");
            None
        }
    };

    let forecast_nodes: Vec<ForecastNode> = threshold_predictions
        .iter()
        .filter_map(|p| p.as_forecast())
        .map(ForecastNode::from)
        .collect();

    info!(
        capability,
        r_squared = model.r_squared,
        k = model.params.growth_rate,
        t0 = model.params.midpoint,
        nodes = forecast_nodes.len(),
        "Forecast complete"
    );

    CapabilityReport {
        capability: capability.to_string(),
        success: true,
        error: None,
        fit_quality: Some(FitQuality::from(model)),
        model_parameters: Some(ModelParameters {
            params: model.params,
            std_errors: model.std_errors,
        }),
        threshold_predictions,
        threshold_failures,
        forecast_curve,
        forecast_nodes,
    }
}

pub fn run_metadata(config: &RunConfig, data_source: impl Into<String>) -> RunMetadata {
    RunMetadata {
        generated_at: chrono::Local::now().to_rfc3339(),
        model: MODEL_NAME.to_string(),
        confidence_level: config.forecaster.confidence_level,
        saturation_ceiling: config.forecaster.saturation_ceiling,
        as_of: config.forecaster.as_of,
        seed: config.forecaster.seed,
        data_source: data_source.into(),
    }
}

/// Write results JSON, nodes JSON, and the summary CSV into `dir`.
pub fn write_outputs(output: &BatchOutput, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output directory '{}': {e}", dir.display())))?;

    let results = dir.join(RESULTS_FILE);
    write_results_json(&results, &output.metadata, &output.reports)?;

    let nodes = dir.join(NODES_FILE);
    write_nodes_json(&nodes, &output.metadata, &output.reports)?;

    let summary = dir.join(SUMMARY_FILE);
    write_summary_csv(&summary, &output.reports)?;

    info!(dir = %dir.display(), "Wrote forecast outputs");
    Ok(vec![results, nodes, summary])
}

/// Reject settings no capability could be forecast with.
pub fn validate_run_config(config: &RunConfig) -> Result<(), AppError> {
    let f = &config.forecaster;
    if config.thresholds.is_empty() {
        return Err(AppError::new(2, "At least one threshold is required."));
    }
    if let Some(bad) = config.thresholds.iter().find(|t| !t.is_finite()) {
        return Err(AppError::new(2, format!("Invalid threshold {bad} (must be finite).")));
    }
    if config.min_points < 2 {
        return Err(AppError::new(2, "--min-points must be at least 2."));
    }
    if !(f.saturation_ceiling.is_finite() && f.saturation_ceiling > 0.0) {
        return Err(AppError::new(2, "--saturation must be finite and > 0."));
    }
    if !(f.confidence_level > 0.0 && f.confidence_level < 1.0) {
        return Err(AppError::new(2, "--confidence must be in (0, 1)."));
    }
    if f.mc_samples == 0 {
        return Err(AppError::new(2, "--samples must be > 0."));
    }
    Ok(())
}
