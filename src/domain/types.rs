//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and forecasting
//! - exported to JSON/CSV for downstream renderers
//! - compared in tests without touching the solver

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fit::FitOptions;

/// A single dated benchmark score for one capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub score: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, score: f64) -> Self {
        Self { date, score }
    }
}

/// Inclusive calendar span covered by a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parameters of `score(t) = L / (1 + exp(-k (t - t0)))`.
///
/// `t` is measured in days since the model's reference date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Saturation ceiling `L` (fixed, not estimated).
    #[serde(rename = "L")]
    pub ceiling: f64,
    /// Growth rate `k` (per day).
    #[serde(rename = "k")]
    pub growth_rate: f64,
    /// Inflection point `t0` (days since reference).
    #[serde(rename = "t0")]
    pub midpoint: f64,
}

/// Standard errors of [`LogisticParams`] from the least-squares covariance.
///
/// `ceiling` is always zero because `L` is held fixed during the fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamErrors {
    #[serde(rename = "L_std")]
    pub ceiling: f64,
    #[serde(rename = "k_std")]
    pub growth_rate: f64,
    #[serde(rename = "t0_std")]
    pub midpoint: f64,
}

/// A successful fit for one capability.
///
/// Immutable once built; re-fitting a capability produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub capability: String,
    pub params: LogisticParams,
    pub std_errors: ParamErrors,
    /// Date of `t = 0` (earliest observation).
    pub reference_date: NaiveDate,
    /// Observation dates in chronological order.
    pub dates: Vec<NaiveDate>,
    /// Elapsed days for each observation (same order as `dates`).
    pub elapsed: Vec<f64>,
    pub scores: Vec<f64>,
    pub r_squared: f64,
    pub sse: f64,
    /// Solver iterations used by the winning start.
    pub iterations: usize,
}

impl FittedModel {
    pub fn n_observations(&self) -> usize {
        self.scores.len()
    }

    pub fn date_range(&self) -> DateRange {
        // A fitted model always has at least two distinct dates.
        DateRange {
            start: self.dates.first().copied().unwrap_or(self.reference_date),
            end: self.dates.last().copied().unwrap_or(self.reference_date),
        }
    }

    pub fn max_observed(&self) -> f64 {
        self.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn summary(&self) -> FitSummary {
        FitSummary {
            capability: self.capability.clone(),
            params: self.params,
            std_errors: self.std_errors,
            r_squared: self.r_squared,
            n_observations: self.n_observations(),
            date_range: self.date_range(),
        }
    }
}

/// Caller-facing result of a successful fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub capability: String,
    #[serde(flatten)]
    pub params: LogisticParams,
    #[serde(flatten)]
    pub std_errors: ParamErrors,
    pub r_squared: f64,
    pub n_observations: usize,
    pub date_range: DateRange,
}

/// Two-sided confidence interval on a crossing date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: NaiveDate,
    pub upper: NaiveDate,
    pub level: f64,
}

/// The threshold was already met by an observed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievedThreshold {
    pub capability: String,
    pub threshold: f64,
    pub date_achieved: NaiveDate,
}

/// A projected future crossing of a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdForecast {
    pub capability: String,
    pub threshold: f64,
    pub predicted_date: NaiveDate,
    pub confidence_interval: ConfidenceInterval,
    /// Days from the as-of date to the crossing (truncated toward zero).
    pub days_until: i64,
    /// Fitted curve value at the as-of date.
    pub current_predicted_performance: f64,
    pub growth_rate: f64,
    pub saturation_level: f64,
}

/// Answer to "when does this capability cross `threshold`?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThresholdPrediction {
    AlreadyAchieved(AchievedThreshold),
    Forecast(ThresholdForecast),
}

impl ThresholdPrediction {
    pub fn already_achieved(&self) -> bool {
        matches!(self, ThresholdPrediction::AlreadyAchieved(_))
    }

    pub fn threshold(&self) -> f64 {
        match self {
            ThresholdPrediction::AlreadyAchieved(a) => a.threshold,
            ThresholdPrediction::Forecast(f) => f.threshold,
        }
    }

    pub fn as_forecast(&self) -> Option<&ThresholdForecast> {
        match self {
            ThresholdPrediction::Forecast(f) => Some(f),
            ThresholdPrediction::AlreadyAchieved(_) => None,
        }
    }
}

/// Fitted curve sampled over history plus a future horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCurve {
    pub capability: String,
    pub dates: Vec<NaiveDate>,
    pub predictions: Vec<f64>,
    /// `dates[..historical_cutoff_index]` are observation dates; the rest are projected.
    pub historical_cutoff_index: usize,
}

impl ForecastCurve {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn historical(&self) -> (&[NaiveDate], &[f64]) {
        let cut = self.historical_cutoff_index.min(self.len());
        (&self.dates[..cut], &self.predictions[..cut])
    }

    pub fn projected(&self) -> (&[NaiveDate], &[f64]) {
        let cut = self.historical_cutoff_index.min(self.len());
        (&self.dates[cut..], &self.predictions[cut..])
    }
}

/// A future threshold milestone prepared for downstream visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastNode {
    pub capability: String,
    pub threshold: f64,
    pub predicted_date: NaiveDate,
    pub confidence_interval: ConfidenceInterval,
    pub days_until: i64,
}

impl From<&ThresholdForecast> for ForecastNode {
    fn from(f: &ThresholdForecast) -> Self {
        Self {
            capability: f.capability.clone(),
            threshold: f.threshold,
            predicted_date: f.predicted_date,
            confidence_interval: f.confidence_interval,
            days_until: f.days_until,
        }
    }
}

/// One parsed input row: a benchmark score attributed to a capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    /// 1-based line number in the source file (for diagnostics).
    pub line: usize,
    pub capability: String,
    pub date: NaiveDate,
    pub score: f64,
}

/// Goodness-of-fit block of a capability report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub r_squared: f64,
    pub sse: f64,
    pub n_observations: usize,
    pub date_range: DateRange,
}

impl From<&FittedModel> for FitQuality {
    fn from(m: &FittedModel) -> Self {
        Self {
            r_squared: m.r_squared,
            sse: m.sse,
            n_observations: m.n_observations(),
            date_range: m.date_range(),
        }
    }
}

/// Parameter block of a capability report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(flatten)]
    pub params: LogisticParams,
    #[serde(flatten)]
    pub std_errors: ParamErrors,
}

/// A threshold whose prediction failed, kept so one bad threshold does not
/// hide the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFailure {
    pub threshold: f64,
    pub error: String,
}

/// Everything computed for one capability in a batch run.
///
/// `success = false` reports carry only `error`; no partial parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub capability: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_quality: Option<FitQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<ModelParameters>,
    #[serde(default)]
    pub threshold_predictions: Vec<ThresholdPrediction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threshold_failures: Vec<ThresholdFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_curve: Option<ForecastCurve>,
    #[serde(default)]
    pub forecast_nodes: Vec<ForecastNode>,
}

impl CapabilityReport {
    pub fn failed(capability: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            success: false,
            error: Some(error.into()),
            fit_quality: None,
            model_parameters: None,
            threshold_predictions: Vec::new(),
            threshold_failures: Vec::new(),
            forecast_curve: None,
            forecast_nodes: Vec::new(),
        }
    }

    /// Future forecasts among the threshold predictions.
    pub fn forecasts(&self) -> impl Iterator<Item = &ThresholdForecast> {
        self.threshold_predictions.iter().filter_map(ThresholdPrediction::as_forecast)
    }
}

/// Header written alongside every batch output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub model: String,
    pub confidence_level: f64,
    pub saturation_ceiling: f64,
    pub as_of: NaiveDate,
    pub seed: u64,
    pub data_source: String,
}

/// Settings owned by a forecaster session.
#[derive(Debug, Clone)]
pub struct ForecasterConfig {
    /// Fixed saturation level `L` used for every fit.
    pub saturation_ceiling: f64,
    /// Default confidence level for threshold predictions and node export.
    pub confidence_level: f64,
    /// Monte Carlo draws per threshold prediction.
    pub mc_samples: usize,
    /// Base seed; each prediction derives its own generator from it.
    pub seed: u64,
    /// "Now" for `days_until` and current predicted performance.
    pub as_of: NaiveDate,
    /// Spacing (days) of projected curve samples.
    pub curve_cadence_days: u32,
    pub fit: FitOptions,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            saturation_ceiling: 100.0,
            confidence_level: 0.95,
            mc_samples: 10_000,
            seed: 42,
            as_of: chrono::Local::now().date_naive(),
            curve_cadence_days: 7,
            fit: FitOptions::default(),
        }
    }
}

/// A full batch run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub thresholds: Vec<f64>,
    /// Capabilities with fewer prepared points are skipped.
    pub min_points: usize,
    /// Horizon (days past the last observation) of each forecast curve.
    pub days_ahead: u32,
    /// Threshold highlighted in the terminal summary table.
    pub key_threshold: f64,
    pub forecaster: ForecasterConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_displays_as_span() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(range.to_string(), "2022-01-01 to 2024-06-01");
    }

    #[test]
    fn prediction_serializes_with_status_tag() {
        let pred = ThresholdPrediction::AlreadyAchieved(AchievedThreshold {
            capability: "code_generation".to_string(),
            threshold: 50.0,
            date_achieved: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        });
        let json = serde_json::to_value(&pred).unwrap();
        assert_eq!(json["status"], "already_achieved");
        assert_eq!(json["date_achieved"], "2022-06-01");
        assert!(pred.already_achieved());
        assert!(pred.as_forecast().is_none());
    }

    #[test]
    fn curve_splits_at_cutoff() {
        let d = |day| NaiveDate::from_ymd_opt(2022, 1, day).unwrap();
        let curve = ForecastCurve {
            capability: "x".to_string(),
            dates: vec![d(1), d(2), d(3)],
            predictions: vec![1.0, 2.0, 3.0],
            historical_cutoff_index: 2,
        };
        assert_eq!(curve.historical().1, &[1.0, 2.0]);
        assert_eq!(curve.projected().0, &[d(3)]);
    }
}
