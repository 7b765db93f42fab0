//! The forecaster session: per-capability fit state plus query entry points.
//!
//! Each capability moves through `Unfit → {Fitted | FitFailed}`. Fitting again
//! replaces whatever was stored before; queries never change state.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{FitSummary, FittedModel, ForecastCurve, ForecastNode, ForecasterConfig, Observation, ThresholdPrediction};
use crate::error::ForecastError;
use crate::fit::fit_logistic;
use crate::forecast::curve::{forecast_curve, nodes_from_predictions};
use crate::forecast::threshold::predict_threshold as predict_crossing;

/// Observable fit state of one capability.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityState {
    Unfit,
    Fitted,
    /// The last fit attempt failed; the reason is kept for diagnostics.
    FitFailed(ForecastError),
}

#[derive(Debug, Clone)]
enum FitRecord {
    Fitted(FittedModel),
    Failed(ForecastError),
}

/// Owns the fitted models of a set of capabilities, keyed by name.
#[derive(Debug, Clone)]
pub struct CapabilityForecaster {
    config: ForecasterConfig,
    records: HashMap<String, FitRecord>,
}

impl CapabilityForecaster {
    pub fn new(config: ForecasterConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Fit `capability` with an explicit saturation ceiling.
    ///
    /// On failure the previous fit (if any) is discarded and the capability is
    /// marked `FitFailed`.
    pub fn fit(
        &mut self,
        capability: &str,
        observations: &[Observation],
        saturation_ceiling: f64,
    ) -> Result<FitSummary, ForecastError> {
        let result = fit_logistic(capability, observations, saturation_ceiling, &self.config.fit);
        self.store(capability, result)
    }

    /// Fit many capabilities in parallel with the session's default ceiling.
    ///
    /// Fits run independently; results are stored once all are done.
    pub fn fit_many(
        &mut self,
        series: &BTreeMap<String, Vec<Observation>>,
    ) -> BTreeMap<String, Result<FitSummary, ForecastError>> {
        let ceiling = self.config.saturation_ceiling;
        let opts = &self.config.fit;
        let results: Vec<(String, Result<FittedModel, ForecastError>)> = series
            .par_iter()
            .map(|(name, obs)| (name.clone(), fit_logistic(name, obs, ceiling, opts)))
            .collect();

        results
            .into_iter()
            .map(|(name, result)| {
                let summary = self.store(&name, result);
                (name, summary)
            })
            .collect()
    }

    fn store(
        &mut self,
        capability: &str,
        result: Result<FittedModel, ForecastError>,
    ) -> Result<FitSummary, ForecastError> {
        match result {
            Ok(model) => {
                let summary = model.summary();
                debug!(capability, r_squared = summary.r_squared, "Stored fitted model");
                self.records.insert(capability.to_string(), FitRecord::Fitted(model));
                Ok(summary)
            }
            Err(err) => {
                warn!(capability, error = %err, "Fit failed");
                self.records
                    .insert(capability.to_string(), FitRecord::Failed(err.clone()));
                Err(err)
            }
        }
    }

    pub fn state(&self, capability: &str) -> CapabilityState {
        match self.records.get(capability) {
            None => CapabilityState::Unfit,
            Some(FitRecord::Fitted(_)) => CapabilityState::Fitted,
            Some(FitRecord::Failed(err)) => CapabilityState::FitFailed(err.clone()),
        }
    }

    /// The stored model, or `NotFitted` if the capability is unfit or its fit failed.
    pub fn fitted(&self, capability: &str) -> Result<&FittedModel, ForecastError> {
        match self.records.get(capability) {
            Some(FitRecord::Fitted(model)) => Ok(model),
            _ => Err(ForecastError::NotFitted {
                capability: capability.to_string(),
            }),
        }
    }

    /// Names of successfully fitted capabilities, sorted.
    pub fn fitted_capabilities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .records
            .iter()
            .filter(|(_, r)| matches!(r, FitRecord::Fitted(_)))
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Predict a threshold crossing with a generator derived from the session
    /// seed, the capability, the threshold, and the confidence level.
    ///
    /// Repeated calls with the same arguments return identical intervals,
    /// regardless of what else has been queried in between.
    pub fn predict_threshold(
        &self,
        capability: &str,
        threshold: f64,
        confidence_level: f64,
    ) -> Result<ThresholdPrediction, ForecastError> {
        let mut rng = StdRng::seed_from_u64(prediction_seed(self.config.seed, capability, threshold, confidence_level));
        self.predict_threshold_with_rng(capability, threshold, confidence_level, &mut rng)
    }

    pub fn predict_threshold_with_rng<R: Rng + ?Sized>(
        &self,
        capability: &str,
        threshold: f64,
        confidence_level: f64,
        rng: &mut R,
    ) -> Result<ThresholdPrediction, ForecastError> {
        let model = self.fitted(capability)?;
        predict_crossing(
            model,
            threshold,
            confidence_level,
            self.config.as_of,
            self.config.mc_samples,
            rng,
        )
    }

    pub fn forecast_curve(&self, capability: &str, days_ahead: u32) -> Result<ForecastCurve, ForecastError> {
        let model = self.fitted(capability)?;
        forecast_curve(model, days_ahead, self.config.curve_cadence_days)
    }

    /// Future milestones for `thresholds` at the session's confidence level.
    ///
    /// Thresholds that are already achieved (or cannot be predicted) are left out.
    pub fn export_nodes(&self, capability: &str, thresholds: &[f64]) -> Result<Vec<ForecastNode>, ForecastError> {
        self.fitted(capability)?;
        let level = self.config.confidence_level;
        Ok(nodes_from_predictions(
            thresholds
                .iter()
                .map(|&thr| self.predict_threshold(capability, thr, level)),
        ))
    }
}

fn prediction_seed(base: u64, capability: &str, threshold: f64, confidence_level: f64) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    capability.hash(&mut hasher);
    threshold.to_bits().hash(&mut hasher);
    confidence_level.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn observations(dates: &[&str], scores: &[f64]) -> Vec<Observation> {
        dates
            .iter()
            .zip(scores.iter())
            .map(|(d, &s)| Observation::new(date(d), s))
            .collect()
    }

    fn code_generation() -> Vec<Observation> {
        observations(
            &["2022-01-01", "2022-06-01", "2023-01-01", "2023-06-01", "2024-01-01", "2024-06-01"],
            &[45.0, 52.0, 61.0, 68.0, 75.0, 82.0],
        )
    }

    fn session() -> CapabilityForecaster {
        CapabilityForecaster::new(ForecasterConfig {
            as_of: date("2024-06-01"),
            mc_samples: 4000,
            ..ForecasterConfig::default()
        })
    }

    #[test]
    fn queries_before_fit_are_not_fitted() {
        let f = session();
        assert_eq!(f.state("code_generation"), CapabilityState::Unfit);
        assert!(matches!(
            f.predict_threshold("code_generation", 90.0, 0.95),
            Err(ForecastError::NotFitted { .. })
        ));
        assert!(matches!(f.forecast_curve("code_generation", 730), Err(ForecastError::NotFitted { .. })));
        assert!(matches!(
            f.export_nodes("code_generation", &[90.0]),
            Err(ForecastError::NotFitted { .. })
        ));
    }

    #[test]
    fn failed_refit_replaces_previous_model() {
        let mut f = session();
        f.fit("code_generation", &code_generation(), 100.0).unwrap();
        assert_eq!(f.state("code_generation"), CapabilityState::Fitted);

        let err = f
            .fit("code_generation", &observations(&["2024-01-01"], &[50.0]), 100.0)
            .unwrap_err();
        assert_eq!(f.state("code_generation"), CapabilityState::FitFailed(err));
        assert!(f.fitted("code_generation").is_err());
        assert!(f.fitted_capabilities().is_empty());
    }

    #[test]
    fn session_predictions_are_reproducible() {
        let mut f = session();
        f.fit("code_generation", &code_generation(), 100.0).unwrap();
        let a = f.predict_threshold("code_generation", 90.0, 0.95).unwrap();
        let _ = f.predict_threshold("code_generation", 95.0, 0.95).unwrap();
        let b = f.predict_threshold("code_generation", 90.0, 0.95).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fit_many_isolates_failures() {
        let mut series = BTreeMap::new();
        series.insert("code_generation".to_string(), code_generation());
        series.insert("sparse".to_string(), observations(&["2024-01-01"], &[10.0]));

        let mut f = session();
        let results = f.fit_many(&series);
        assert!(results["code_generation"].is_ok());
        assert!(matches!(results["sparse"], Err(ForecastError::InsufficientData { .. })));
        assert_eq!(f.fitted_capabilities(), vec!["code_generation"]);
    }

    #[test]
    fn session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CapabilityForecaster>();
    }
}
