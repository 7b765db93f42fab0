//! Synthetic capability series and the built-in reference series.
//!
//! The synthetic generator samples a known logistic curve on a regular date
//! grid and adds Gaussian noise. It drives the `demo` command and parameter
//! recovery tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{LogisticParams, Observation};
use crate::error::AppError;
use crate::models::predict;

/// Settings for a synthetic series.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub capability: String,
    pub start: NaiveDate,
    /// Number of observations.
    pub n_points: usize,
    /// Days between consecutive observations.
    pub spacing_days: u32,
    /// True curve; `midpoint` is in days since `start`.
    pub params: LogisticParams,
    /// Standard deviation of additive score noise.
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            capability: "synthetic".to_string(),
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            n_points: 16,
            spacing_days: 90,
            params: LogisticParams {
                ceiling: 100.0,
                growth_rate: 0.004,
                midpoint: 900.0,
            },
            noise_std: 2.0,
            seed: 42,
        }
    }
}

/// Generate a noisy logistic series. Scores are clamped to `[0, ceiling]`.
pub fn generate_series(config: &SampleConfig) -> Result<Vec<Observation>, AppError> {
    if config.n_points == 0 {
        return Err(AppError::new(2, "Sample point count must be > 0."));
    }
    if config.spacing_days == 0 {
        return Err(AppError::new(2, "Sample spacing must be at least one day."));
    }
    let p = &config.params;
    if !(p.ceiling.is_finite() && p.ceiling > 0.0 && p.growth_rate.is_finite() && p.midpoint.is_finite()) {
        return Err(AppError::new(2, "Invalid sample curve parameters."));
    }
    if !(config.noise_std.is_finite() && config.noise_std >= 0.0) {
        return Err(AppError::new(2, "Sample noise must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, config.noise_std)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.n_points);
    for i in 0..config.n_points {
        let offset = i as i64 * i64::from(config.spacing_days);
        let date = config
            .start
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| AppError::new(2, "Sample dates overflow the calendar."))?;
        let clean = predict(offset as f64, p);
        let score = (clean + normal.sample(&mut rng)).clamp(0.0, p.ceiling);
        out.push(Observation::new(date, score));
    }
    Ok(out)
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.capability.hash(&mut hasher);
    config.start.hash(&mut hasher);
    config.n_points.hash(&mut hasher);
    config.spacing_days.hash(&mut hasher);
    config.params.ceiling.to_bits().hash(&mut hasher);
    config.params.growth_rate.to_bits().hash(&mut hasher);
    config.params.midpoint.to_bits().hash(&mut hasher);
    config.noise_std.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// The six-point code generation series used by the demo and examples.
pub fn code_generation_reference() -> Vec<Observation> {
    const POINTS: [((i32, u32), f64); 6] = [
        ((2022, 1), 45.0),
        ((2022, 6), 52.0),
        ((2023, 1), 61.0),
        ((2023, 6), 68.0),
        ((2024, 1), 75.0),
        ((2024, 6), 82.0),
    ];
    POINTS
        .iter()
        .filter_map(|&((y, m), score)| NaiveDate::from_ymd_opt(y, m, 1).map(|d| Observation::new(d, score)))
        .collect()
}
