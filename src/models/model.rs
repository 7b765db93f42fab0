//! Model evaluation for the fixed-ceiling logistic curve.
//!
//! The fitter relies on two primitive operations:
//! - fill a Jacobian row for a given time and `(k, t0)` (for Gauss–Newton steps)
//! - predict `y(t)` given the parameters (for residuals, curves, and R²)
//!
//! The forecaster additionally needs the analytic inverse: the time at which
//! the curve reaches a given level.

use crate::domain::LogisticParams;
use crate::math::{log_odds_gap, sigmoid};

/// Number of estimated parameters (`k`, `t0`); `L` is fixed.
pub const FREE_PARAMS: usize = 2;

/// Predict `y(t) = L / (1 + exp(-k (t - t0)))`.
pub fn predict(t: f64, params: &LogisticParams) -> f64 {
    params.ceiling * sigmoid(params.growth_rate * (t - params.midpoint))
}

/// Fill the Jacobian row `[∂y/∂k, ∂y/∂t0]` at time `t`.
///
/// With `s = σ(k (t - t0))`:
/// - `∂y/∂k  =  L s (1 - s) (t - t0)`
/// - `∂y/∂t0 = -L s (1 - s) k`
///
/// # Panics
/// Panics if `out` has fewer than [`FREE_PARAMS`] elements.
pub fn fill_jacobian_row(t: f64, params: &LogisticParams, out: &mut [f64]) {
    let dt = t - params.midpoint;
    let s = sigmoid(params.growth_rate * dt);
    let slope = params.ceiling * s * (1.0 - s);
    out[0] = slope * dt;
    out[1] = -slope * params.growth_rate;
}

/// Time at which the curve reaches `level`: `t0 - ln(L / level - 1) / k`.
///
/// Only meaningful for `0 < level < L` and `k > 0`; otherwise the result is
/// non-finite and callers must validate before converting to a date.
pub fn crossing_time(level: f64, params: &LogisticParams) -> f64 {
    params.midpoint - log_odds_gap(params.ceiling, level) / params.growth_rate
}
