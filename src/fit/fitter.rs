//! Fixed-ceiling logistic fitting for a single capability.
//!
//! Given:
//! - observation dates `d_i` and scores `y_i`
//! - a saturation ceiling `L`
//!
//! we convert dates to elapsed days `t_i` since the earliest observation and
//! estimate `(k, t0)` in
//!
//! ```text
//! y(t) = L / (1 + exp(-k (t - t0)))
//! ```
//!
//! by bounded nonlinear least squares (Levenberg–Marquardt with Marquardt
//! scaling; steps are projected back into the box after each solve). Parameter
//! standard errors come from `s² (JᵀJ)⁻¹` at the solution.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{FittedModel, LogisticParams, Observation, ParamErrors, elapsed_days};
use crate::error::ForecastError;
use crate::fit::start_grid::start_grid;
use crate::math::{mean, r_squared, solve_least_squares};
use crate::models::{FREE_PARAMS, fill_jacobian_row, predict};

/// A growth rate needs two distinct time points.
pub const MIN_DISTINCT_DATES: usize = 2;

/// Damping multiplier applied after a rejected step (and divided out after an accepted one).
const LAMBDA_FACTOR: f64 = 10.0;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
/// Rejected steps allowed per iteration before we give up on finding descent.
const MAX_INNER_STEPS: usize = 60;

/// Fitting options that affect how each capability is calibrated.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Initial growth rate `k₀` (per day).
    pub initial_growth_rate: f64,
    /// Lower bound on `k`. Strictly positive: only non-decreasing curves are fit.
    pub growth_rate_min: f64,
    /// Upper bound on `k`.
    pub growth_rate_max: f64,
    /// Lower bound on `t0` (days relative to the first observation).
    pub midpoint_min: f64,
    /// Upper bound on `t0` as a multiple of the last observation's elapsed days.
    pub midpoint_max_factor: f64,
    /// Outer Levenberg–Marquardt iterations per start.
    pub max_iterations: usize,
    /// Relative tolerance on SSE reduction and on step size.
    pub tolerance: f64,
    /// Number of log-spaced growth rates tried when the primary start fails.
    ///
    /// Zero disables the fallback search.
    pub fallback_starts: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_growth_rate: 0.01,
            growth_rate_min: 1e-4,
            growth_rate_max: 1.0,
            midpoint_min: -1000.0,
            midpoint_max_factor: 5.0,
            max_iterations: 1000,
            tolerance: 1e-10,
            fallback_starts: 6,
        }
    }
}

/// Box constraints on `(k, t0)` for one series.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bounds {
    pub k: (f64, f64),
    pub t0: (f64, f64),
}

impl Bounds {
    fn clamp(&self, k: f64, t0: f64) -> (f64, f64) {
        (k.clamp(self.k.0, self.k.1), t0.clamp(self.t0.0, self.t0.1))
    }
}

/// Converged solution for one start.
#[derive(Debug, Clone)]
struct Solution {
    params: LogisticParams,
    sse: f64,
    iterations: usize,
}

/// Fit the fixed-ceiling logistic curve to one capability's observations.
///
/// Observations may arrive in any order; they are sorted chronologically
/// (stable, so same-date entries keep their input order).
pub fn fit_logistic(
    capability: &str,
    observations: &[Observation],
    ceiling: f64,
    opts: &FitOptions,
) -> Result<FittedModel, ForecastError> {
    validate_options(ceiling, opts)?;

    if let Some(bad) = observations.iter().find(|o| !o.score.is_finite()) {
        return Err(ForecastError::invalid(
            "observations",
            format!("score on {} is not finite", bad.date),
        ));
    }

    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.date);

    let distinct = count_distinct_dates(&sorted);
    if distinct < MIN_DISTINCT_DATES {
        return Err(ForecastError::InsufficientData {
            required: MIN_DISTINCT_DATES,
            actual: distinct,
        });
    }

    let reference_date = sorted[0].date;
    let dates: Vec<_> = sorted.iter().map(|o| o.date).collect();
    let elapsed: Vec<f64> = dates.iter().map(|&d| elapsed_days(reference_date, d)).collect();
    let scores: Vec<f64> = sorted.iter().map(|o| o.score).collect();

    let t_max = elapsed.iter().copied().fold(0.0_f64, f64::max);
    let t_mean = mean(&elapsed).unwrap_or(0.0);
    let bounds = Bounds {
        k: (opts.growth_rate_min, opts.growth_rate_max),
        t0: (opts.midpoint_min, opts.midpoint_max_factor * t_max),
    };
    if bounds.t0.1 <= bounds.t0.0 {
        return Err(ForecastError::invalid(
            "midpoint bounds",
            format!(
                "upper bound {:.1} is not above lower bound {:.1}",
                bounds.t0.1, bounds.t0.0
            ),
        ));
    }

    let primary = bounds.clamp(opts.initial_growth_rate, t_mean);
    let solution = match levenberg_marquardt(&elapsed, &scores, ceiling, primary, bounds, opts) {
        Ok(s) => s,
        Err(primary_reason) => {
            debug!(
                capability,
                reason = %primary_reason,
                "Primary start failed, trying fallback starts"
            );
            fit_from_fallback_starts(&elapsed, &scores, ceiling, t_mean, t_max, bounds, opts)
                .ok_or_else(|| ForecastError::convergence(primary_reason))?
        }
    };

    let std_errors = parameter_std_errors(&elapsed, &solution)?;

    let fitted: Vec<f64> = elapsed.iter().map(|&t| predict(t, &solution.params)).collect();
    let r2 = r_squared(&scores, &fitted);

    debug!(
        capability,
        k = solution.params.growth_rate,
        t0 = solution.params.midpoint,
        sse = solution.sse,
        iterations = solution.iterations,
        "Logistic fit converged"
    );

    Ok(FittedModel {
        capability: capability.to_string(),
        params: solution.params,
        std_errors,
        reference_date,
        dates,
        elapsed,
        scores,
        r_squared: r2,
        sse: solution.sse,
        iterations: solution.iterations,
    })
}

fn validate_options(ceiling: f64, opts: &FitOptions) -> Result<(), ForecastError> {
    if !(ceiling.is_finite() && ceiling > 0.0) {
        return Err(ForecastError::invalid(
            "saturation_ceiling",
            format!("must be finite and > 0, got {ceiling}"),
        ));
    }
    if !(opts.growth_rate_min.is_finite()
        && opts.growth_rate_max.is_finite()
        && opts.growth_rate_min > 0.0
        && opts.growth_rate_max > opts.growth_rate_min)
    {
        return Err(ForecastError::invalid(
            "growth rate bounds",
            format!(
                "need 0 < min < max, got [{}, {}]",
                opts.growth_rate_min, opts.growth_rate_max
            ),
        ));
    }
    if !(opts.midpoint_min.is_finite() && opts.midpoint_max_factor.is_finite()) {
        return Err(ForecastError::invalid("midpoint bounds", "must be finite"));
    }
    if !opts.initial_growth_rate.is_finite() {
        return Err(ForecastError::invalid("initial_growth_rate", "must be finite"));
    }
    if opts.max_iterations == 0 {
        return Err(ForecastError::invalid("max_iterations", "must be >= 1"));
    }
    if !(opts.tolerance.is_finite() && opts.tolerance > 0.0) {
        return Err(ForecastError::invalid("tolerance", "must be finite and > 0"));
    }
    Ok(())
}

fn count_distinct_dates(sorted: &[Observation]) -> usize {
    let mut n = 0;
    let mut prev = None;
    for o in sorted {
        if prev != Some(o.date) {
            n += 1;
            prev = Some(o.date);
        }
    }
    n
}

fn fit_from_fallback_starts(
    t: &[f64],
    y: &[f64],
    ceiling: f64,
    t_mean: f64,
    t_max: f64,
    bounds: Bounds,
    opts: &FitOptions,
) -> Option<Solution> {
    let starts = start_grid(bounds.k.0, bounds.k.1, opts.fallback_starts, &[t_mean, t_max, 2.0 * t_max]);

    // Deterministic selection: pick the minimum SSE; break ties by start order.
    let mut best: Option<Solution> = None;
    for (k0, t00) in starts {
        let start = bounds.clamp(k0, t00);
        if let Ok(candidate) = levenberg_marquardt(t, y, ceiling, start, bounds, opts) {
            let better = match &best {
                Some(b) => candidate.sse < b.sse,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best
}

fn params_at(ceiling: f64, k: f64, t0: f64) -> LogisticParams {
    LogisticParams {
        ceiling,
        growth_rate: k,
        midpoint: t0,
    }
}

fn sum_squared_residuals(t: &[f64], y: &[f64], params: &LogisticParams) -> f64 {
    t.iter()
        .zip(y.iter())
        .map(|(&ti, &yi)| {
            let r = yi - predict(ti, params);
            r * r
        })
        .sum()
}

fn jacobian(t: &[f64], params: &LogisticParams) -> DMatrix<f64> {
    let mut jac = DMatrix::<f64>::zeros(t.len(), FREE_PARAMS);
    let mut row = [0.0; FREE_PARAMS];
    for (i, &ti) in t.iter().enumerate() {
        fill_jacobian_row(ti, params, &mut row);
        for j in 0..FREE_PARAMS {
            jac[(i, j)] = row[j];
        }
    }
    jac
}

/// Minimise SSE over `(k, t0)` from one starting point.
///
/// Converges when an accepted step reduces SSE by less than `tolerance`
/// (relative), or when the projected step itself becomes negligible. Returns a
/// human-readable reason on failure.
fn levenberg_marquardt(
    t: &[f64],
    y: &[f64],
    ceiling: f64,
    start: (f64, f64),
    bounds: Bounds,
    opts: &FitOptions,
) -> Result<Solution, String> {
    let n = t.len();
    let tol = opts.tolerance;

    let (mut k, mut t0) = start;
    let mut params = params_at(ceiling, k, t0);
    let mut sse = sum_squared_residuals(t, y, &params);
    if !sse.is_finite() {
        return Err(format!("non-finite SSE at start (k={k}, t0={t0})"));
    }

    let mut lambda = LAMBDA_INIT;

    for iter in 1..=opts.max_iterations {
        let jac = jacobian(t, &params);
        let resid = DVector::from_iterator(n, t.iter().zip(y.iter()).map(|(&ti, &yi)| yi - predict(ti, &params)));

        // Marquardt scaling: damp each parameter relative to its own curvature so
        // `k` (~1e-2) and `t0` (~1e2) are treated on comparable footing.
        let scale: Vec<f64> = (0..FREE_PARAMS)
            .map(|j| jac.column(j).norm_squared().max(1e-300))
            .collect();

        let mut accepted = false;
        for _ in 0..MAX_INNER_STEPS {
            let mut a = DMatrix::<f64>::zeros(n + FREE_PARAMS, FREE_PARAMS);
            let mut b = DVector::<f64>::zeros(n + FREE_PARAMS);
            a.view_mut((0, 0), (n, FREE_PARAMS)).copy_from(&jac);
            b.rows_mut(0, n).copy_from(&resid);
            for j in 0..FREE_PARAMS {
                a[(n + j, j)] = (lambda * scale[j]).sqrt();
            }

            let Some(delta) = solve_least_squares(&a, &b) else {
                lambda *= LAMBDA_FACTOR;
                continue;
            };

            let (k_new, t0_new) = bounds.clamp(k + delta[0], t0 + delta[1]);
            let step_k = (k_new - k).abs();
            let step_t0 = (t0_new - t0).abs();
            if step_k <= tol * (k.abs() + tol) && step_t0 <= tol * (t0.abs() + tol) {
                // No representable progress left inside the box.
                return Ok(Solution {
                    params,
                    sse,
                    iterations: iter,
                });
            }

            let candidate = params_at(ceiling, k_new, t0_new);
            let sse_new = sum_squared_residuals(t, y, &candidate);
            if sse_new.is_finite() && sse_new < sse {
                let reduction = (sse - sse_new) / sse.max(f64::MIN_POSITIVE);
                k = k_new;
                t0 = t0_new;
                params = candidate;
                sse = sse_new;
                lambda = (lambda / LAMBDA_FACTOR).max(LAMBDA_MIN);
                accepted = true;

                if reduction <= tol || sse == 0.0 {
                    return Ok(Solution {
                        params,
                        sse,
                        iterations: iter,
                    });
                }
                break;
            }

            lambda *= LAMBDA_FACTOR;
        }

        if !accepted {
            return Err(format!(
                "no descent step found at iteration {iter} (k={k:.6}, t0={t0:.2}, lambda={lambda:.1e})"
            ));
        }
    }

    Err(format!(
        "iteration budget of {} exhausted (k={k:.6}, t0={t0:.2})",
        opts.max_iterations
    ))
}

/// Standard errors of `(k, t0)` from `s² (JᵀJ)⁻¹`, `s² = SSE / (n - 2)`.
fn parameter_std_errors(t: &[f64], solution: &Solution) -> Result<ParamErrors, ForecastError> {
    let n = t.len();
    if n <= FREE_PARAMS {
        return Err(ForecastError::convergence(format!(
            "parameter covariance is undefined: {n} observations leave no residual degrees of freedom for {FREE_PARAMS} parameters"
        )));
    }

    let jac = jacobian(t, &solution.params);
    let jtj = jac.transpose() * &jac;
    let inv = jtj
        .try_inverse()
        .ok_or_else(|| ForecastError::convergence("parameter covariance is singular"))?;

    let s2 = solution.sse / (n - FREE_PARAMS) as f64;
    let var_k = inv[(0, 0)] * s2;
    let var_t0 = inv[(1, 1)] * s2;
    if !(var_k.is_finite() && var_t0.is_finite() && var_k >= 0.0 && var_t0 >= 0.0) {
        return Err(ForecastError::convergence(format!(
            "parameter covariance is not positive (var_k={var_k:e}, var_t0={var_t0:e})"
        )));
    }

    Ok(ParamErrors {
        ceiling: 0.0,
        growth_rate: var_k.sqrt(),
        midpoint: var_t0.sqrt(),
    })
}
