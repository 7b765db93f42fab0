//! Fallback start generation.
//!
//! The primary start (`k₀ = 0.01`, `t0₀ = mean(t)`) converges for most series.
//! When it does not, we retry from a deterministic grid:
//!
//! - growth rates log-spaced across the `k` bounds (rates span orders of
//!   magnitude, so linear spacing would waste most starts near the top)
//! - a handful of midpoint guesses supplied by the caller
//!
//! The grid is ordered growth-rate-major, which fixes the tie-break order when
//! two starts reach the same SSE.

use crate::error::ForecastError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, ForecastError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(ForecastError::invalid(
            "log_space range",
            format!("min={min}, max={max} (must be finite, >0, and max>min)"),
        ));
    }
    if steps < 2 {
        return Err(ForecastError::invalid("log_space steps", "must be >= 2"));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// `(k, t0)` start pairs: `k_steps` growth rates × the given midpoints.
///
/// Returns an empty grid when `k_steps` is 0 or the range is unusable; a single
/// step yields the geometric midpoint of the range.
pub fn start_grid(k_min: f64, k_max: f64, k_steps: usize, midpoints: &[f64]) -> Vec<(f64, f64)> {
    let rates = match k_steps {
        0 => Vec::new(),
        1 => vec![(k_min * k_max).sqrt()],
        n => log_space(k_min, k_max, n).unwrap_or_default(),
    };

    let mut out = Vec::with_capacity(rates.len() * midpoints.len());
    for &k in &rates {
        for &t0 in midpoints {
            out.push((k, t0));
        }
    }
    out
}
