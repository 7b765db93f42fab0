//! Numerically stable logistic primitives.
//!
//! The growth model is built from two functions:
//!
//! - `σ(z) = 1 / (1 + exp(-z))`
//! - `g(L, y) = ln(L / y - 1)`, the log-odds gap used to invert the curve
//!
//! Numerical notes:
//! - For large negative `z`, `exp(-z)` overflows. We switch to the equivalent
//!   `exp(z) / (1 + exp(z))` form so `σ` stays in `[0, 1]` without `inf/inf`.
//! - `L / y - 1` loses precision when `y` is close to `L`; computing
//!   `(L - y) / y` keeps the small difference exact.

/// Logistic sigmoid `1 / (1 + exp(-z))`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(L / y - 1)` for `0 < y < L`.
///
/// Returns NaN outside that domain; callers validate first.
pub fn log_odds_gap(ceiling: f64, y: f64) -> f64 {
    ((ceiling - y) / y).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_limits_and_midpoint() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn sigmoid_is_symmetric() {
        for &z in &[0.1, 1.0, 5.0, 30.0] {
            assert!((sigmoid(z) + sigmoid(-z) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn log_odds_gap_inverts_sigmoid() {
        let ceiling = 100.0;
        for &z in &[-3.0, -0.5, 0.0, 2.0] {
            let y = ceiling * sigmoid(z);
            // y = L σ(z)  =>  ln(L/y - 1) = -z
            assert!((log_odds_gap(ceiling, y) + z).abs() < 1e-10);
        }
        assert!(log_odds_gap(100.0, 0.0).is_infinite());
    }
}
