//! Least squares solver.
//!
//! Every damped Gauss–Newton step in the curve fitter is a small linear
//! least-squares problem:
//!
//! ```text
//! minimize ‖A δ - b‖²
//! ```
//!
//! where `A` stacks the residual Jacobian on top of the damping rows.
//!
//! Implementation choices:
//! - We use SVD so the tall (more rows than columns) system is solved robustly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is 2, so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    // A flat curve (sigmoid saturated at 0 or 1 over the whole window) makes
    // the Jacobian columns nearly zero, so we retry with looser cutoffs before
    // giving up on the step.
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
