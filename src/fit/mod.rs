//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - convert a capability's dated scores to the elapsed-days axis
//! - estimate `(k, t0)` by bounded Levenberg–Marquardt (`fitter`)
//! - fall back to a deterministic grid of starts when the primary start fails (`start_grid`)

pub mod fitter;
pub mod start_grid;

pub use fitter::*;
pub use start_grid::*;
