//! Mathematical utilities: logistic primitives, least squares, and sample statistics.

pub mod logistic;
pub mod ols;
pub mod stats;

pub use logistic::*;
pub use ols::*;
pub use stats::*;
