//! Logistic growth model implementation.
//!
//! The model is implemented as small, pure functions so that fitting and
//! forecasting code can share them without carrying state.

pub mod model;

pub use model::*;
