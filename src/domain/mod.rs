//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations and per-capability series inputs (`Observation`)
//! - fit outputs (`LogisticParams`, `FittedModel`, `FitSummary`)
//! - forecast outputs (`ThresholdPrediction`, `ForecastCurve`, `ForecastNode`)
//! - batch outputs (`ScoreRow`, `CapabilityReport`, `RunMetadata`)
//! - run configuration (`ForecasterConfig`, `RunConfig`)
//! - calendar helpers for the elapsed-days time axis

pub mod calendar;
pub mod types;

pub use calendar::*;
pub use types::*;
