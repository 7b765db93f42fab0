//! `capability-forecast` library crate.
//!
//! The binary (`capfc`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the forecasting core (`fit`, `forecast`) can be embedded without the CLI
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
