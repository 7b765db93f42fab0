//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - JSON result and node files (`results`)
//! - summary CSV export (`export`)

pub mod export;
pub mod ingest;
pub mod results;

pub use export::*;
pub use ingest::*;
pub use results::*;
