//! Observation series: preparation of ingested rows and synthetic samples.
//!
//! - grouping, de-duplication, and minimum-length filtering (`series`)
//! - seeded synthetic logistic series and the built-in reference series (`sample`)

pub mod sample;
pub mod series;

pub use sample::*;
pub use series::*;
