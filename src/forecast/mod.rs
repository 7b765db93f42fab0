//! Threshold forecasting on top of fitted logistic models.
//!
//! - `threshold`: analytic crossing date + Monte Carlo confidence interval
//! - `curve`: sampled forecast curves and forecast-node filtering
//! - `forecaster`: the session object that owns per-capability fits

pub mod curve;
pub mod forecaster;
pub mod threshold;

pub use curve::*;
pub use forecaster::*;
pub use threshold::*;
