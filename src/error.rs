//! Error types.
//!
//! - [`ForecastError`] is the typed error returned by every forecasting-core
//!   operation. Batch code records it per capability and keeps going.
//! - [`AppError`] is what the `capfc` binary surfaces: a message plus a process
//!   exit code.

use thiserror::Error;

/// Errors produced by fitting and forecasting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// Too few distinct time points to estimate a growth rate.
    #[error("Insufficient data: need at least {required} distinct dates, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The nonlinear solve (or its covariance estimate) did not produce a
    /// usable parameter set.
    #[error("Fit did not converge: {reason}")]
    Convergence { reason: String },

    #[error("Threshold {threshold} exceeds saturation ceiling {ceiling}")]
    ThresholdExceedsCeiling { threshold: f64, ceiling: f64 },

    #[error("Capability '{capability}' has not been fitted")]
    NotFitted { capability: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Every Monte Carlo draw had a non-positive growth rate.
    #[error("Monte Carlo sampling produced no valid growth-rate samples")]
    NoValidSamples,

    #[error("Day offset {days} cannot be represented as a calendar date")]
    DateOutOfRange { days: f64 },
}

impl ForecastError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn convergence(reason: impl Into<String>) -> Self {
        Self::Convergence {
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let exit_code = match err {
            ForecastError::InvalidParameter { .. } => 2,
            ForecastError::InsufficientData { .. } => 3,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_error_message_names_both_values() {
        let err = ForecastError::ThresholdExceedsCeiling {
            threshold: 105.0,
            ceiling: 100.0,
        };
        assert_eq!(err.to_string(), "Threshold 105 exceeds saturation ceiling 100");
    }

    #[test]
    fn app_error_exit_codes_follow_error_kind() {
        let usage: AppError = ForecastError::invalid("threshold", "must be finite").into();
        assert_eq!(usage.exit_code(), 2);

        let data: AppError = ForecastError::InsufficientData { required: 2, actual: 1 }.into();
        assert_eq!(data.exit_code(), 3);

        let numeric: AppError = ForecastError::convergence("singular covariance").into();
        assert_eq!(numeric.exit_code(), 4);
        assert_eq!(numeric.to_string(), "Fit did not converge: singular covariance");
    }

    #[test]
    fn forecast_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ForecastError>();
    }
}
