//! Conversions between calendar dates and the model's time axis.
//!
//! The logistic model works in elapsed days since a reference date (the first
//! observation). Fractional day offsets map back to calendar dates by flooring,
//! so `2.9` days after the reference is still the second day.

use chrono::{Duration, NaiveDate};

use crate::error::ForecastError;

/// Offsets beyond this are far outside `NaiveDate`'s range (about ±262k years).
const MAX_DAY_OFFSET: f64 = 1.0e8;

/// Whole days from `reference` to `date` (negative if `date` is earlier).
pub fn elapsed_days(reference: NaiveDate, date: NaiveDate) -> f64 {
    (date - reference).num_days() as f64
}

/// Calendar date `days` after `reference`.
pub fn offset_date(reference: NaiveDate, days: f64) -> Result<NaiveDate, ForecastError> {
    if !days.is_finite() || days.abs() > MAX_DAY_OFFSET {
        return Err(ForecastError::DateOutOfRange { days });
    }
    Duration::try_days(days.floor() as i64)
        .and_then(|d| reference.checked_add_signed(d))
        .ok_or(ForecastError::DateOutOfRange { days })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn elapsed_days_counts_leap_years() {
        assert_eq!(elapsed_days(date(2024, 1, 1), date(2025, 1, 1)), 366.0);
        assert_eq!(elapsed_days(date(2024, 1, 1), date(2023, 12, 31)), -1.0);
    }

    #[test]
    fn offset_date_floors_fractional_days() {
        let reference = date(2022, 1, 1);
        assert_eq!(offset_date(reference, 2.9).unwrap(), date(2022, 1, 3));
        assert_eq!(offset_date(reference, -0.5).unwrap(), date(2021, 12, 31));
    }

    #[test]
    fn offset_date_rejects_unrepresentable_offsets() {
        let reference = date(2022, 1, 1);
        assert!(matches!(
            offset_date(reference, f64::INFINITY),
            Err(ForecastError::DateOutOfRange { .. })
        ));
        assert!(matches!(
            offset_date(reference, 5.0e8),
            Err(ForecastError::DateOutOfRange { .. })
        ));
    }
}
