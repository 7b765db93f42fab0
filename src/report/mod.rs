//! Reporting utilities: milestone rankings and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::domain::{CapabilityReport, ThresholdForecast};

/// Future crossings of one threshold, soonest first.
///
/// Capabilities that already reached the threshold, or whose prediction
/// failed, are not listed. Ties keep capability name order.
pub fn rank_by_arrival(reports: &BTreeMap<String, CapabilityReport>, threshold: f64) -> Vec<&ThresholdForecast> {
    let mut rows: Vec<&ThresholdForecast> = reports
        .values()
        .filter(|r| r.success)
        .flat_map(|r| r.forecasts())
        .filter(|f| f.threshold == threshold)
        .collect();
    rows.sort_by_key(|f| f.predicted_date);
    rows
}

/// Capabilities that already reached `threshold`, with the first date observed.
pub fn achieved_at(reports: &BTreeMap<String, CapabilityReport>, threshold: f64) -> Vec<(&str, chrono::NaiveDate)> {
    reports
        .values()
        .flat_map(|r| r.threshold_predictions.iter())
        .filter_map(|p| match p {
            crate::domain::ThresholdPrediction::AlreadyAchieved(a) if a.threshold == threshold => {
                Some((a.capability.as_str(), a.date_achieved))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AchievedThreshold, ConfidenceInterval, ThresholdPrediction};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn forecast(capability: &str, threshold: f64, d: &str) -> ThresholdPrediction {
        let predicted_date = date(d);
        ThresholdPrediction::Forecast(ThresholdForecast {
            capability: capability.to_string(),
            threshold,
            predicted_date,
            confidence_interval: ConfidenceInterval {
                lower: predicted_date,
                upper: predicted_date,
                level: 0.95,
            },
            days_until: 10,
            current_predicted_performance: 50.0,
            growth_rate: 0.003,
            saturation_level: 100.0,
        })
    }

    fn report(capability: &str, predictions: Vec<ThresholdPrediction>) -> CapabilityReport {
        CapabilityReport {
            success: true,
            error: None,
            threshold_predictions: predictions,
            ..CapabilityReport::failed(capability, "")
        }
    }

    #[test]
    fn rank_by_arrival_orders_soonest_first() {
        let mut reports = BTreeMap::new();
        reports.insert(
            "a".to_string(),
            report("a", vec![forecast("a", 90.0, "2027-01-01"), forecast("a", 95.0, "2025-01-01")]),
        );
        reports.insert("b".to_string(), report("b", vec![forecast("b", 90.0, "2026-01-01")]));
        reports.insert(
            "c".to_string(),
            report(
                "c",
                vec![ThresholdPrediction::AlreadyAchieved(AchievedThreshold {
                    capability: "c".to_string(),
                    threshold: 90.0,
                    date_achieved: date("2023-01-01"),
                })],
            ),
        );
        reports.insert("d".to_string(), CapabilityReport::failed("d", "did not converge"));

        let ranked = rank_by_arrival(&reports, 90.0);
        let names: Vec<&str> = ranked.iter().map(|f| f.capability.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert_eq!(achieved_at(&reports, 90.0), vec![("c", date("2023-01-01"))]);
    }
}
