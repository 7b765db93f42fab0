//! Per-capability series preparation.
//!
//! Turns flat ingest rows into one chronological series per capability:
//!
//! - rows are grouped by capability name (trimmed, case preserved)
//! - each series is sorted by date; for repeated dates the last row in file
//!   order wins
//! - series with fewer than `min_points` dates are skipped and reported
//! - scores outside `[0, ceiling]` are kept but flagged

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::{Observation, ScoreRow};

/// A capability left out of the batch, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSeries {
    pub capability: String,
    pub n_points: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedSeries {
    pub series: BTreeMap<String, Vec<Observation>>,
    pub skipped: Vec<SkippedSeries>,
    /// Capabilities with at least one score outside `[0, ceiling]`.
    pub out_of_range: Vec<String>,
}

impl PreparedSeries {
    pub fn n_points(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

pub fn prepare_series(rows: &[ScoreRow], min_points: usize, ceiling: f64) -> PreparedSeries {
    let mut grouped: BTreeMap<String, BTreeMap<chrono::NaiveDate, f64>> = BTreeMap::new();
    for row in rows {
        let name = row.capability.trim();
        if name.is_empty() {
            continue;
        }
        // Later rows overwrite earlier ones on the same date.
        grouped
            .entry(name.to_string())
            .or_default()
            .insert(row.date, row.score);
    }

    let mut out = PreparedSeries::default();
    for (capability, by_date) in grouped {
        let n_points = by_date.len();
        if n_points < min_points {
            warn!(
                capability = %capability,
                n_points,
                min_points,
                "Skipping capability with too few data points"
            );
            out.skipped.push(SkippedSeries {
                capability,
                n_points,
                reason: format!("only {n_points} data points (need {min_points})"),
            });
            continue;
        }

        let observations: Vec<Observation> = by_date
            .into_iter()
            .map(|(date, score)| Observation::new(date, score))
            .collect();

        if observations.iter().any(|o| o.score < 0.0 || o.score > ceiling) {
            warn!(
                capability = %capability,
                ceiling,
                "Scores fall outside [0, saturation ceiling]"
            );
            out.out_of_range.push(capability.clone());
        }

        out.series.insert(capability, observations);
    }

    out
}
