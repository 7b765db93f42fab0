//! Export the forecast summary table to CSV.
//!
//! One row per future threshold forecast, meant for spreadsheets or
//! downstream scripts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::CapabilityReport;
use crate::error::AppError;

pub const SUMMARY_FILE: &str = "forecast_summary.csv";

const HEADER: &str = "capability,threshold,predicted_date,ci_lower,ci_upper,days_until,current_performance";

/// Write the summary table to a CSV file.
pub fn write_summary_csv(path: &Path, reports: &BTreeMap<String, CapabilityReport>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_summary(&mut out, reports)?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write summary CSV: {e}")))
}

/// Write the summary table to any writer.
pub fn write_summary<W: Write>(out: &mut W, reports: &BTreeMap<String, CapabilityReport>) -> Result<(), AppError> {
    writeln!(out, "{HEADER}").map_err(|e| AppError::new(2, format!("Failed to write summary CSV header: {e}")))?;

    for report in reports.values().filter(|r| r.success) {
        for f in report.forecasts() {
            writeln!(
                out,
                "{},{},{},{},{},{},{:.4}",
                csv_field(&f.capability),
                f.threshold,
                f.predicted_date,
                f.confidence_interval.lower,
                f.confidence_interval.upper,
                f.days_until,
                f.current_predicted_performance,
            )
            .map_err(|e| AppError::new(2, format!("Failed to write summary CSV row: {e}")))?;
        }
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
