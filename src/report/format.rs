//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting and forecasting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::BatchOutput;
use crate::domain::{CapabilityReport, ThresholdPrediction};
use crate::report::{achieved_at, rank_by_arrival};

/// Format the run summary: counts, skipped series, per-capability fits, and
/// the key-threshold table.
pub fn format_batch_summary(output: &BatchOutput, key_threshold: f64) -> String {
    let mut out = String::new();
    let meta = &output.metadata;

    out.push_str("=== capfc - Capability Forecast ===\n");
    out.push_str(&format!("Data: {}\n", meta.data_source));
    out.push_str(&format!(
        "As-of: {} | ceiling={} | confidence={:.0}% | seed={}\n",
        meta.as_of,
        meta.saturation_ceiling,
        meta.confidence_level * 100.0,
        meta.seed
    ));
    out.push_str(&format!(
        "Rows: read={} invalid={} | capabilities: fitted={} failed={} skipped={}\n",
        output.rows_read,
        output.row_errors.len(),
        output.n_succeeded(),
        output.n_failed(),
        output.skipped.len()
    ));

    if !output.skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        for s in &output.skipped {
            out.push_str(&format!("  {}: {}\n", s.capability, s.reason));
        }
    }
    if !output.out_of_range.is_empty() {
        out.push_str(&format!(
            "\nScores outside [0, {}]: {}\n",
            meta.saturation_ceiling,
            output.out_of_range.join(", ")
        ));
    }

    out.push_str("\nFits:\n");
    for report in output.reports.values() {
        out.push_str(&format_fit_line(report));
        out.push('\n');
    }

    out.push_str(&format!("\nThreshold {key_threshold}:\n"));
    out.push_str(&format_threshold_table(output, key_threshold));
    out
}

fn format_fit_line(report: &CapabilityReport) -> String {
    match (&report.fit_quality, &report.model_parameters) {
        (Some(q), Some(p)) if report.success => format!(
            "  {:<28} R²={:.3} n={:<3} k={:.5}±{:.5} t0={:.1}±{:.1}d",
            truncate(&report.capability, 28),
            q.r_squared,
            q.n_observations,
            p.params.growth_rate,
            p.std_errors.growth_rate,
            p.params.midpoint,
            p.std_errors.midpoint,
        ),
        _ => format!(
            "  {:<28} FAILED: {}",
            truncate(&report.capability, 28),
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn format_threshold_table(output: &BatchOutput, threshold: f64) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<28} {:>12} {:>25} {:>8}\n",
            "capability", "date", "interval", "days"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<28} {:-<12} {:-<25} {:-<8}\n", "", "", "", "").trim_end());
    out.push('\n');

    for f in rank_by_arrival(&output.reports, threshold) {
        out.push_str(
            format!(
                "{:<28} {:>12} {:>25} {:>8}\n",
                truncate(&f.capability, 28),
                f.predicted_date.to_string(),
                format!("{} .. {}", f.confidence_interval.lower, f.confidence_interval.upper),
                f.days_until
            )
            .trim_end(),
        );
        out.push('\n');
    }
    for (capability, date) in achieved_at(&output.reports, threshold) {
        out.push_str(&format!("{:<28} {:>12} {:>25}\n", truncate(capability, 28), date.to_string(), "achieved"));
    }
    out
}

/// Per-capability detail block used by the `demo` command.
pub fn format_capability_detail(report: &CapabilityReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} ---\n", report.capability));

    if !report.success {
        out.push_str(&format!("Fit failed: {}\n", report.error.as_deref().unwrap_or("unknown error")));
        return out;
    }

    if let Some(q) = &report.fit_quality {
        out.push_str(&format!(
            "Fit: R²={:.4} SSE={:.3} n={} ({})\n",
            q.r_squared, q.sse, q.n_observations, q.date_range
        ));
    }
    if let Some(p) = &report.model_parameters {
        out.push_str(&format!(
            "Params: L={} k={:.6}±{:.6} t0={:.2}±{:.2}\n",
            p.params.ceiling, p.params.growth_rate, p.std_errors.growth_rate, p.params.midpoint, p.std_errors.midpoint
        ));
    }

    for pred in &report.threshold_predictions {
        match pred {
            ThresholdPrediction::AlreadyAchieved(a) => {
                out.push_str(&format!("  {:>6}: achieved on {}\n", a.threshold, a.date_achieved));
            }
            ThresholdPrediction::Forecast(f) => {
                out.push_str(&format!(
                    "  {:>6}: {} [{} .. {}] in {} days (now {:.1})\n",
                    f.threshold,
                    f.predicted_date,
                    f.confidence_interval.lower,
                    f.confidence_interval.upper,
                    f.days_until,
                    f.current_predicted_performance
                ));
            }
        }
    }
    for failure in &report.threshold_failures {
        out.push_str(&format!("  {:>6}: {}\n", failure.threshold, failure.error));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
