//! JSON result files.
//!
//! - `forecast_results.json`: run metadata plus the full report of every
//!   capability (failed ones carry only their error)
//! - `forecast_nodes.json`: run metadata plus a flat list of future
//!   threshold milestones across all capabilities

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CapabilityReport, ForecastNode, RunMetadata};
use crate::error::AppError;

pub const RESULTS_FILE: &str = "forecast_results.json";
pub const NODES_FILE: &str = "forecast_nodes.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub metadata: RunMetadata,
    pub capabilities: BTreeMap<String, CapabilityReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesFile {
    pub metadata: RunMetadata,
    pub nodes: Vec<ForecastNode>,
}

/// Write `forecast_results.json`.
pub fn write_results_json(
    path: &Path,
    metadata: &RunMetadata,
    reports: &BTreeMap<String, CapabilityReport>,
) -> Result<(), AppError> {
    let doc = ResultsFile {
        metadata: metadata.clone(),
        capabilities: reports.clone(),
    };
    write_json(path, &doc)
}

/// Write `forecast_nodes.json` (capabilities in name order, thresholds in run order).
pub fn write_nodes_json(
    path: &Path,
    metadata: &RunMetadata,
    reports: &BTreeMap<String, CapabilityReport>,
) -> Result<(), AppError> {
    let doc = NodesFile {
        metadata: metadata.clone(),
        nodes: collect_nodes(reports),
    };
    write_json(path, &doc)
}

pub fn collect_nodes(reports: &BTreeMap<String, CapabilityReport>) -> Vec<ForecastNode> {
    reports
        .values()
        .filter(|r| r.success)
        .flat_map(|r| r.forecast_nodes.iter().cloned())
        .collect()
}

/// Read back a `forecast_results.json` file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))
}
