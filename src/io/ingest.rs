//! CSV ingest of benchmark scores.
//!
//! Expected columns (case-insensitive, any order):
//!
//! - `date`: observation date
//! - `score`: benchmark score (finite float)
//! - `capability`: capability name the score is attributed to
//!
//! Extra columns (`benchmark`, `model`, ...) are ignored. Rows that fail to
//! parse are collected as row errors; the run only fails when no row survives.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::ScoreRow;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 3] = ["date", "score", "capability"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed rows + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub rows: Vec<ScoreRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Load score rows from a CSV file.
pub fn load_observations(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_observations(file)?;
    debug!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used(),
        "Loaded score CSV"
    );
    Ok(data)
}

/// Parse score rows from any CSV reader (used by `load_observations`).
pub fn read_observations<R: std::io::Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map, line) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(count = row_errors.len(), "Skipped invalid CSV rows");
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No valid rows found in the input CSV."));
    }

    Ok(IngestedData {
        rows,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often put a UTF-8 BOM in front of the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>, line: usize) -> Result<ScoreRow, String> {
    let capability = get_required(record, header_map, "capability")?.to_string();
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let raw_score = get_required(record, header_map, "score")?;
    let score = raw_score
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid score '{raw_score}' (must be a finite number)."))?;

    Ok(ScoreRow {
        line,
        capability,
        date,
        score,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// Parse a date in one of the accepted formats.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO first; a few common spreadsheet layouts are accepted as well.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY."
    ))
}
