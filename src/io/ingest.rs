//! CSV ingest and normalization.
//!
//! This module is responsible for turning a point-list CSV into a clean set of
//! `(id, point, weight)` samples that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{DatasetStats, Point, PointCloud, SamplePoint, WeightMode};
use crate::error::{AppError, FitError};
use crate::math::bounds;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: normalized samples + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub samples: Vec<SamplePoint>,
    /// Whether per-point weights are in effect for the fit.
    pub weighted: bool,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedData {
    /// Wrap already-normalized samples (e.g. generated ones).
    pub fn from_samples(samples: Vec<SamplePoint>, weighted: bool) -> Result<Self, AppError> {
        let stats = compute_stats(&samples, weighted).ok_or_else(|| AppError::new(3, "No points to fit."))?;
        let n = samples.len();
        Ok(Self {
            samples,
            weighted,
            stats,
            row_errors: Vec::new(),
            rows_read: n,
            rows_used: n,
        })
    }

    pub fn cloud(&self) -> Result<PointCloud, FitError> {
        let points = self.samples.iter().map(|s| s.point).collect();
        if self.weighted {
            let weights = self.samples.iter().map(|s| s.weight.unwrap_or(1.0)).collect();
            PointCloud::with_weights(points, weights)
        } else {
            Ok(PointCloud::new(points))
        }
    }
}

/// Load and normalize a points CSV.
pub fn load_points(path: &Path, weight_mode: WeightMode) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_points(file, weight_mode)
}

/// Normalize points from any CSV reader.
pub fn read_points<R: Read>(input: R, weight_mode: WeightMode) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;
    let weighted = resolve_weighting(weight_mode, &header_map)?;

    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let id = get_optional(&record, &header_map, "id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("p{rows_read}"));

        match parse_row(&record, &header_map, weighted) {
            Ok((point, weight)) => samples.push(SamplePoint { id, point, weight }),
            Err(message) => row_errors.push(RowError {
                line,
                id: Some(id),
                message,
            }),
        }
    }

    for err in &row_errors {
        tracing::warn!(line = err.line, id = ?err.id, "skipping row: {}", err.message);
    }

    let rows_used = samples.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after normalization."));
    }

    let stats = compute_stats(&samples, weighted)
        .ok_or_else(|| AppError::new(3, "No valid points remain after normalization."))?;

    tracing::info!(rows_read, rows_used, weighted, "ingested points");

    Ok(IngestedData {
        samples,
        weighted,
        stats,
        row_errors,
        rows_read,
        rows_used,
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
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM;
    // left in place it makes `x` look like a missing column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for col in ["x", "y", "z"] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{col}`")));
        }
    }
    Ok(())
}

fn resolve_weighting(mode: WeightMode, header_map: &HashMap<String, usize>) -> Result<bool, AppError> {
    let has_weight = header_map.contains_key("weight");
    match mode {
        WeightMode::Auto => Ok(has_weight),
        WeightMode::Uniform => Ok(false),
        WeightMode::Weight if has_weight => Ok(true),
        WeightMode::Weight => Err(AppError::new(
            2,
            "`--weights weight` requires a `weight` column in the CSV.",
        )),
    }
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    weighted: bool,
) -> Result<(Point, Option<f64>), String> {
    let x = parse_coord(record, header_map, "x")?;
    let y = parse_coord(record, header_map, "y")?;
    let z = parse_coord(record, header_map, "z")?;

    let weight = if weighted {
        let w = parse_opt_f64(get_optional(record, header_map, "weight"))
            .ok_or_else(|| "Missing/invalid `weight` value.".to_string())?;
        if w < 0.0 {
            return Err(format!("Negative weight: {w}"));
        }
        Some(w)
    } else {
        None
    };

    Ok((Point::new(x, y, z), weight))
}

fn parse_coord(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, name)?;
    parse_opt_f64(Some(raw)).ok_or_else(|| format!("Invalid `{name}` value: '{raw}'"))
}

fn compute_stats(samples: &[SamplePoint], weighted: bool) -> Option<DatasetStats> {
    let points: Vec<Point> = samples.iter().map(|s| s.point).collect();
    let (min, max) = bounds(&points)?;
    let total_weight = if weighted {
        samples.iter().map(|s| s.weight.unwrap_or(1.0)).sum()
    } else {
        samples.len() as f64
    };
    Some(DatasetStats {
        n_points: samples.len(),
        total_weight,
        min,
        max,
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

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_points_and_skips_bad_rows() {
        let csv = "\u{feff}ID, X ,y,z\n\
                   a,0,0,0\n\
                   b,1,0,oops\n\
                   c,0,1,0\n\
                   d,1,1,\n\
                   e,1,1,0\n";
        let data = read_points(csv.as_bytes(), WeightMode::Auto).unwrap();

        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 3);
        assert!(!data.weighted);
        let ids: Vec<&str> = data.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "e"]);

        assert_eq!(data.row_errors.len(), 2);
        assert_eq!(data.row_errors[0].line, 3);
        assert_eq!(data.row_errors[0].id.as_deref(), Some("b"));
        assert_eq!(data.row_errors[1].line, 5);

        assert_eq!(data.stats.max, Point::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn missing_coordinate_column_is_a_schema_error() {
        let err = read_points("x,y\n1,2\n".as_bytes(), WeightMode::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("`z`"));
    }

    #[test]
    fn weight_column_is_used_in_auto_mode() {
        let csv = "x,y,z,weight\n0,0,0,2\n1,0,0,-1\n2,0,0,0.5\n";
        let data = read_points(csv.as_bytes(), WeightMode::Auto).unwrap();
        assert!(data.weighted);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.stats.total_weight, 2.5);
        let cloud = data.cloud().unwrap();
        assert!(cloud.is_weighted());
        assert_eq!(cloud.weight(1), 0.5);
    }

    #[test]
    fn uniform_mode_ignores_weights() {
        let csv = "x,y,z,weight\n0,0,0,2\n1,0,0,3\n";
        let data = read_points(csv.as_bytes(), WeightMode::Uniform).unwrap();
        assert!(!data.weighted);
        assert!(!data.cloud().unwrap().is_weighted());
        // Ids fall back to the row ordinal.
        assert_eq!(data.samples[1].id, "p2");
    }

    #[test]
    fn weight_mode_requires_column() {
        let err = read_points("x,y,z\n0,0,0\n".as_bytes(), WeightMode::Weight).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn all_rows_invalid_is_exit_code_3() {
        let err = read_points("x,y,z\nnan,0,0\n".as_bytes(), WeightMode::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
