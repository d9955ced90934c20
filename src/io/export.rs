//! Export per-point results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::domain::{PointResidual, SamplePoint};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ResidualRow<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    z: f64,
    weight: Option<f64>,
    distance: f64,
    abs_distance: f64,
}

#[derive(Debug, Serialize)]
struct PointRow<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    z: f64,
    weight: Option<f64>,
}

/// Write per-point distances to a CSV file.
pub fn write_residuals_csv(path: &Path, residuals: &[PointResidual]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for r in residuals {
        let p = r.sample.point;
        writer
            .serialize(ResidualRow {
                id: &r.sample.id,
                x: p.x,
                y: p.y,
                z: p.z,
                weight: r.sample.weight,
                distance: r.distance,
                abs_distance: r.distance.abs(),
            })
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write samples in the same layout `ingest::load_points` reads.
pub fn write_points_csv(path: &Path, samples: &[SamplePoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create points CSV '{}': {e}", path.display())))?;

    for s in samples {
        writer
            .serialize(PointRow {
                id: &s.id,
                x: s.point.x,
                y: s.point.y,
                z: s.point.z,
                weight: s.weight,
            })
            .map_err(|e| AppError::new(2, format!("Failed to write points CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush points CSV: {e}")))?;
    Ok(())
}
