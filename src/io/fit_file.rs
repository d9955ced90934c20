//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of a fitted primitive:
//! - primitive kind + parameters
//! - quality (residual, rms, eigenvalues)
//! - run metadata (source CSV, backend, timestamp, dataset stats)
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;

use crate::domain::{DatasetStats, FitFile, FitResult};
use crate::error::AppError;

pub const TOOL_NAME: &str = "bestfit";

pub fn fit_file(result: &FitResult, stats: &DatasetStats, source: &Path) -> FitFile {
    FitFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        source: source.display().to_string(),
        backend: result.backend,
        stats: stats.clone(),
        result: result.clone(),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetStats, Plane, Point, PointCloud, Primitive, Vector};
    use crate::fit::BestFitSolver;
    use crate::math::BackendKind;

    #[test]
    fn saved_fit_reads_back() {
        let cloud = PointCloud::from_coords(&[
            [0.0, 0.0, 1.0],
            [2.0, 0.0, 1.0],
            [0.0, 2.0, 1.0],
            [2.0, 2.0, 1.0],
        ]);
        let result = BestFitSolver::with_backend(BackendKind::Jacobi)
            .unwrap()
            .fit_plane(&cloud)
            .unwrap();
        let stats = DatasetStats {
            n_points: 4,
            total_weight: 4.0,
            min: Point::new(0.0, 0.0, 1.0),
            max: Point::new(2.0, 2.0, 1.0),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.json");
        let fit = fit_file(&result, &stats, Path::new("points.csv"));
        write_fit_json(&path, &fit).unwrap();

        let back = read_fit_json(&path).unwrap();
        assert_eq!(back.tool, TOOL_NAME);
        assert_eq!(back.source, "points.csv");
        assert_eq!(back.backend, BackendKind::Jacobi);
        assert_eq!(back.stats.n_points, 4);
        let plane = back.result.plane().unwrap();
        assert_eq!(plane.origin, Point::new(1.0, 1.0, 1.0));
        assert_eq!(plane.normal, Vector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn primitive_is_tagged_by_kind() {
        let p = Primitive::Plane(Plane {
            origin: Point::new(0.0, 0.0, 0.0),
            normal: Vector::new(0.0, 0.0, 1.0),
        });
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["kind"], "plane");
    }

    #[test]
    fn garbage_json_is_exit_code_2() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_fit_json(&path).unwrap_err().exit_code(), 2);
    }
}
