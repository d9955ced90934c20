//! Shared "fit pipeline" logic used by the `fit`, `rank` and `draw` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> backend selection -> fit (per kind) -> residuals -> outliers
//!
//! The commands can then focus on presentation (printing, exports, scenes).

use crate::domain::{FitConfig, FitKind, FitResult, PointResidual};
use crate::error::{AppError, FitError};
use crate::fit::BestFitSolver;
use crate::io::ingest::{IngestedData, load_points};
use crate::math::BackendKind;
use crate::report::Outliers;

/// Everything computed for one fitted kind.
#[derive(Debug, Clone)]
pub struct KindRun {
    pub kind: FitKind,
    pub result: FitResult,
    pub residuals: Vec<PointResidual>,
    pub outliers: Outliers,
}

/// All computed outputs of a single `bestfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub backend: BackendKind,
    /// Successful fits, in requested order.
    pub runs: Vec<KindRun>,
    /// Kinds that failed, with the reason.
    pub skipped: Vec<(FitKind, String)>,
}

impl RunOutput {
    /// The first successful fit (the one exports are written for).
    pub fn primary(&self) -> Option<&KindRun> {
        self.runs.first()
    }
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_points(&config.csv_path, config.weight_mode)?;
    run_fit_with_data(config, ingest)
}

/// Execute the fitting pipeline on already-ingested points.
///
/// Kinds that fail are reported in `skipped`; the run only fails when none
/// succeed, with the first failure's exit code.
pub fn run_fit_with_data(config: &FitConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let solver = BestFitSolver::from_choice(config.backend)?;
    let backend = solver.backend_kind();
    let cloud = ingest.cloud()?;

    tracing::info!(
        backend = backend.name(),
        kinds = config.kinds.len(),
        points = cloud.len(),
        "fitting"
    );

    let mut runs = Vec::new();
    let mut skipped = Vec::new();
    let mut first_err: Option<FitError> = None;

    for (kind, outcome) in solver.fit_all(&config.kinds, &cloud) {
        match outcome {
            Ok(result) => {
                let residuals = crate::report::compute_residuals(&ingest.samples, &result)?;
                let outliers = crate::report::rank_outliers(&residuals, config.top_n);
                runs.push(KindRun {
                    kind,
                    result,
                    residuals,
                    outliers,
                });
            }
            Err(err) => {
                tracing::warn!(kind = kind.display_name(), %err, "fit failed");
                skipped.push((kind, err.to_string()));
                first_err.get_or_insert(err);
            }
        }
    }

    if runs.is_empty() {
        return Err(match first_err {
            Some(err) => err.into(),
            None => AppError::new(2, "No primitive kinds requested."),
        });
    }

    Ok(RunOutput {
        ingest,
        backend,
        runs,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{BackendChoice, Point, SamplePoint, WeightMode};

    fn config(kinds: Vec<FitKind>) -> FitConfig {
        FitConfig {
            csv_path: PathBuf::from("unused.csv"),
            kinds,
            backend: BackendChoice::Jacobi,
            weight_mode: WeightMode::Auto,
            top_n: 2,
            plot: false,
            plot_width: 80,
            plot_height: 24,
            export_residuals: None,
            export_fit: None,
        }
    }

    fn square_with_bump() -> IngestedData {
        let coords = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.5, 0.5, 0.2],
        ];
        let samples = coords
            .iter()
            .enumerate()
            .map(|(i, c)| SamplePoint {
                id: format!("p{i}"),
                point: Point::from_array(*c),
                weight: None,
            })
            .collect();
        IngestedData::from_samples(samples, false).unwrap()
    }

    #[test]
    fn runs_keep_requested_order() {
        let run = run_fit_with_data(&config(vec![FitKind::Plane, FitKind::Line]), square_with_bump()).unwrap();
        assert_eq!(run.backend, BackendKind::Jacobi);
        assert_eq!(run.runs.len(), 2);
        assert_eq!(run.primary().unwrap().kind, FitKind::Plane);
        assert_eq!(run.runs[0].residuals.len(), 5);
        assert!(run.skipped.is_empty());
    }

    #[test]
    fn bump_is_the_top_outlier_above_the_plane() {
        let run = run_fit_with_data(&config(vec![FitKind::Plane]), square_with_bump()).unwrap();
        let plane_run = &run.runs[0];
        assert_eq!(plane_run.outliers.above[0].sample.id, "p4");
        assert!(plane_run.outliers.below.len() <= 2);
    }

    #[test]
    fn all_kinds_failing_returns_first_error() {
        let samples = (0..4)
            .map(|i| SamplePoint {
                id: format!("p{i}"),
                point: Point::new(i as f64, 0.0, 0.0),
                weight: None,
            })
            .collect();
        let ingest = IngestedData::from_samples(samples, false).unwrap();

        let err = run_fit_with_data(&config(vec![FitKind::Circle, FitKind::Sphere]), ingest).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn partial_failure_is_reported() {
        let samples = (0..4)
            .map(|i| SamplePoint {
                id: format!("p{i}"),
                point: Point::new(i as f64, 0.0, 0.0),
                weight: None,
            })
            .collect();
        let ingest = IngestedData::from_samples(samples, false).unwrap();

        let run = run_fit_with_data(&config(vec![FitKind::Line, FitKind::Circle]), ingest).unwrap();
        assert_eq!(run.runs.len(), 1);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].0, FitKind::Circle);
    }
}
