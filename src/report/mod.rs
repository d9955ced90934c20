//! Reporting utilities: residuals, rankings, and formatted terminal output.

pub mod format;

pub use format::*;

use rayon::prelude::*;

use crate::domain::{FitResult, PointResidual, SamplePoint};
use crate::error::AppError;
use crate::models::signed_distance;

/// Points furthest from the fitted primitive (top-N each side).
#[derive(Debug, Clone, Default)]
pub struct Outliers {
    /// Positive distance: above the plane, outside the circle/sphere, or any
    /// point off a line.
    pub above: Vec<PointResidual>,
    /// Negative distance: below the plane, inside the circle/sphere.
    pub below: Vec<PointResidual>,
}

/// Signed distance of every sample to the fitted primitive, in input order.
pub fn compute_residuals(samples: &[SamplePoint], fit: &FitResult) -> Result<Vec<PointResidual>, AppError> {
    let out: Vec<PointResidual> = samples
        .par_iter()
        .enumerate()
        .map(|(index, s)| PointResidual {
            index,
            sample: s.clone(),
            distance: signed_distance(&fit.primitive, s.point),
        })
        .collect();

    if out.iter().any(|r| !r.distance.is_finite()) {
        return Err(AppError::new(4, "Non-finite distance during residual computation."));
    }
    Ok(out)
}

/// Rank the furthest points on each side of the primitive.
pub fn rank_outliers(residuals: &[PointResidual], top_n: usize) -> Outliers {
    let mut above: Vec<PointResidual> = residuals.iter().filter(|r| r.distance > 0.0).cloned().collect();
    above.sort_by(|a, b| b.distance.total_cmp(&a.distance));
    above.truncate(top_n);

    let mut below: Vec<PointResidual> = residuals.iter().filter(|r| r.distance < 0.0).cloned().collect();
    below.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    below.truncate(top_n);

    Outliers { above, below }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Plane, Point, Primitive, Vector};
    use crate::math::BackendKind;

    fn sample(id: &str, z: f64) -> SamplePoint {
        SamplePoint {
            id: id.to_string(),
            point: Point::new(0.0, 0.0, z),
            weight: None,
        }
    }

    fn ground_plane() -> FitResult {
        FitResult {
            primitive: Primitive::Plane(Plane {
                origin: Point::origin(),
                normal: Vector::z_axis(),
            }),
            residual: 0.0,
            rms: 0.0,
            n: 0,
            backend: BackendKind::Jacobi,
            eigenvalues: None,
        }
    }

    #[test]
    fn residuals_keep_input_order() {
        let samples: Vec<SamplePoint> = (0..100).map(|i| sample(&format!("s{i}"), i as f64 - 50.0)).collect();
        let residuals = compute_residuals(&samples, &ground_plane()).unwrap();

        assert_eq!(residuals.len(), 100);
        for (i, r) in residuals.iter().enumerate() {
            assert_eq!(r.index, i);
            assert_eq!(r.distance, i as f64 - 50.0);
        }
    }

    #[test]
    fn outliers_split_by_side() {
        let samples = vec![sample("a", 0.0), sample("b", 2.0), sample("c", -3.0), sample("d", 1.0)];
        let residuals = compute_residuals(&samples, &ground_plane()).unwrap();

        let outliers = rank_outliers(&residuals, 1);
        assert_eq!(outliers.above.len(), 1);
        assert_eq!(outliers.above[0].sample.id, "b");
        assert_eq!(outliers.below.len(), 1);
        assert_eq!(outliers.below[0].sample.id, "c");

        let all = rank_outliers(&residuals, 10);
        let ids: Vec<&str> = all.above.iter().map(|r| r.sample.id.as_str()).collect();
        assert_eq!(ids, ["b", "d"]);
    }
}
