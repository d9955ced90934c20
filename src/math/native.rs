//! Native backend: nalgebra's symmetric eigen decomposition and SVD.

use nalgebra::{DVector, Matrix3};

use crate::error::FitError;
use crate::math::{BackendKind, Design, Eigen3, LinalgBackend, Sym3, solve_least_squares};

/// Iteration cap handed to nalgebra's implicit QR eigen solver.
const MAX_EIGEN_ITERATIONS: usize = 1_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl LinalgBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn symmetric_eigen(&self, m: &Sym3) -> Result<Eigen3, FitError> {
        let matrix = Matrix3::new(
            m[0][0], m[0][1], m[0][2], //
            m[1][0], m[1][1], m[1][2], //
            m[2][0], m[2][1], m[2][2],
        );
        let eig = matrix
            .try_symmetric_eigen(f64::EPSILON, MAX_EIGEN_ITERATIONS)
            .ok_or(FitError::NumericConvergence {
                iterations: MAX_EIGEN_ITERATIONS,
            })?;

        let values = [eig.eigenvalues[0], eig.eigenvalues[1], eig.eigenvalues[2]];
        let mut columns = [[0.0; 3]; 3];
        for (i, row) in columns.iter_mut().enumerate() {
            for (j, x) in row.iter_mut().enumerate() {
                *x = eig.eigenvectors[(i, j)];
            }
        }
        Ok(Eigen3::from_columns(values, &columns))
    }

    fn solve_least_squares(&self, design: &Design, rhs: &[f64]) -> Result<Vec<f64>, FitError> {
        let x = design.to_dmatrix();
        let y = DVector::from_column_slice(rhs);
        solve_least_squares(&x, &y)
            .map(|beta| beta.iter().copied().collect())
            .ok_or_else(|| FitError::degenerate("least-squares system is rank deficient"))
    }
}
