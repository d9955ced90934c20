//! Linear least squares.
//!
//! The algebraic circle and sphere fits reduce to small problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Callers scale rows by `sqrt(w_i)` and hand us an ordinary least squares problem.
//! - The native path uses SVD so rank-deficient systems are detected rather
//!   than silently producing garbage. (Nalgebra's `QR::solve` is intended for
//!   square systems and will panic for non-square matrices.)
//! - The portable path forms the normal equations and runs Gaussian
//!   elimination with partial pivoting. Parameter counts are tiny (3-4
//!   columns) and callers centre their coordinates, which keeps the squared
//!   condition number acceptable.

#[cfg(feature = "native")]
use nalgebra::{DMatrix, DVector};

/// Row-major design matrix built one observation at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    cols: usize,
    data: Vec<f64>,
}

impl Design {
    pub fn new(cols: usize) -> Self {
        Self {
            cols,
            data: Vec::new(),
        }
    }

    /// # Panics
    /// Panics if `row.len()` differs from the column count.
    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(row.len(), self.cols, "design row has wrong length");
        self.data.extend_from_slice(row);
    }

    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[cfg(feature = "native")]
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.rows(), self.cols, &self.data)
    }
}

/// Solve via the normal equations `XᵀX β = Xᵀy`.
///
/// Returns `None` if the system is rank deficient (relative pivot below `1e-12`)
/// or the shapes disagree.
pub fn solve_normal_equations(x: &Design, y: &[f64]) -> Option<Vec<f64>> {
    let n = x.cols();
    if n == 0 || x.rows() != y.len() || x.rows() < n {
        return None;
    }

    // Augmented matrix [XᵀX | Xᵀy].
    let mut a = vec![vec![0.0; n + 1]; n];
    for (i, &yi) in y.iter().enumerate() {
        let row = x.row(i);
        for r in 0..n {
            for c in 0..n {
                a[r][c] += row[r] * row[c];
            }
            a[r][n] += row[r] * yi;
        }
    }

    let scale = (0..n).fold(0.0_f64, |m, i| m.max(a[i][i].abs()));
    if !(scale > 0.0) {
        return None;
    }
    let tol = 1e-12 * scale;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if !(a[pivot][col].abs() > tol) {
            return None;
        }
        a.swap(col, pivot);
        for r in col + 1..n {
            let f = a[r][col] / a[col][col];
            for c in col..=n {
                a[r][c] -= f * a[col][c];
            }
        }
    }

    let mut beta = vec![0.0; n];
    for r in (0..n).rev() {
        let tail: f64 = (r + 1..n).map(|c| a[r][c] * beta[c]).sum();
        beta[r] = (a[r][n] - tail) / a[r][r];
    }

    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
#[cfg(feature = "native")]
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }
    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv > 0.0) {
        return None;
    }
    // Rank check relative to the largest singular value; `SVD::solve` alone
    // would quietly return a minimum-norm solution for singular systems.
    let min_sv = svd.singular_values.min();
    if min_sv <= 1e-12 * max_sv {
        return None;
    }

    let beta = svd.solve(y, 1e-12 * max_sv).ok()?;
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_design() -> Design {
        let mut x = Design::new(2);
        for xi in [0.0, 1.0, 2.0] {
            x.push_row(&[1.0, xi]);
        }
        x
    }

    #[test]
    fn normal_equations_solve_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let beta = solve_normal_equations(&line_design(), &[2.0, 5.0, 8.0]).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn normal_equations_reject_rank_deficient_design() {
        let mut x = Design::new(2);
        for xi in [1.0, 2.0, 3.0] {
            x.push_row(&[xi, 2.0 * xi]);
        }
        assert!(solve_normal_equations(&x, &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn normal_equations_reject_underdetermined_design() {
        let mut x = Design::new(3);
        x.push_row(&[1.0, 0.0, 0.0]);
        assert!(solve_normal_equations(&x, &[1.0]).is_none());
    }

    #[cfg(feature = "native")]
    #[test]
    fn least_squares_solves_simple_system() {
        let x = line_design().to_dmatrix();
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[cfg(feature = "native")]
    #[test]
    fn least_squares_rejects_rank_deficient_design() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
