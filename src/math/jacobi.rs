//! Portable backend: cyclic Jacobi eigen solver + normal-equation least squares.
//!
//! Each sweep visits the three off-diagonal pairs `(0,1)`, `(0,2)`, `(1,2)` and
//! zeroes them with a plane rotation. For 3×3 symmetric matrices convergence
//! is quadratic; a handful of sweeps reach machine precision. The sweep
//! budget is bounded and exhausting it is reported as `NumericConvergence`.

use crate::error::FitError;
use crate::math::{BackendKind, Design, Eigen3, LinalgBackend, Sym3, solve_normal_equations};

/// Default sweep budget.
pub const DEFAULT_MAX_SWEEPS: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct JacobiBackend {
    pub max_sweeps: usize,
}

impl Default for JacobiBackend {
    fn default() -> Self {
        Self {
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }
}

impl LinalgBackend for JacobiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Jacobi
    }

    fn symmetric_eigen(&self, m: &Sym3) -> Result<Eigen3, FitError> {
        let (values, vectors) = jacobi_eigen(m, self.max_sweeps)?;
        Ok(Eigen3::from_columns(values, &vectors))
    }

    fn solve_least_squares(&self, design: &Design, rhs: &[f64]) -> Result<Vec<f64>, FitError> {
        solve_normal_equations(design, rhs)
            .ok_or_else(|| FitError::degenerate("least-squares system is rank deficient"))
    }
}

/// Eigenvalues and eigenvector columns of a symmetric 3×3 matrix.
///
/// An off-diagonal entry is settled once it is negligible next to its two
/// diagonal entries (`|a_pq| ≤ ε·√|a_pp·a_qq|`), so small eigenvalues of a
/// thin cloud are resolved to their own precision rather than to that of the
/// largest one. If the budget runs out with the matrix diagonal to `ε·‖A‖`
/// the result is still returned.
pub fn jacobi_eigen(m: &Sym3, max_sweeps: usize) -> Result<([f64; 3], Sym3), FitError> {
    let mut a = *m;
    let mut v = identity();

    let scale = frobenius(&a);
    if scale == 0.0 {
        return Ok(([0.0; 3], v));
    }
    let floor = f64::EPSILON * f64::EPSILON * scale;

    for _ in 0..max_sweeps {
        if PAIRS.iter().all(|&(p, q)| settled(&a, p, q, floor)) {
            return Ok(([a[0][0], a[1][1], a[2][2]], v));
        }
        for (p, q) in PAIRS {
            if settled(&a, p, q, floor) {
                continue;
            }
            let j = rotation(&a, p, q);
            a = mul(&transpose(&j), &mul(&a, &j));
            a[p][q] = 0.0;
            a[q][p] = 0.0;
            v = mul(&v, &j);
        }
    }

    if PAIRS.iter().all(|&(p, q)| settled(&a, p, q, floor)) || off_diagonal(&a) <= f64::EPSILON * scale {
        return Ok(([a[0][0], a[1][1], a[2][2]], v));
    }

    tracing::warn!(max_sweeps, "jacobi eigen solver exhausted its sweep budget");
    Err(FitError::NumericConvergence {
        iterations: max_sweeps,
    })
}

const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

fn settled(a: &Sym3, p: usize, q: usize, floor: f64) -> bool {
    let x = a[p][q].abs();
    x <= floor || x <= f64::EPSILON * (a[p][p] * a[q][q]).abs().sqrt()
}

/// Rotation `J` in the `(p, q)` plane such that `(Jᵀ A J)[p][q] = 0`.
///
/// Uses the small-angle form `t = sgn(θ) / (|θ| + √(θ² + 1))` so that the
/// rotation never exceeds 45° and stays accurate for nearly diagonal input.
fn rotation(a: &Sym3, p: usize, q: usize) -> Sym3 {
    let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;

    let mut j = identity();
    j[p][p] = c;
    j[q][q] = c;
    j[p][q] = s;
    j[q][p] = -s;
    j
}

fn identity() -> Sym3 {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

fn transpose(m: &Sym3) -> Sym3 {
    let mut t = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            t[j][i] = x;
        }
    }
    t
}

fn mul(a: &Sym3, b: &Sym3) -> Sym3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn frobenius(m: &Sym3) -> f64 {
    m.iter().flatten().map(|x| x * x).sum::<f64>().sqrt()
}

fn off_diagonal(m: &Sym3) -> f64 {
    (2.0 * (m[0][1] * m[0][1] + m[0][2] * m[0][2] + m[1][2] * m[1][2])).sqrt()
}
