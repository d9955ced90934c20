//! Eigen pairs of symmetric 3×3 matrices and their canonical ordering.
//!
//! Backends return eigen pairs in whatever order their algorithm produces.
//! `Eigen3::canonical` turns that into a deterministic, backend-independent
//! result:
//!
//! - pairs sorted ascending by eigenvalue (stable sort)
//! - tied eigenvalues re-spanned from the world axes
//! - every vector sign-normalised (`Vector::canonical_sign`)
//!
//! Tie rule: eigenvalues within `TIE_ULPS × ε × max(|λ|)` of the first value
//! of a group form one eigenspace. The tolerance sits at rounding level, so
//! small but distinct eigenvalues of a thin cloud are never merged. Its basis is rebuilt by greedily projecting the
//! world axes `x, y, z` into the eigenspace (largest remaining projection
//! first, axis order on equal lengths) and orthonormalising. The first
//! vector chosen goes to the highest slot of the group, so an isotropic cloud
//! has its principal direction along world `x`.

use crate::domain::Vector;

/// Row-major symmetric 3×3 matrix.
pub type Sym3 = [[f64; 3]; 3];

/// Gap, in units of `f64::EPSILON × max(|λ|)`, under which two eigenvalues
/// are treated as equal.
pub const TIE_ULPS: f64 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigen3 {
    pub values: [f64; 3],
    /// `vectors[i]` belongs to `values[i]`.
    pub vectors: [Vector; 3],
}

impl Eigen3 {
    /// Build from a matrix whose *columns* are the eigenvectors.
    pub fn from_columns(values: [f64; 3], columns: &[[f64; 3]; 3]) -> Self {
        let col = |j: usize| Vector::new(columns[0][j], columns[1][j], columns[2][j]);
        Self {
            values,
            vectors: [col(0), col(1), col(2)],
        }
    }

    pub fn smallest(&self) -> (f64, Vector) {
        (self.values[0], self.vectors[0])
    }

    pub fn largest(&self) -> (f64, Vector) {
        (self.values[2], self.vectors[2])
    }

    /// Sorted, tie-resolved, sign-normalised copy.
    ///
    /// The input matrix is positive semi-definite for every caller in this
    /// crate, so eigenvalues that round below zero are clamped to `0.0`.
    pub fn canonical(&self) -> Self {
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut values = order.map(|i| self.values[i].max(0.0));
        let mut vectors = order.map(|i| self.vectors[i].normalize().unwrap_or(Vector::zero()));

        let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tol = TIE_ULPS * f64::EPSILON * scale.max(f64::MIN_POSITIVE);

        let mut start = 0;
        while start < 3 {
            let mut end = start + 1;
            while end < 3 && values[end] - values[start] <= tol {
                end += 1;
            }
            if end - start > 1 {
                respan_from_world_axes(&mut vectors[start..end]);
                // Tied values are equal up to rounding; report them identically.
                let mean = values[start..end].iter().sum::<f64>() / (end - start) as f64;
                for v in &mut values[start..end] {
                    *v = mean;
                }
            }
            start = end;
        }

        Self {
            values,
            vectors: vectors.map(Vector::canonical_sign),
        }
    }
}

/// Replace an orthonormal basis of an eigenspace with one derived from the
/// world axes. The first chosen vector lands in the last slot.
fn respan_from_world_axes(basis: &mut [Vector]) {
    let original: Vec<Vector> = basis.to_vec();
    let axes = [Vector::x_axis(), Vector::y_axis(), Vector::z_axis()];
    let mut chosen: Vec<Vector> = Vec::with_capacity(basis.len());

    for _ in 0..basis.len() {
        let mut best: Option<(Vector, f64)> = None;
        for axis in axes {
            let mut v = original
                .iter()
                .fold(Vector::zero(), |acc, &b| acc + b * axis.dot(b));
            for &c in &chosen {
                v = v - c * v.dot(c);
            }
            let n = v.norm();
            if best.is_none_or(|(_, bn)| n > bn + 1e-12) {
                best = Some((v, n));
            }
        }
        match best.and_then(|(v, _)| v.normalize()) {
            Some(v) => chosen.push(v),
            // Cannot happen for an orthonormal input basis; keep the solver's.
            None => return,
        }
    }

    for (slot, v) in basis.iter_mut().rev().zip(chosen) {
        *slot = v;
    }
}
