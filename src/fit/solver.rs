//! Least-squares best-fit primitives through point clouds.
//!
//! Given a (weighted) point cloud we compute:
//! - the centroid `c` and scatter matrix `S = Σ wᵢ (pᵢ − c)(pᵢ − c)ᵀ`
//! - its canonical eigen decomposition (see `math::eigen`)
//!
//! and read the primitive off the eigenvectors:
//!
//! - plane: normal = smallest-eigenvalue eigenvector, residual = λ_min
//! - line: direction = largest-eigenvalue eigenvector, residual = λ_min + λ_mid
//! - frame: x = largest, y = middle, z = x × y
//!
//! Circle and sphere are algebraic fits (linear least squares on centred
//! coordinates) solved through the backend.
//!
//! Residuals are always recomputed from the points rather than read off the
//! eigenvalues, so they are exactly non-negative and include any rounding the
//! primitive itself carries.

use rayon::prelude::*;

use crate::domain::{
    Circle, FitKind, FitResult, Frame, Line, Plane, Point, PointCloud, Primitive, Sphere, Vector,
};
use crate::error::FitError;
use crate::math::{
    BackendKind, Design, Eigen3, LinalgBackend, centroid, create_backend, default_backend,
    magnitude, resolve_backend, scatter_matrix, trace,
};
use crate::domain::BackendChoice;
use crate::models::{circle_distance, line_distance, plane_distance, sphere_distance};

/// Relative spread (per unit of coordinate magnitude) below which all points
/// are considered coincident.
const SPREAD_EPS: f64 = 1e-12;

/// An eigenvalue this small relative to the largest one means the cloud is
/// flat in that direction (collinear for circles, coplanar for spheres).
const FLAT_REL: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
struct Moments {
    centroid: Point,
    eigen: Eigen3,
    total_weight: f64,
}

/// Best-fit solver over a linear-algebra backend.
///
/// The solver is stateless apart from its backend and is `Send + Sync`, so a
/// single instance can serve many threads.
#[derive(Debug)]
pub struct BestFitSolver {
    backend: Box<dyn LinalgBackend>,
}

impl Default for BestFitSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BestFitSolver {
    /// Solver on the best backend available in this build.
    pub fn new() -> Self {
        Self::from_backend(default_backend())
    }

    pub fn with_backend(kind: BackendKind) -> Result<Self, FitError> {
        Ok(Self::from_backend(create_backend(kind)?))
    }

    pub fn from_choice(choice: BackendChoice) -> Result<Self, FitError> {
        Ok(Self::from_backend(resolve_backend(choice)?))
    }

    pub fn from_backend(backend: Box<dyn LinalgBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn fit(&self, kind: FitKind, cloud: &PointCloud) -> Result<FitResult, FitError> {
        match kind {
            FitKind::Plane => self.fit_plane(cloud),
            FitKind::Line => self.fit_line(cloud),
            FitKind::Frame => self.fit_frame(cloud),
            FitKind::Circle => self.fit_circle(cloud),
            FitKind::Sphere => self.fit_sphere(cloud),
        }
    }

    /// Fit several kinds in parallel. Output order follows `kinds`.
    pub fn fit_all(
        &self,
        kinds: &[FitKind],
        cloud: &PointCloud,
    ) -> Vec<(FitKind, Result<FitResult, FitError>)> {
        kinds
            .par_iter()
            .map(|&kind| (kind, self.fit(kind, cloud)))
            .collect()
    }

    pub fn fit_plane(&self, cloud: &PointCloud) -> Result<FitResult, FitError> {
        let m = self.moments(FitKind::Plane, cloud)?;
        let (_, normal) = m.eigen.smallest();
        let plane = Plane {
            origin: m.centroid,
            normal,
        };
        let residual = weighted_sum(cloud, |p| plane_distance(&plane, p).powi(2));
        Ok(self.result(Primitive::Plane(plane), residual, &m, cloud, true))
    }

    pub fn fit_line(&self, cloud: &PointCloud) -> Result<FitResult, FitError> {
        let m = self.moments(FitKind::Line, cloud)?;
        let (_, direction) = m.eigen.largest();
        let line = Line {
            origin: m.centroid,
            direction,
        };
        let residual = weighted_sum(cloud, |p| line_distance(&line, p).powi(2));
        Ok(self.result(Primitive::Line(line), residual, &m, cloud, true))
    }

    pub fn fit_frame(&self, cloud: &PointCloud) -> Result<FitResult, FitError> {
        let m = self.moments(FitKind::Frame, cloud)?;
        let xaxis = m.eigen.vectors[2];
        let yaxis = m.eigen.vectors[1];
        let zaxis = xaxis
            .cross(yaxis)
            .normalize()
            .ok_or_else(|| FitError::degenerate("principal axes are not independent"))?;
        let frame = Frame {
            origin: m.centroid,
            xaxis,
            yaxis,
            zaxis,
        };
        let residual = weighted_sum(cloud, |p| zaxis.dot(p - frame.origin).powi(2));
        Ok(self.result(Primitive::Frame(frame), residual, &m, cloud, true))
    }

    pub fn fit_circle(&self, cloud: &PointCloud) -> Result<FitResult, FitError> {
        let m = self.moments(FitKind::Circle, cloud)?;
        if m.eigen.values[1] <= FLAT_REL * m.eigen.values[2] {
            return Err(FitError::degenerate("circle fit needs non-collinear points"));
        }
        let normal = m.eigen.vectors[0];
        let u_axis = m.eigen.vectors[2];
        let v_axis = m.eigen.vectors[1];

        // u² + v² = 2a·u + 2b·v + k  in the plane's (u, v) coordinates.
        let mut design = Design::new(3);
        let mut rhs = Vec::with_capacity(cloud.len());
        for (p, w) in cloud.iter() {
            let d = p - m.centroid;
            let (u, v) = (d.dot(u_axis), d.dot(v_axis));
            let sw = w.sqrt();
            design.push_row(&[2.0 * u * sw, 2.0 * v * sw, sw]);
            rhs.push((u * u + v * v) * sw);
        }
        let beta = self.backend.solve_least_squares(&design, &rhs)?;
        let (a, b, k) = (beta[0], beta[1], beta[2]);
        let radius = checked_radius(k + a * a + b * b)?;

        let circle = Circle {
            center: m.centroid + u_axis * a + v_axis * b,
            normal,
            radius,
        };
        let residual = weighted_sum(cloud, |p| circle_distance(&circle, p).powi(2));
        Ok(self.result(Primitive::Circle(circle), residual, &m, cloud, false))
    }

    pub fn fit_sphere(&self, cloud: &PointCloud) -> Result<FitResult, FitError> {
        let m = self.moments(FitKind::Sphere, cloud)?;
        if m.eigen.values[0] <= FLAT_REL * m.eigen.values[2] {
            return Err(FitError::degenerate("sphere fit needs non-coplanar points"));
        }

        // |d|² = 2 a·d + k  with d = p − c.
        let mut design = Design::new(4);
        let mut rhs = Vec::with_capacity(cloud.len());
        for (p, w) in cloud.iter() {
            let d = p - m.centroid;
            let sw = w.sqrt();
            design.push_row(&[2.0 * d.x * sw, 2.0 * d.y * sw, 2.0 * d.z * sw, sw]);
            rhs.push(d.norm_squared() * sw);
        }
        let beta = self.backend.solve_least_squares(&design, &rhs)?;
        let offset = Vector::new(beta[0], beta[1], beta[2]);
        let radius = checked_radius(beta[3] + offset.norm_squared())?;

        let sphere = Sphere {
            center: m.centroid + offset,
            radius,
        };
        let residual = weighted_sum(cloud, |p| sphere_distance(&sphere, p).powi(2));
        Ok(self.result(Primitive::Sphere(sphere), residual, &m, cloud, false))
    }

    fn moments(&self, kind: FitKind, cloud: &PointCloud) -> Result<Moments, FitError> {
        if let Some(i) = cloud.points().iter().position(|p| !p.is_finite()) {
            return Err(FitError::invalid(format!("point #{i} has a non-finite coordinate")));
        }

        let used = cloud.iter().filter(|(_, w)| *w > 0.0).count();
        if used < kind.min_points() {
            return Err(FitError::degenerate(format!(
                "{} fit needs at least {} points, got {used}",
                kind.display_name(),
                kind.min_points()
            )));
        }

        let total_weight = cloud.total_weight();
        let c = centroid(cloud).ok_or_else(|| FitError::degenerate("total weight is zero"))?;
        let s = scatter_matrix(cloud, c);

        let tol = total_weight * (SPREAD_EPS * magnitude(cloud)).powi(2);
        if !(trace(&s) > tol) {
            return Err(FitError::degenerate("all points coincide"));
        }

        let eigen = self.backend.symmetric_eigen(&s)?.canonical();
        tracing::debug!(
            kind = kind.display_name(),
            backend = self.backend.kind().name(),
            n = cloud.len(),
            eigenvalues = ?eigen.values,
            "scatter matrix decomposed"
        );

        Ok(Moments {
            centroid: c,
            eigen,
            total_weight,
        })
    }

    fn result(
        &self,
        primitive: Primitive,
        residual: f64,
        m: &Moments,
        cloud: &PointCloud,
        report_eigenvalues: bool,
    ) -> FitResult {
        FitResult {
            primitive,
            residual,
            rms: (residual / m.total_weight).sqrt(),
            n: cloud.len(),
            backend: self.backend.kind(),
            eigenvalues: report_eigenvalues.then_some(m.eigen.values),
        }
    }
}

fn weighted_sum(cloud: &PointCloud, f: impl Fn(Point) -> f64) -> f64 {
    cloud.iter().map(|(p, w)| w * f(p)).sum()
}

fn checked_radius(r2: f64) -> Result<f64, FitError> {
    if r2.is_finite() && r2 > 0.0 {
        Ok(r2.sqrt())
    } else {
        Err(FitError::degenerate("algebraic fit produced no real radius"))
    }
}

/// `BestFitSolver::new().fit_plane(cloud)`.
pub fn fit_plane(cloud: &PointCloud) -> Result<FitResult, FitError> {
    BestFitSolver::new().fit_plane(cloud)
}

/// `BestFitSolver::new().fit_line(cloud)`.
pub fn fit_line(cloud: &PointCloud) -> Result<FitResult, FitError> {
    BestFitSolver::new().fit_line(cloud)
}

pub fn fit_frame(cloud: &PointCloud) -> Result<FitResult, FitError> {
    BestFitSolver::new().fit_frame(cloud)
}

pub fn fit_circle(cloud: &PointCloud) -> Result<FitResult, FitError> {
    BestFitSolver::new().fit_circle(cloud)
}

pub fn fit_sphere(cloud: &PointCloud) -> Result<FitResult, FitError> {
    BestFitSolver::new().fit_sphere(cloud)
}
