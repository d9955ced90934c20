//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for reporting or drawing

use std::ops::{Add, Mul, Neg, Sub};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::BackendKind;

/// A point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Position vector of this point relative to the world origin.
    pub fn coords(self) -> Vector {
        Vector::new(self.x, self.y, self.z)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).norm()
    }
}

/// A free vector in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub const fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub const fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector) -> Vector {
        Vector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn norm(self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalize(self) -> Option<Vector> {
        let n = self.norm();
        if n.is_finite() && n > f64::MIN_POSITIVE {
            Some(self * (1.0 / n))
        } else {
            None
        }
    }

    /// Flip the vector so its largest-magnitude component is positive.
    ///
    /// Components within `1e-12` of the largest magnitude count as tied; the
    /// first of them decides the sign.
    pub fn canonical_sign(self) -> Vector {
        let c = self.to_array();
        let max = c.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let lead = c
            .iter()
            .copied()
            .find(|v| v.abs() >= max - 1e-12)
            .unwrap_or(0.0);
        if lead < 0.0 { -self } else { self }
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: Vector) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

/// An ordered set of points with optional per-point weights.
///
/// Weights default to `1.0`. A weighted cloud must carry one finite,
/// non-negative weight per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point>,
    weights: Option<Vec<f64>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            weights: None,
        }
    }

    pub fn with_weights(points: Vec<Point>, weights: Vec<f64>) -> Result<Self, FitError> {
        if weights.len() != points.len() {
            return Err(FitError::invalid(format!(
                "{} weights supplied for {} points",
                weights.len(),
                points.len()
            )));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(FitError::invalid(format!(
                "weight #{i} must be finite and non-negative (got {})",
                weights[i]
            )));
        }
        Ok(Self {
            points,
            weights: Some(weights),
        })
    }

    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        Self::new(coords.iter().copied().map(Point::from_array).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    pub fn total_weight(&self) -> f64 {
        match &self.weights {
            Some(w) => w.iter().sum(),
            None => self.points.len() as f64,
        }
    }

    /// Iterate `(point, weight)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, self.weight(i)))
    }
}

/// Which primitive to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitKind {
    Plane,
    Line,
    Frame,
    Circle,
    Sphere,
}

impl FitKind {
    pub const ALL: [FitKind; 5] = [
        FitKind::Plane,
        FitKind::Line,
        FitKind::Frame,
        FitKind::Circle,
        FitKind::Sphere,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Plane => "plane",
            FitKind::Line => "line",
            FitKind::Frame => "frame",
            FitKind::Circle => "circle",
            FitKind::Sphere => "sphere",
        }
    }

    /// Minimum number of points the fit accepts.
    pub fn min_points(self) -> usize {
        match self {
            FitKind::Line => 2,
            FitKind::Plane | FitKind::Frame | FitKind::Circle => 3,
            FitKind::Sphere => 4,
        }
    }
}

/// `--kind` on the command line: one primitive, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KindSpec {
    Plane,
    Line,
    Frame,
    Circle,
    Sphere,
    All,
}

impl KindSpec {
    pub fn kinds(self) -> Vec<FitKind> {
        match self {
            KindSpec::Plane => vec![FitKind::Plane],
            KindSpec::Line => vec![FitKind::Line],
            KindSpec::Frame => vec![FitKind::Frame],
            KindSpec::Circle => vec![FitKind::Circle],
            KindSpec::Sphere => vec![FitKind::Sphere],
            KindSpec::All => FitKind::ALL.to_vec(),
        }
    }
}

/// How observations are weighted in the fit objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// Use the CSV `weight` column when present, otherwise uniform.
    Auto,
    /// Uniform weights.
    Uniform,
    /// Require and use the CSV `weight` column.
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point,
    pub normal: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub origin: Point,
    pub direction: Vector,
}

/// Orthonormal right-handed frame: `zaxis = xaxis × yaxis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point,
    pub xaxis: Vector,
    pub yaxis: Vector,
    pub zaxis: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub normal: Vector,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point,
    pub radius: f64,
}

/// A fitted geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    Plane(Plane),
    Line(Line),
    Frame(Frame),
    Circle(Circle),
    Sphere(Sphere),
}

impl Primitive {
    pub fn kind(&self) -> FitKind {
        match self {
            Primitive::Plane(_) => FitKind::Plane,
            Primitive::Line(_) => FitKind::Line,
            Primitive::Frame(_) => FitKind::Frame,
            Primitive::Circle(_) => FitKind::Circle,
            Primitive::Sphere(_) => FitKind::Sphere,
        }
    }
}

/// Output of a single fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub primitive: Primitive,
    /// Weighted sum of squared orthogonal distances.
    pub residual: f64,
    /// `sqrt(residual / total_weight)`.
    pub rms: f64,
    pub n: usize,
    pub backend: BackendKind,
    /// Scatter-matrix eigenvalues, ascending (absent for algebraic fits that
    /// do not decompose the scatter matrix directly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eigenvalues: Option<[f64; 3]>,
}

impl FitResult {
    pub fn kind(&self) -> FitKind {
        self.primitive.kind()
    }

    pub fn plane(&self) -> Option<&Plane> {
        match &self.primitive {
            Primitive::Plane(p) => Some(p),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<&Line> {
        match &self.primitive {
            Primitive::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        match &self.primitive {
            Primitive::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn circle(&self) -> Option<&Circle> {
        match &self.primitive {
            Primitive::Circle(c) => Some(c),
            _ => None,
        }
    }

    pub fn sphere(&self) -> Option<&Sphere> {
        match &self.primitive {
            Primitive::Sphere(s) => Some(s),
            _ => None,
        }
    }
}

/// A point read from input, with its identifier for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub id: String,
    pub point: Point,
    pub weight: Option<f64>,
}

/// A per-point distance to the fitted primitive (used for ranking and exports).
#[derive(Debug, Clone, PartialEq)]
pub struct PointResidual {
    pub index: usize,
    pub sample: SamplePoint,
    /// Signed where the primitive has an inside/outside or above/below
    /// (plane, frame, circle, sphere); non-negative for lines.
    pub distance: f64,
}

/// Summary stats about the points actually used for fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub total_weight: f64,
    pub min: Point,
    pub max: Point,
}

/// A saved fit: the portable representation written by `fit --export-fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    /// Input CSV the fit was computed from.
    pub source: String,
    pub backend: BackendKind,
    pub stats: DatasetStats,
    pub result: FitResult,
}

/// Which backend the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Native when compiled in, otherwise the portable Jacobi backend.
    Auto,
    Native,
    Jacobi,
}

impl BackendChoice {
    /// Parse an environment value such as `BESTFIT_BACKEND=jacobi`.
    ///
    /// Unknown or empty values yield `None` so the caller can fall back.
    pub fn from_env_value(value: Option<&str>) -> Option<Self> {
        let value = value?.trim();
        if value.is_empty() {
            return None;
        }
        <BackendChoice as ValueEnum>::from_str(value, true).ok()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub kinds: Vec<FitKind>,
    pub backend: BackendChoice,
    pub weight_mode: WeightMode,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_residuals: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}
