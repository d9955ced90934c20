//! Linear-algebra backend selection.
//!
//! The solver talks to a single `LinalgBackend` interface. Two implementations
//! exist:
//!
//! - `native`: nalgebra's symmetric eigen solver and SVD (default cargo feature)
//! - `jacobi`: portable cyclic Jacobi rotations + normal equations, no
//!   numerical library needed
//!
//! `detect()` picks by availability; callers never need to know which one ran
//! except through `FitResult::backend`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::BackendChoice;
use crate::error::FitError;
use crate::math::{Design, Eigen3, JacobiBackend, Sym3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    Jacobi,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::Jacobi => "jacobi",
        }
    }
}

pub trait LinalgBackend: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Eigen pairs of a symmetric matrix, in backend order.
    fn symmetric_eigen(&self, m: &Sym3) -> Result<Eigen3, FitError>;

    /// Minimise `‖X β − y‖²`. Fails with `DegenerateInput` on a rank-deficient `X`.
    fn solve_least_squares(&self, design: &Design, rhs: &[f64]) -> Result<Vec<f64>, FitError>;
}

pub fn is_available(kind: BackendKind) -> bool {
    match kind {
        BackendKind::Native => cfg!(feature = "native"),
        BackendKind::Jacobi => true,
    }
}

/// Preferred backend for this build.
pub fn detect() -> BackendKind {
    if is_available(BackendKind::Native) {
        BackendKind::Native
    } else {
        BackendKind::Jacobi
    }
}

/// The backend `detect()` names, constructed.
pub fn default_backend() -> Box<dyn LinalgBackend> {
    #[cfg(feature = "native")]
    {
        Box::new(crate::math::NativeBackend)
    }
    #[cfg(not(feature = "native"))]
    {
        Box::new(JacobiBackend::default())
    }
}

pub fn create_backend(kind: BackendKind) -> Result<Box<dyn LinalgBackend>, FitError> {
    match kind {
        BackendKind::Jacobi => Ok(Box::new(JacobiBackend::default())),
        #[cfg(feature = "native")]
        BackendKind::Native => Ok(Box::new(crate::math::NativeBackend)),
        #[cfg(not(feature = "native"))]
        BackendKind::Native => Err(FitError::BackendUnavailable {
            backend: BackendKind::Native.name(),
        }),
    }
}

pub fn resolve_backend(choice: BackendChoice) -> Result<Box<dyn LinalgBackend>, FitError> {
    let kind = match choice {
        BackendChoice::Auto => detect(),
        BackendChoice::Native => BackendKind::Native,
        BackendChoice::Jacobi => BackendKind::Jacobi,
    };
    tracing::debug!(backend = kind.name(), ?choice, "resolved linear algebra backend");
    create_backend(kind)
}
