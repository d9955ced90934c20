//! `bestfit` library crate.
//!
//! Least-squares best-fit primitives (plane, line, frame, circle, sphere) for
//! 3D point clouds, with interchangeable linear algebra backends.
//!
//! The binary (`bestfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the solver is reusable on its own (`fit::BestFitSolver`)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod draw;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

pub use domain::{FitKind, FitResult, Point, PointCloud, Primitive, Vector};
pub use error::FitError;
pub use fit::{BestFitSolver, fit_line, fit_plane};
pub use math::{BackendKind, LinalgBackend, detect};
