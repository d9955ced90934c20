//! Best-fit orchestration.
//!
//! Responsibilities:
//!
//! - validate point clouds (counts, finiteness, spread)
//! - decompose the scatter matrix through the selected backend
//! - build primitives and their residuals
//! - fit several kinds at once (parallel)

pub mod solver;

pub use solver::*;
