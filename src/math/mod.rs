//! Numerical building blocks: moments, eigen decomposition, least squares,
//! and the backend interface tying them together.

pub mod backend;
pub mod eigen;
pub mod jacobi;
#[cfg(feature = "native")]
pub mod native;
pub mod ols;
pub mod stats;

pub use backend::*;
pub use eigen::*;
pub use jacobi::*;
#[cfg(feature = "native")]
pub use native::*;
pub use ols::*;
pub use stats::*;
