//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - geometry values (`Point`, `Vector`, `PointCloud`, `RigidTransform`)
//! - fit outputs (`FitResult`, `Primitive`, and the primitive structs)
//! - input configuration enums (`FitKind`, `KindSpec`, `WeightMode`, `BackendChoice`)

pub mod transform;
pub mod types;

pub use transform::*;
pub use types::*;
