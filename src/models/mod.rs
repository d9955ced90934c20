//! Fitted-primitive evaluation (distances, view frames).

pub mod distance;

pub use distance::*;
