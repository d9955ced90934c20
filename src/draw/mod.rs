//! Drawing: artists that turn points and fitted primitives into calls on a
//! `Canvas`, plus `SceneCanvas`, a canvas that records a JSON scene.

pub mod artist;
pub mod canvas;

pub use artist::*;
pub use canvas::*;
