//! The in-memory Universal Ink Model: input configuration, sensor data,
//! ink data (strokes and brushes), the semantic graph, trees, and the
//! `InkModel` root aggregate that ties them together under the
//! cross-cutting invariants of §3.7.
//!
//! Wire encoding lives in `uim-codec`; this crate only knows about the
//! decoded, in-memory shape.

mod error;
pub mod ink;
pub mod input;
mod model;
mod repo;
pub mod semantic;
pub mod sensor;
pub mod tree;

pub use error::ModelError;
pub use model::{InkModel, StrokeRepository, Version};
