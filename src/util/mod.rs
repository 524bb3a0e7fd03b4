//! Utility types shared across the crate.
//!
//! - [`ArrayKind`] - Element kinds of attribute arrays
//! - [`BBox3d`] - Bounding boxes (glam based)
//! - [`Error`] / [`Result`] - Error handling

mod error;
mod kind;
mod math;

pub use error::*;
pub use kind::*;
pub use math::*;
