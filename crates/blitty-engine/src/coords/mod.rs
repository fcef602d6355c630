//! Geometry types.
//!
//! Canonical CPU space:
//! - Pixels
//! - Origin top-left
//! - +X right, +Y down

mod rect;

pub use rect::{Rect, ViewRect};
