//! CPU-side content.

mod pixmap;

pub use pixmap::{Pixmap, PixmapError};
