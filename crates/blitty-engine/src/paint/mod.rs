//! Color representation shared by vertices, clear colors and shader tints.

mod color;

pub use color::Color;
