use std::path::Path;

use thiserror::Error;

use crate::paint::Color;

#[derive(Debug, Error)]
pub enum PixmapError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("pixel data is {actual} bytes, expected {expected} for {width}x{height} RGBA8")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// CPU-side RGBA8 image, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut p = Self::new(width, height);
        p.fill(color);
        p
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixmapError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(PixmapError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Decodes a PNG (any color type) into RGBA8.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, PixmapError> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self { width, height, data: img.into_raw() })
    }

    pub fn load_png(path: impl AsRef<Path>) -> Result<Self, PixmapError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self { width, height, data: img.into_raw() })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), PixmapError> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn fill(&mut self, color: Color) {
        let px = bytemuck::bytes_of(&color);
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(px);
        }
    }

    /// Writes one pixel; out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(bytemuck::bytes_of(&color));
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.offset(x, y).map(|i| {
            Color::rgba(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
        })
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.stride() + x as usize * 4)
    }
}
