use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// Straight-alpha RGBA8 color, laid out the way vertex streams expect it.
///
/// Memory order is `r, g, b, a`, so a `Color` inside a vertex maps directly to a
/// `Unorm8x4` attribute.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CORNFLOWER: Color = Color::rgb(100, 149, 237);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Builds a color from `[0, 1]` float components; out-of-range input is clamped.
    #[inline]
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        #[inline]
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self::rgba(q(r), q(g), q(b), q(a))
    }

    /// Packs as `0xRRGGBBAA`, the layout clear colors use.
    #[inline]
    pub const fn to_rgba_u32(self) -> u32 {
        (self.r as u32) << 24 | (self.g as u32) << 16 | (self.b as u32) << 8 | self.a as u32
    }

    #[inline]
    pub const fn from_rgba_u32(v: u32) -> Self {
        Self::rgba((v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// Returns the same color with a new alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        self.to_vec4().to_array()
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Self {
        c.to_vec4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_rrggbbaa() {
        assert_eq!(Color::rgba(0x11, 0x22, 0x33, 0x44).to_rgba_u32(), 0x11223344);
        assert_eq!(Color::BLACK.to_rgba_u32(), 0x000000ff);
        assert_eq!(Color::from_rgba_u32(0xff00ff80), Color::rgba(255, 0, 255, 128));
    }

    #[test]
    fn memory_order_is_rgba() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(bytemuck::bytes_of(&c), &[1, 2, 3, 4]);
    }

    #[test]
    fn from_f32_clamps() {
        assert_eq!(Color::from_f32(2.0, -1.0, 0.5, 1.0), Color::rgba(255, 0, 128, 255));
    }

    #[test]
    fn to_vec4_normalizes() {
        let v = Color::WHITE.with_alpha(0).to_vec4();
        assert_eq!(v, Vec4::new(1.0, 1.0, 1.0, 0.0));
    }
}
