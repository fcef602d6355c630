use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::texture::Texture2D;
use super::vertex::VertexPCT;
use crate::coords::Rect;
use crate::paint::Color;

/// Four vertices in TopLeft, TopRight, BottomRight, BottomLeft order.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Quad {
    pub top_left: VertexPCT,
    pub top_right: VertexPCT,
    pub bottom_right: VertexPCT,
    pub bottom_left: VertexPCT,
}

impl Quad {
    /// White quad covering `rect`, with the full [0, 1] texture region.
    pub fn from_rect(rect: Rect) -> Self {
        let mut q = Quad::default();
        q.set_corners(rect.min(), rect.max());
        q.set_color(Color::WHITE);
        q.set_uv(Vec2::ZERO, Vec2::ONE);
        q
    }

    /// Quad sized to `region` of `texture` (or the whole texture when `region` is
    /// `None` or empty), positioned at the origin.
    pub fn from_texture(texture: &Texture2D, region: Option<Rect>) -> Self {
        let region = region.filter(|r| !r.is_empty());
        let size = region.map_or(texture.size(), |r| r.size);

        let mut q = Quad::default();
        q.set_region(texture, region);
        q.set_corners(Vec2::ZERO, size);
        q.set_color(Color::WHITE);
        q
    }

    pub fn vertices(&self) -> [VertexPCT; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    pub fn width(&self) -> f32 {
        (self.top_right.position[0] - self.top_left.position[0]).abs()
    }

    pub fn height(&self) -> f32 {
        (self.bottom_right.position[1] - self.top_right.position[1]).abs()
    }

    pub fn set_color(&mut self, color: Color) {
        self.set_colors(color, color, color, color);
    }

    pub fn set_colors(&mut self, top_left: Color, top_right: Color, bottom_left: Color, bottom_right: Color) {
        self.top_left.color = top_left;
        self.top_right.color = top_right;
        self.bottom_right.color = bottom_right;
        self.bottom_left.color = bottom_left;
    }

    pub fn set_z(&mut self, depth: f32) {
        for v in self.corners_mut() {
            v.position[2] = depth;
        }
    }

    /// Places the quad (keeping its size) so that `origin` (normalized, 0..1 on
    /// each axis) lands on `position`.
    pub fn set_position(&mut self, position: Vec2, origin: Vec2) {
        let size = Vec2::new(self.width(), self.height());
        self.set_position_size(position, size, origin);
    }

    pub fn set_position_size(&mut self, position: Vec2, size: Vec2, origin: Vec2) {
        let min = position - size * origin;
        self.set_corners(min, min + size);
    }

    /// Like [`set_position_size`](Self::set_position_size), rotated by `angle`
    /// radians around `position`.
    pub fn set_position_size_rotated(&mut self, position: Vec2, size: Vec2, origin: Vec2, angle: f32) {
        let rot = Vec2::from_angle(angle);
        let min = -size * origin;
        let place = |local: Vec2| position + rot.rotate(local);

        self.top_left.set_xy(place(min));
        self.top_right.set_xy(place(Vec2::new(min.x + size.x, min.y)));
        self.bottom_right.set_xy(place(min + size));
        self.bottom_left.set_xy(place(Vec2::new(min.x, min.y + size.y)));
    }

    /// Sets texture coordinates from a pixel `region` of `texture`; `None` or an
    /// empty region selects the whole texture.
    pub fn set_region(&mut self, texture: &Texture2D, region: Option<Rect>) {
        match region.filter(|r| !r.is_empty()) {
            Some(r) => {
                let inv = Vec2::ONE / texture.size();
                self.set_uv(r.min() * inv, r.max() * inv);
            }
            None => self.set_uv(Vec2::ZERO, Vec2::ONE),
        }
    }

    /// Pixel region of `texture` currently mapped by the quad.
    pub fn region(&self, texture: &Texture2D) -> Rect {
        let a = Vec2::from(self.top_left.uv) * texture.size();
        let b = Vec2::from(self.bottom_right.uv) * texture.size();
        Rect::from_corners(a, b)
    }

    fn set_corners(&mut self, min: Vec2, max: Vec2) {
        self.top_left.set_xy(min);
        self.top_right.set_xy(Vec2::new(max.x, min.y));
        self.bottom_right.set_xy(max);
        self.bottom_left.set_xy(Vec2::new(min.x, max.y));
    }

    fn set_uv(&mut self, a: Vec2, b: Vec2) {
        self.top_left.uv = [a.x, a.y];
        self.top_right.uv = [b.x, a.y];
        self.bottom_right.uv = [b.x, b.y];
        self.bottom_left.uv = [a.x, b.y];
    }

    fn corners_mut(&mut self) -> [&mut VertexPCT; 4] {
        [
            &mut self.top_left,
            &mut self.top_right,
            &mut self.bottom_right,
            &mut self.bottom_left,
        ]
    }
}
