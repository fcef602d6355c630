use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::paint::Color;

/// Position/color/texcoord vertex used by every built-in mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPCT {
    pub position: [f32; 3],
    pub color: Color,
    pub uv: [f32; 2],
}

impl VertexPCT {
    pub const STRIDE: u32 = std::mem::size_of::<VertexPCT>() as u32;

    pub fn new(position: Vec3, color: Color, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color,
            uv: uv.to_array(),
        }
    }

    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    pub fn set_xy(&mut self, p: Vec2) {
        self.position[0] = p.x;
        self.position[1] = p.y;
    }

    /// wgpu vertex layout: `@location(0) position`, `@location(1) color`, `@location(2) uv`.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Unorm8x4,
            2 => Float32x2,
        ];

        wgpu::VertexBufferLayout {
            array_stride: VertexPCT::STRIDE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}
