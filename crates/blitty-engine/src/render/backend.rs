//! Submission-level GPU interface.
//!
//! The engine core only talks to the GPU through [`GpuBackend`]. State set between
//! two `submit` calls is accumulated and consumed by the next `submit`.

use bitflags::bitflags;
use glam::{Mat4, Vec4};

use super::error::GraphicsError;
use super::state::StateFlags;
use super::view::ViewId;
use crate::coords::ViewRect;
use crate::paint::Color;

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub u32);
        )*
    };
}

handle!(
    VertexBufferHandle,
    IndexBufferHandle,
    DynamicVertexBufferHandle,
    DynamicIndexBufferHandle,
    /// Texture handle; equality of two textures is equality of handles.
    TextureHandle,
    UniformHandle,
    ProgramHandle,
);

/// Shape of a declared shader uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Sampler,
    Vec4,
}

/// Declared sampler of a program, in binding slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerDecl {
    pub name: String,
    pub handle: UniformHandle,
}

/// Declared vec4 parameter of a program, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub handle: UniformHandle,
}

bitflags! {
    /// Texture sampling flags (bgfx `BGFX_SAMPLER_*` values). Empty means
    /// repeat addressing with linear filtering.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct SamplerFlags: u32 {
        const U_CLAMP = 0x0000_0002;
        const V_CLAMP = 0x0000_0008;
        const MIN_POINT = 0x0000_0040;
        const MAG_POINT = 0x0000_0100;
        const MIP_POINT = 0x0000_0400;

        const UV_CLAMP = Self::U_CLAMP.bits() | Self::V_CLAMP.bits();
        const POINT = Self::MIN_POINT.bits() | Self::MAG_POINT.bits() | Self::MIP_POINT.bits();
    }
}

bitflags! {
    /// Backbuffer reset flags (bgfx `BGFX_RESET_*` values).
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ResetFlags: u32 {
        const MSAA_X2 = 0x0000_0010;
        const MSAA_X4 = 0x0000_0020;
        const MSAA_X8 = 0x0000_0030;
        const MSAA_X16 = 0x0000_0040;
        const VSYNC = 0x0000_0080;
    }
}

impl ResetFlags {
    pub const MSAA_MASK: u32 = 0x0000_0070;

    /// Sample count encoded in the MSAA field.
    pub fn msaa_samples(self) -> u32 {
        match self.bits() & Self::MSAA_MASK {
            0x10 => 2,
            0x20 => 4,
            0x30 => 8,
            0x40 => 16,
            _ => 1,
        }
    }
}

bitflags! {
    /// Which pieces of accumulated submission state a `submit` releases.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct DiscardFlags: u8 {
        const BINDINGS = 0x01;
        const INDEX_BUFFER = 0x02;
        const INSTANCE_DATA = 0x04;
        const STATE = 0x08;
        const TRANSFORM = 0x10;
        const VERTEX_STREAMS = 0x20;
        const ALL = 0xff;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
        const STENCIL = 0x4;
    }
}

/// View clear parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewClear {
    pub flags: ClearFlags,
    pub color: Color,
    pub depth: f32,
    pub stencil: u8,
}

/// Element range of a buffer to bind (vertices or indices).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferRange {
    pub start: u32,
    pub count: u32,
}

impl BufferRange {
    pub const fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }
}

/// Low-level GPU interface.
///
/// Implemented by the wgpu backend and by recording doubles in tests.
pub trait GpuBackend {
    // ── resources ─────────────────────────────────────────────────────────

    fn create_vertex_buffer(&mut self, label: &str, data: &[u8], stride: u32) -> VertexBufferHandle;
    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle);

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> IndexBufferHandle;
    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle);

    /// Dynamic vertex buffer holding up to `vertex_count` vertices of `stride` bytes.
    fn create_dynamic_vertex_buffer(
        &mut self,
        label: &str,
        vertex_count: u32,
        stride: u32,
    ) -> DynamicVertexBufferHandle;
    /// Overwrites vertices starting at `start_vertex`.
    fn update_dynamic_vertex_buffer(
        &mut self,
        handle: DynamicVertexBufferHandle,
        start_vertex: u32,
        data: &[u8],
    );
    fn destroy_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle);

    fn create_dynamic_index_buffer(&mut self, label: &str, index_count: u32)
    -> DynamicIndexBufferHandle;
    fn update_dynamic_index_buffer(
        &mut self,
        handle: DynamicIndexBufferHandle,
        start_index: u32,
        indices: &[u16],
    );
    fn destroy_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle);

    /// Creates an RGBA8 2D texture.
    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        flags: SamplerFlags,
        rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError>;
    fn destroy_texture(&mut self, handle: TextureHandle);

    fn create_uniform(&mut self, name: &str, kind: UniformKind) -> UniformHandle;
    fn destroy_uniform(&mut self, handle: UniformHandle);

    /// Compiles a program from WGSL source. `samplers` bind in slot order and
    /// `params` in index order.
    fn create_program(
        &mut self,
        label: &str,
        wgsl: &str,
        samplers: &[SamplerDecl],
        params: &[ParamDecl],
    ) -> Result<ProgramHandle, GraphicsError>;
    fn destroy_program(&mut self, handle: ProgramHandle);

    // ── views ─────────────────────────────────────────────────────────────

    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear);
    fn set_view_rect(&mut self, view: ViewId, rect: ViewRect);
    fn set_view_scissor(&mut self, view: ViewId, rect: ViewRect);
    fn set_view_transform(&mut self, view: ViewId, view_matrix: Mat4, projection: Mat4);
    /// Marks the view as used this frame so it clears even without draws.
    fn touch(&mut self, view: ViewId);

    // ── submission state ──────────────────────────────────────────────────

    fn set_state(&mut self, state: StateFlags);
    fn set_texture(&mut self, slot: u8, sampler: UniformHandle, texture: TextureHandle);
    fn set_uniform(&mut self, uniform: UniformHandle, value: Vec4);
    fn set_vertex_buffer(&mut self, stream: u8, handle: VertexBufferHandle, range: BufferRange);
    fn set_dynamic_vertex_buffer(&mut self, stream: u8, handle: DynamicVertexBufferHandle, range: BufferRange);
    fn set_index_buffer(&mut self, handle: IndexBufferHandle, range: BufferRange);
    fn set_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, range: BufferRange);

    /// Records a draw of the accumulated state into `view`.
    fn submit(&mut self, view: ViewId, program: ProgramHandle, depth: u32, discard: DiscardFlags);

    // ── frame ─────────────────────────────────────────────────────────────

    /// Executes all recorded views and presents.
    fn frame(&mut self) -> Result<(), GraphicsError>;
    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags);
    fn shutdown(&mut self);
}
