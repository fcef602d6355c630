//! Render submission model.
//!
//! Resources created through [`Graphics`] are tracked by a [`ResourceRegistry`]
//! and released in creation order at shutdown. Draws are recorded against a
//! [`RenderView`] with a [`RenderState`] and a [`Shader`], then executed by the
//! [`GpuBackend`] at frame end.
//!
//! Convention:
//! - 2D geometry is in backbuffer pixels (top-left origin, +Y down).
//! - The default view projects that space with an off-center orthographic matrix.

pub mod backend;
mod buffers;
mod canvas;
mod error;
mod graphics;
mod mesh;
mod quad;
mod registry;
mod shader;
pub mod state;
mod texture;
mod vertex;
mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::GpuBackend;
pub use buffers::{DynamicIndexBuffer, DynamicVertexBuffer, IndexBuffer, VertexBuffer};
pub use canvas::{Canvas2D, CanvasError};
pub use error::GraphicsError;
pub use graphics::{BASE_SHADER_WGSL, Graphics, GraphicsSettings, MsaaLevel};
pub use mesh::{DynamicMesh, MAX_QUADS_U16, Mesh, StaticMesh, quad_indices};
pub use quad::Quad;
pub use registry::{RenderResource, ResourceKey, ResourceKind, ResourceRegistry};
pub use shader::{Shader, ShaderParameter, ShaderSampler};
pub use state::{BlendMode, PrimitiveType, RenderState, StateFlags};
pub use texture::{Texture2D, TextureFilter, sampler_flags};
pub use vertex::VertexPCT;
pub use view::{RenderView, ViewId, ortho_off_center};
