use super::backend::{BufferRange, GpuBackend};
use super::buffers::{DynamicVertexBuffer, IndexBuffer, VertexBuffer};
use super::quad::Quad;
use super::vertex::VertexPCT;

/// Largest quad count addressable with 16-bit indices.
pub const MAX_QUADS_U16: u32 = (u16::MAX as u32 + 1) / 4;

/// Index list for `max_quads` quads: `0,1,2, 0,2,3` per quad, offset by `4 * quad`.
///
/// `max_quads` is clamped to what 16-bit indices can address.
pub fn quad_indices(max_quads: u32) -> Vec<u16> {
    let quads = max_quads.min(MAX_QUADS_U16);
    let mut out = Vec::with_capacity(quads as usize * 6);
    for q in 0..quads {
        let b = (q * 4) as u16;
        out.extend_from_slice(&[b, b + 1, b + 2, b, b + 2, b + 3]);
    }
    out
}

/// Geometry that can bind itself for the next submit.
pub trait Mesh {
    fn vertex_count(&self) -> u32;

    /// Uploads pending data and binds vertex/index streams.
    fn submit(&self, backend: &mut dyn GpuBackend);
}

/// Mesh over immutable buffers.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    vertices: VertexBuffer,
    indices: Option<IndexBuffer>,
}

impl StaticMesh {
    pub fn new(vertices: VertexBuffer, indices: Option<IndexBuffer>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.indices.as_ref()
    }
}

impl Mesh for StaticMesh {
    fn vertex_count(&self) -> u32 {
        self.vertices.vertex_count
    }

    fn submit(&self, backend: &mut dyn GpuBackend) {
        backend.set_vertex_buffer(0, self.vertices.handle, BufferRange::new(0, self.vertices.vertex_count));
        if let Some(ib) = &self.indices {
            backend.set_index_buffer(ib.handle, BufferRange::new(0, ib.index_count));
        }
    }
}

/// CPU-filled mesh over a dynamic vertex buffer.
///
/// Vertices are staged on the CPU and uploaded on submit. When built for quads,
/// a precomputed quad index buffer is bound with `6 * quads` indices.
#[derive(Debug, Clone)]
pub struct DynamicMesh {
    vertices: DynamicVertexBuffer,
    quad_indices: Option<IndexBuffer>,
    staging: Vec<VertexPCT>,
}

impl DynamicMesh {
    pub(crate) fn new(vertices: DynamicVertexBuffer, quad_indices: Option<IndexBuffer>) -> Self {
        Self {
            staging: Vec::with_capacity(vertices.capacity as usize),
            vertices,
            quad_indices,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.vertices.capacity
    }

    pub fn vertex_buffer(&self) -> &DynamicVertexBuffer {
        &self.vertices
    }

    pub fn quad_index_buffer(&self) -> Option<&IndexBuffer> {
        self.quad_indices.as_ref()
    }

    pub fn len(&self) -> u32 {
        self.staging.len() as u32
    }

    /// Vertices staged since the last reset.
    pub fn vertices(&self) -> &[VertexPCT] {
        &self.staging
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Remaining room in vertices.
    pub fn remaining(&self) -> u32 {
        self.capacity() - self.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() < 4
    }

    /// Appends a quad. Returns `false` (and appends nothing) when full.
    pub fn push_quad(&mut self, quad: &Quad) -> bool {
        self.push_vertices(&quad.vertices())
    }

    /// Appends raw vertices. Returns `false` (and appends nothing) when they do not fit.
    pub fn push_vertices(&mut self, vertices: &[VertexPCT]) -> bool {
        if vertices.len() as u32 > self.remaining() {
            return false;
        }
        self.staging.extend_from_slice(vertices);
        true
    }

    /// Rewinds the fill cursor.
    pub fn reset(&mut self) {
        self.staging.clear();
    }
}

impl Mesh for DynamicMesh {
    fn vertex_count(&self) -> u32 {
        self.len()
    }

    fn submit(&self, backend: &mut dyn GpuBackend) {
        let count = self.len();
        backend.update_dynamic_vertex_buffer(self.vertices.handle, 0, bytemuck::cast_slice(&self.staging));
        backend.set_dynamic_vertex_buffer(0, self.vertices.handle, BufferRange::new(0, count));
        if let Some(ib) = &self.quad_indices {
            let indices = (count / 4 * 6).min(ib.index_count);
            backend.set_index_buffer(ib.handle, BufferRange::new(0, indices));
        }
    }
}
