use super::backend::{
    DynamicIndexBufferHandle, DynamicVertexBufferHandle, IndexBufferHandle, VertexBufferHandle,
};
use super::registry::ResourceKey;

/// Immutable vertex buffer registered with the graphics context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexBuffer {
    pub(crate) key: ResourceKey,
    pub(crate) handle: VertexBufferHandle,
    pub(crate) vertex_count: u32,
}

impl VertexBuffer {
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn handle(&self) -> VertexBufferHandle {
        self.handle
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Immutable 16-bit index buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexBuffer {
    pub(crate) key: ResourceKey,
    pub(crate) handle: IndexBufferHandle,
    pub(crate) index_count: u32,
}

impl IndexBuffer {
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn handle(&self) -> IndexBufferHandle {
        self.handle
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Vertex buffer whose contents can be rewritten every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DynamicVertexBuffer {
    pub(crate) key: ResourceKey,
    pub(crate) handle: DynamicVertexBufferHandle,
    pub(crate) capacity: u32,
}

impl DynamicVertexBuffer {
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn handle(&self) -> DynamicVertexBufferHandle {
        self.handle
    }

    /// Capacity in vertices.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DynamicIndexBuffer {
    pub(crate) key: ResourceKey,
    pub(crate) handle: DynamicIndexBufferHandle,
    pub(crate) capacity: u32,
}

impl DynamicIndexBuffer {
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn handle(&self) -> DynamicIndexBufferHandle {
        self.handle
    }

    /// Capacity in indices.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
