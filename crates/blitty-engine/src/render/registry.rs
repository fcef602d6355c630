use slotmap::{SlotMap, new_key_type};

use super::backend::{
    DynamicIndexBufferHandle, DynamicVertexBufferHandle, GpuBackend, IndexBufferHandle,
    ProgramHandle, TextureHandle, UniformHandle, VertexBufferHandle,
};

new_key_type! {
    /// Generational key of a registered render resource.
    pub struct ResourceKey;
}

/// GPU objects a registry entry can own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    VertexBuffer(VertexBufferHandle),
    IndexBuffer(IndexBufferHandle),
    DynamicVertexBuffer(DynamicVertexBufferHandle),
    DynamicIndexBuffer(DynamicIndexBufferHandle),
    Texture(TextureHandle),
    /// A program together with the uniforms created for it.
    Shader {
        program: ProgramHandle,
        uniforms: Vec<UniformHandle>,
    },
}

impl ResourceKind {
    fn release(&self, backend: &mut dyn GpuBackend) {
        match self {
            ResourceKind::VertexBuffer(h) => backend.destroy_vertex_buffer(*h),
            ResourceKind::IndexBuffer(h) => backend.destroy_index_buffer(*h),
            ResourceKind::DynamicVertexBuffer(h) => backend.destroy_dynamic_vertex_buffer(*h),
            ResourceKind::DynamicIndexBuffer(h) => backend.destroy_dynamic_index_buffer(*h),
            ResourceKind::Texture(h) => backend.destroy_texture(*h),
            ResourceKind::Shader { program, uniforms } => {
                backend.destroy_program(*program);
                for u in uniforms {
                    backend.destroy_uniform(*u);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct RenderResource {
    pub id: String,
    pub kind: ResourceKind,
    freed: bool,
}

impl RenderResource {
    pub fn is_freed(&self) -> bool {
        self.freed
    }
}

/// Tracks every GPU resource created through the engine so they can be
/// released in bulk, in creation order, at shutdown.
///
/// A resource is released at most once.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: SlotMap<ResourceKey, RenderResource>,
    order: Vec<ResourceKey>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource. Ids are informational; duplicates are not checked.
    pub fn register(&mut self, id: impl Into<String>, kind: ResourceKind) -> ResourceKey {
        let id = id.into();
        log::trace!("registering render resource `{id}`");
        let key = self.entries.insert(RenderResource { id, kind, freed: false });
        self.order.push(key);
        key
    }

    pub fn get(&self, key: ResourceKey) -> Option<&RenderResource> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(*k))
            .map(|r| r.id.as_str())
    }

    /// Releases one resource and removes it from the registry.
    ///
    /// Returns `false` if the key is stale (already freed).
    pub fn free(&mut self, key: ResourceKey, backend: &mut dyn GpuBackend) -> bool {
        let Some(mut entry) = self.entries.remove(key) else {
            return false;
        };
        self.order.retain(|k| *k != key);
        if entry.freed {
            return false;
        }
        entry.kind.release(backend);
        entry.freed = true;
        log::debug!("freed render resource `{}`", entry.id);
        true
    }

    /// Releases every remaining resource in registration order and empties the
    /// registry. Returns how many were released.
    pub fn shutdown_all(&mut self, backend: &mut dyn GpuBackend) -> usize {
        let mut released = 0;
        for key in std::mem::take(&mut self.order) {
            let Some(entry) = self.entries.get_mut(key) else {
                continue;
            };
            if entry.freed {
                continue;
            }
            log::debug!("freeing render resource `{}`", entry.id);
            entry.kind.release(backend);
            entry.freed = true;
            released += 1;
        }
        self.entries.clear();
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, RecordingBackend};

    fn tex(n: u32) -> ResourceKind {
        ResourceKind::Texture(TextureHandle(n))
    }

    // ── free ──────────────────────────────────────────────────────────────

    #[test]
    fn free_releases_once() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut reg = ResourceRegistry::new();
        let a = reg.register("a", tex(1));

        assert!(reg.free(a, &mut backend));
        assert!(!reg.free(a, &mut backend));
        assert_eq!(log.destroys(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn shutdown_skips_individually_freed() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut reg = ResourceRegistry::new();
        let a = reg.register("a", tex(1));
        reg.register("b", tex(2));
        reg.register("c", tex(3));

        reg.free(a, &mut backend);
        assert_eq!(reg.shutdown_all(&mut backend), 2);
        assert_eq!(log.destroys(), 3);
        assert_eq!(reg.shutdown_all(&mut backend), 0);
        assert_eq!(log.destroys(), 3);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn shutdown_runs_in_registration_order() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut reg = ResourceRegistry::new();
        reg.register("t3", tex(3));
        reg.register("t1", tex(1));
        reg.register("t2", tex(2));
        assert_eq!(reg.ids().collect::<Vec<_>>(), ["t3", "t1", "t2"]);

        reg.shutdown_all(&mut backend);
        assert_eq!(
            log.calls(),
            vec![
                Call::DestroyTexture(TextureHandle(3)),
                Call::DestroyTexture(TextureHandle(1)),
                Call::DestroyTexture(TextureHandle(2)),
            ]
        );
    }

    #[test]
    fn shader_releases_program_and_uniforms() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut reg = ResourceRegistry::new();
        let key = reg.register(
            "shader",
            ResourceKind::Shader {
                program: ProgramHandle(7),
                uniforms: vec![UniformHandle(8), UniformHandle(9)],
            },
        );
        assert!(reg.contains(key));
        reg.free(key, &mut backend);
        assert_eq!(
            log.calls(),
            vec![
                Call::DestroyProgram(ProgramHandle(7)),
                Call::DestroyUniform(UniformHandle(8)),
                Call::DestroyUniform(UniformHandle(9)),
            ]
        );
        assert!(!reg.contains(key));
    }
}
