use super::backend::{SamplerFlags, TextureHandle};
use super::registry::ResourceKey;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// Sampler flags for a texture that either tiles or clamps, with the given filter.
pub fn sampler_flags(tiled: bool, filter: TextureFilter) -> SamplerFlags {
    let mut flags = SamplerFlags::empty();
    if !tiled {
        flags |= SamplerFlags::UV_CLAMP;
    }
    if filter == TextureFilter::Nearest {
        flags |= SamplerFlags::POINT;
    }
    flags
}

/// A registered RGBA8 2D texture.
///
/// Cheap to copy. Two textures are equal when they refer to the same GPU handle.
#[derive(Debug, Copy, Clone)]
pub struct Texture2D {
    pub(crate) key: ResourceKey,
    handle: TextureHandle,
    width: u32,
    height: u32,
    flags: SamplerFlags,
}

impl Texture2D {
    pub(crate) fn new(
        key: ResourceKey,
        handle: TextureHandle,
        width: u32,
        height: u32,
        flags: SamplerFlags,
    ) -> Self {
        Self { key, handle, width, height, flags }
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn sampler_flags(&self) -> SamplerFlags {
        self.flags
    }

    pub fn tiled(&self) -> bool {
        !self.flags.intersects(SamplerFlags::UV_CLAMP)
    }

    pub fn filter(&self) -> TextureFilter {
        if self.flags.intersects(SamplerFlags::POINT) {
            TextureFilter::Nearest
        } else {
            TextureFilter::Linear
        }
    }
}

impl PartialEq for Texture2D {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Texture2D {}
