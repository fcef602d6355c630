use std::sync::atomic::{AtomicU16, Ordering};

use glam::Mat4;

use crate::coords::ViewRect;
use crate::paint::Color;

static NEXT_VIEW_ID: AtomicU16 = AtomicU16::new(0);

/// Identifier of a render view. Draws submitted to a view are replayed in
/// ascending id order at frame end.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub u16);

impl ViewId {
    /// Allocates the next process-wide view id.
    pub fn next() -> Self {
        ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Camera + target description for a batch of draws.
///
/// Plain value; applying it configures the view on the backend.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderView {
    id: ViewId,
    pub view: Mat4,
    pub projection: Mat4,
    pub clear_color: Color,
    pub viewport: ViewRect,
}

impl RenderView {
    pub fn new(viewport: ViewRect) -> Self {
        Self {
            id: ViewId::next(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            clear_color: Color::BLACK,
            viewport,
        }
    }

    /// Full-target 2D view: origin top-left, +Y down, depth range [-1000, 1000].
    pub fn ortho_2d(width: u32, height: u32) -> Self {
        let mut v = Self::new(ViewRect::from_size(width, height));
        v.projection = ortho_off_center(0.0, width as f32, height as f32, 0.0, -1000.0, 1000.0);
        v
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_view(mut self, view: Mat4) -> Self {
        self.view = view;
        self
    }

    pub fn with_projection(mut self, projection: Mat4) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewRect) -> Self {
        self.viewport = viewport;
        self
    }
}

/// Right-handed off-center orthographic projection mapping depth to [0, 1].
pub fn ortho_off_center(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(left, right, bottom, top, near, far)
}
