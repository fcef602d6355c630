use glam::Vec2;
use thiserror::Error;

use super::error::GraphicsError;
use super::graphics::Graphics;
use super::mesh::{DynamicMesh, MAX_QUADS_U16};
use super::quad::Quad;
use super::state::{PrimitiveType, RenderState};
use super::texture::Texture2D;
use super::view::RenderView;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Canvas2D: begin calls cannot be nested")]
    NestedBegin,

    #[error("Canvas2D: end called without begin")]
    EndWithoutBegin,

    #[error("Canvas2D: draw called outside begin/end")]
    NotBegun,

    #[error("Canvas2D: batch capacity must be at least one quad")]
    ZeroCapacity,

    #[error("Canvas2D: quad does not fit in an empty batch")]
    QuadRejected,

    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// Quad batcher.
///
/// Quads are appended to a dynamic mesh and drawn with the default shader. A batch
/// is flushed when the texture changes, when the mesh is full and on [`end`](Self::end).
pub struct Canvas2D {
    mesh: DynamicMesh,
    current_texture: Texture2D,
    default_view: RenderView,
    default_state: RenderState,
    inside_begin: bool,
    flushes: u64,
}

impl Canvas2D {
    /// Creates a batcher flushing every `max_quads` quads (capped at [`MAX_QUADS_U16`]).
    pub fn new(gfx: &mut Graphics, max_quads: u32) -> Result<Self, CanvasError> {
        if max_quads == 0 {
            return Err(CanvasError::ZeroCapacity);
        }
        Ok(Self {
            mesh: gfx.create_dynamic_mesh("Canvas2D_QuadsMesh", max_quads),
            current_texture: *gfx.primitive_texture(),
            default_view: gfx.create_default_view(),
            default_state: RenderState::default(),
            inside_begin: false,
            flushes: 0,
        })
    }

    pub fn default_view(&self) -> &RenderView {
        &self.default_view
    }

    /// Replaces the view used by `begin(.., None, ..)`, e.g. after a resize.
    pub fn set_default_view(&mut self, view: RenderView) {
        self.default_view = view;
    }

    pub fn is_drawing(&self) -> bool {
        self.inside_begin
    }

    /// Number of non-empty batches drawn so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Opens a batch with `view` and `state`, or the canvas defaults.
    pub fn begin(
        &mut self,
        gfx: &mut Graphics,
        view: Option<&RenderView>,
        state: Option<RenderState>,
    ) -> Result<(), CanvasError> {
        if self.inside_begin {
            return Err(CanvasError::NestedBegin);
        }
        gfx.apply_render_view(view.unwrap_or(&self.default_view));
        gfx.apply_render_state(state.unwrap_or(self.default_state));
        self.inside_begin = true;
        Ok(())
    }

    /// Queues `quad` centered on `position`.
    pub fn draw_quad(
        &mut self,
        gfx: &mut Graphics,
        texture: &Texture2D,
        mut quad: Quad,
        position: Vec2,
    ) -> Result<(), CanvasError> {
        if !self.inside_begin {
            return Err(CanvasError::NotBegun);
        }

        if *texture != self.current_texture {
            self.flush(gfx)?;
            gfx.set_texture(Some(texture));
            self.current_texture = *texture;
        }

        quad.set_position(position, Vec2::splat(0.5));

        if self.mesh.is_full() {
            self.flush(gfx)?;
        }
        if !self.mesh.push_quad(&quad) {
            return Err(CanvasError::QuadRejected);
        }
        Ok(())
    }

    /// Flushes the pending batch and closes the block.
    pub fn end(&mut self, gfx: &mut Graphics) -> Result<(), CanvasError> {
        if !self.inside_begin {
            return Err(CanvasError::EndWithoutBegin);
        }
        self.flush(gfx)?;
        self.inside_begin = false;
        Ok(())
    }

    fn flush(&mut self, gfx: &mut Graphics) -> Result<(), CanvasError> {
        if self.mesh.is_empty() {
            return Ok(());
        }
        gfx.draw(&self.mesh, None, PrimitiveType::Triangles)?;
        self.mesh.reset();
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Pixmap;
    use crate::coords::Rect;
    use crate::render::graphics::GraphicsSettings;
    use crate::render::testing::{CallLog, RecordingBackend};
    use crate::render::texture::TextureFilter;

    fn setup(max_quads: u32) -> (Graphics, Canvas2D, CallLog) {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut gfx = Graphics::new(Box::new(backend), GraphicsSettings::default()).unwrap();
        let canvas = Canvas2D::new(&mut gfx, max_quads).unwrap();
        log.clear();
        (gfx, canvas, log)
    }

    fn texture(gfx: &mut Graphics, id: &str) -> Texture2D {
        gfx.create_texture(id, &Pixmap::new(8, 8), false, TextureFilter::Nearest)
            .unwrap()
    }

    fn quad() -> Quad {
        Quad::from_rect(Rect::new(0.0, 0.0, 8.0, 8.0))
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn zero_capacity_is_rejected() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut gfx = Graphics::new(Box::new(backend), GraphicsSettings::default()).unwrap();
        let registered = gfx.registry().len();

        assert!(matches!(Canvas2D::new(&mut gfx, 0), Err(CanvasError::ZeroCapacity)));
        assert_eq!(gfx.registry().len(), registered);
        assert_eq!(log.submits(), 0);
    }

    #[test]
    fn single_quad_capacity_draws_every_quad() {
        let (mut gfx, mut canvas, log) = setup(1);
        let a = texture(&mut gfx, "a");
        canvas.begin(&mut gfx, None, None).unwrap();
        for _ in 0..3 {
            canvas.draw_quad(&mut gfx, &a, quad(), Vec2::ZERO).unwrap();
        }
        canvas.end(&mut gfx).unwrap();
        assert_eq!(log.submitted_vertex_counts(), vec![4, 4, 4]);
    }

    // ── begin / end ───────────────────────────────────────────────────────

    #[test]
    fn nested_begin_fails() {
        let (mut gfx, mut canvas, _) = setup(4);
        canvas.begin(&mut gfx, None, None).unwrap();
        assert!(matches!(canvas.begin(&mut gfx, None, None), Err(CanvasError::NestedBegin)));
    }

    #[test]
    fn end_without_begin_fails() {
        let (mut gfx, mut canvas, _) = setup(4);
        assert!(matches!(canvas.end(&mut gfx), Err(CanvasError::EndWithoutBegin)));
    }

    #[test]
    fn draw_outside_begin_fails() {
        let (mut gfx, mut canvas, _) = setup(4);
        let t = *gfx.primitive_texture();
        let err = canvas.draw_quad(&mut gfx, &t, quad(), Vec2::ZERO);
        assert!(matches!(err, Err(CanvasError::NotBegun)));
    }

    #[test]
    fn empty_block_submits_nothing() {
        let (mut gfx, mut canvas, log) = setup(4);
        canvas.begin(&mut gfx, None, None).unwrap();
        canvas.end(&mut gfx).unwrap();
        assert_eq!(log.submits(), 0);
        assert!(!canvas.is_drawing());
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn same_texture_is_one_batch() {
        let (mut gfx, mut canvas, log) = setup(16);
        let a = texture(&mut gfx, "a");
        canvas.begin(&mut gfx, None, None).unwrap();
        for i in 0..5 {
            canvas.draw_quad(&mut gfx, &a, quad(), Vec2::splat(i as f32)).unwrap();
        }
        canvas.end(&mut gfx).unwrap();
        assert_eq!(log.submits(), 1);
        assert_eq!(log.submitted_vertex_counts(), vec![20]);
    }

    #[test]
    fn texture_switches_flush() {
        let (mut gfx, mut canvas, log) = setup(16);
        let a = texture(&mut gfx, "a");
        let b = texture(&mut gfx, "b");
        canvas.begin(&mut gfx, None, None).unwrap();
        for t in [&a, &a, &b, &a] {
            canvas.draw_quad(&mut gfx, t, quad(), Vec2::ZERO).unwrap();
        }
        canvas.end(&mut gfx).unwrap();
        assert_eq!(log.submitted_vertex_counts(), vec![8, 4, 4]);
        assert_eq!(canvas.flush_count(), 3);
    }

    #[test]
    fn full_mesh_flushes() {
        let (mut gfx, mut canvas, log) = setup(2);
        let a = texture(&mut gfx, "a");
        canvas.begin(&mut gfx, None, None).unwrap();
        for _ in 0..5 {
            canvas.draw_quad(&mut gfx, &a, quad(), Vec2::ZERO).unwrap();
        }
        canvas.end(&mut gfx).unwrap();
        assert_eq!(log.submitted_vertex_counts(), vec![8, 8, 4]);
    }

    #[test]
    fn quads_are_centered_on_position() {
        let (mut gfx, mut canvas, _) = setup(4);
        let a = texture(&mut gfx, "a");
        canvas.begin(&mut gfx, None, None).unwrap();
        canvas.draw_quad(&mut gfx, &a, quad(), Vec2::new(100.0, 50.0)).unwrap();

        let corners: Vec<Vec2> = canvas.mesh.vertices().iter().map(|v| v.xy()).collect();
        assert_eq!(
            corners,
            vec![
                Vec2::new(96.0, 46.0),
                Vec2::new(104.0, 46.0),
                Vec2::new(104.0, 54.0),
                Vec2::new(96.0, 54.0),
            ]
        );
        canvas.end(&mut gfx).unwrap();
        assert!(canvas.mesh.is_empty());
    }

    #[test]
    fn begin_applies_given_view_and_state() {
        use crate::render::state::BlendMode;
        let (mut gfx, mut canvas, _) = setup(4);
        let view = RenderView::ortho_2d(320, 240);
        canvas
            .begin(&mut gfx, Some(&view), Some(RenderState::new(BlendMode::Multiply)))
            .unwrap();
        assert_eq!(gfx.current_view(), view.id());
        assert_eq!(gfx.render_state().blend(), BlendMode::Multiply);
    }
}
