use anyhow::Result;
use blitty_engine::core::{Context, Scene};
use blitty_engine::input::Key;
use blitty_engine::paint::Color;
use blitty_engine::render::{PrimitiveType, RenderView, StaticMesh, VertexPCT};
use glam::{Vec2, Vec3};

/// One vertex-colored triangle in the middle of the window.
#[derive(Default)]
pub struct TriangleScene {
    mesh: Option<StaticMesh>,
    view: Option<RenderView>,
}

impl Scene for TriangleScene {
    fn load(&mut self, ctx: &mut Context) -> Result<()> {
        let gfx = &mut ctx.graphics;
        let (w, h) = (gfx.width() as f32, gfx.height() as f32);
        let vertices = [
            VertexPCT::new(Vec3::new(w * 0.5, h * 0.2, 0.0), Color::RED, Vec2::ZERO),
            VertexPCT::new(Vec3::new(w * 0.8, h * 0.8, 0.0), Color::GREEN, Vec2::ZERO),
            VertexPCT::new(Vec3::new(w * 0.2, h * 0.8, 0.0), Color::BLUE, Vec2::ZERO),
        ];
        self.mesh = Some(gfx.create_static_mesh("triangle", &vertices, None));
        self.view = Some(gfx.create_default_view().with_clear_color(Color::CORNFLOWER));
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, _dt: f32) -> Result<()> {
        if ctx.input.key_pressed(Key::Escape) {
            ctx.exit();
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> Result<()> {
        let (Some(mesh), Some(view)) = (&self.mesh, &self.view) else {
            return Ok(());
        };
        let gfx = &mut ctx.graphics;
        gfx.apply_render_view(view);
        gfx.set_texture(None);
        gfx.draw(mesh, None, PrimitiveType::Triangles)?;
        Ok(())
    }
}
