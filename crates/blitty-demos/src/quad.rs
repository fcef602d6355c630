use anyhow::Result;
use blitty_engine::core::{Context, Scene};
use blitty_engine::input::Key;
use blitty_engine::paint::Color;
use blitty_engine::render::{PrimitiveType, RenderView, StaticMesh, VertexPCT};
use glam::{Vec2, Vec3};

/// Indexed quad whose tint pulses over time.
#[derive(Default)]
pub struct QuadScene {
    mesh: Option<StaticMesh>,
    view: Option<RenderView>,
    time: f32,
}

impl Scene for QuadScene {
    fn load(&mut self, ctx: &mut Context) -> Result<()> {
        let gfx = &mut ctx.graphics;
        let (w, h) = (gfx.width() as f32, gfx.height() as f32);
        let (l, t, r, b) = (w * 0.25, h * 0.25, w * 0.75, h * 0.75);
        let vertices = [
            VertexPCT::new(Vec3::new(l, t, 0.0), Color::RED, Vec2::new(0.0, 0.0)),
            VertexPCT::new(Vec3::new(r, t, 0.0), Color::GREEN, Vec2::new(1.0, 0.0)),
            VertexPCT::new(Vec3::new(l, b, 0.0), Color::BLUE, Vec2::new(0.0, 1.0)),
            VertexPCT::new(Vec3::new(r, b, 0.0), Color::YELLOW, Vec2::new(1.0, 1.0)),
        ];
        let indices = [0, 1, 2, 1, 3, 2];
        self.mesh = Some(gfx.create_static_mesh("quad", &vertices, Some(&indices)));
        self.view = Some(gfx.create_default_view().with_clear_color(Color::BLACK));
        Ok(())
    }

    fn fixed_update(&mut self, _ctx: &mut Context, dt: f32) -> Result<()> {
        self.time += dt;
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
        let pulse = 0.6 + 0.4 * (self.time * 2.0).sin();
        gfx.default_shader_mut()
            .require_param("u_tint")?
            .set_color(Color::from_f32(pulse, pulse, pulse, 1.0));

        gfx.apply_render_view(view);
        gfx.set_texture(None);
        gfx.draw(mesh, None, PrimitiveType::Triangles)?;
        Ok(())
    }

    fn unload(&mut self, ctx: &mut Context) -> Result<()> {
        ctx.graphics
            .default_shader_mut()
            .require_param("u_tint")?
            .set_color(Color::WHITE);
        Ok(())
    }
}
