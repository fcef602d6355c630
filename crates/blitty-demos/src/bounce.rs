use anyhow::Result;
use blitty_engine::content::Pixmap;
use blitty_engine::core::{Context, Scene};
use blitty_engine::input::Key;
use blitty_engine::paint::Color;
use blitty_engine::render::{Canvas2D, Quad, RenderView, Texture2D, TextureFilter};
use glam::Vec2;

const SPRITE_SIZE: u32 = 32;
const INITIAL_SPRITES: usize = 256;
const SPRITES_PER_PRESS: usize = 256;
const MAX_BATCH_QUADS: u32 = 2048;
const SPEED: f32 = 180.0;

struct Sprite {
    position: Vec2,
    velocity: Vec2,
    texture: usize,
}

/// Two textures bouncing around the window through the batching canvas.
///
/// Sprites alternate textures, so every quad costs a batch flush in draw order.
/// Space adds sprites, Escape quits.
#[derive(Default)]
pub struct BounceScene {
    canvas: Option<Canvas2D>,
    textures: Vec<Texture2D>,
    view: Option<RenderView>,
    view_size: (u32, u32),
    sprites: Vec<Sprite>,
    seed: u32,
}

impl BounceScene {
    fn spawn(&mut self, count: usize, bounds: Vec2) {
        for _ in 0..count {
            let i = self.sprites.len();
            let a = self.next_unit() * std::f32::consts::TAU;
            let sprite = Sprite {
                position: Vec2::new(self.next_unit() * bounds.x, self.next_unit() * bounds.y),
                velocity: Vec2::from_angle(a) * SPEED * (0.5 + self.next_unit()),
                texture: i % 2,
            };
            self.sprites.push(sprite);
        }
        log::info!("{} sprites", self.sprites.len());
    }

    /// xorshift32 in [0, 1).
    fn next_unit(&mut self) -> f32 {
        let mut x = self.seed.max(1);
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.seed = x;
        (x >> 8) as f32 / (1u32 << 24) as f32
    }
}

fn checker(size: u32, a: Color, b: Color) -> Pixmap {
    let mut pixmap = Pixmap::new(size, size);
    let cell = (size / 4).max(1);
    for y in 0..size {
        for x in 0..size {
            let c = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            pixmap.set_pixel(x, y, c);
        }
    }
    pixmap
}

fn disc(size: u32, color: Color) -> Pixmap {
    let mut pixmap = Pixmap::new(size, size);
    let r = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5 - r, y as f32 + 0.5 - r).length();
            if d <= r {
                pixmap.set_pixel(x, y, color);
            }
        }
    }
    pixmap
}

impl Scene for BounceScene {
    fn load(&mut self, ctx: &mut Context) -> Result<()> {
        let gfx = &mut ctx.graphics;
        self.textures = vec![
            gfx.create_texture(
                "bounce_checker",
                &checker(SPRITE_SIZE, Color::WHITE, Color::CORNFLOWER),
                false,
                TextureFilter::Nearest,
            )?,
            gfx.create_texture(
                "bounce_disc",
                &disc(SPRITE_SIZE, Color::YELLOW),
                false,
                TextureFilter::Linear,
            )?,
        ];
        self.canvas = Some(Canvas2D::new(gfx, MAX_BATCH_QUADS)?);
        self.seed = 0x9E37_79B9;

        let bounds = Vec2::new(gfx.width() as f32, gfx.height() as f32);
        self.spawn(INITIAL_SPRITES, bounds);
        Ok(())
    }

    fn fixed_update(&mut self, ctx: &mut Context, dt: f32) -> Result<()> {
        let max = Vec2::new(ctx.graphics.width() as f32, ctx.graphics.height() as f32);
        let half = SPRITE_SIZE as f32 * 0.5;

        for s in &mut self.sprites {
            s.position += s.velocity * dt;

            if s.position.x < half || s.position.x > max.x - half {
                s.velocity.x = -s.velocity.x;
                s.position.x = s.position.x.clamp(half, (max.x - half).max(half));
            }
            if s.position.y < half || s.position.y > max.y - half {
                s.velocity.y = -s.velocity.y;
                s.position.y = s.position.y.clamp(half, (max.y - half).max(half));
            }
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, _dt: f32) -> Result<()> {
        if ctx.input.key_pressed(Key::Escape) {
            ctx.exit();
        }
        if ctx.input.key_pressed(Key::Space) {
            let bounds = Vec2::new(ctx.graphics.width() as f32, ctx.graphics.height() as f32);
            self.spawn(SPRITES_PER_PRESS, bounds);
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> Result<()> {
        let gfx = &mut ctx.graphics;
        let size = (gfx.width(), gfx.height());
        if self.view.is_none() || self.view_size != size {
            self.view = Some(gfx.create_default_view().with_clear_color(Color::rgb(24, 24, 32)));
            self.view_size = size;
        }
        let (Some(canvas), Some(view)) = (self.canvas.as_mut(), self.view.as_ref()) else {
            return Ok(());
        };

        canvas.begin(gfx, Some(view), None)?;
        for s in &self.sprites {
            let texture = &self.textures[s.texture];
            canvas.draw_quad(gfx, texture, Quad::from_texture(texture, None), s.position)?;
        }
        canvas.end(gfx)?;
        Ok(())
    }

    fn unload(&mut self, _ctx: &mut Context) -> Result<()> {
        self.sprites.clear();
        Ok(())
    }
}
