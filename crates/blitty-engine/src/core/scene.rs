use anyhow::Result;

use super::ctx::Context;

/// Game content driven by the fixed-step loop.
///
/// `dt` is in seconds. Every callback may fail; the error stops the loop and is
/// returned from [`Game::run`](super::Game::run) after teardown.
pub trait Scene {
    /// Called once before the first tick.
    fn load(&mut self, ctx: &mut Context) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once after the last tick, before the engine shuts down.
    fn unload(&mut self, ctx: &mut Context) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called at the fixed rate with `dt = 1 / frame_rate`.
    fn fixed_update(&mut self, ctx: &mut Context, dt: f32) -> Result<()> {
        let _ = (ctx, dt);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, dt: f32) -> Result<()> {
        let _ = (ctx, dt);
        Ok(())
    }

    /// Called once per outer tick, before the frame is presented.
    fn draw(&mut self, ctx: &mut Context) -> Result<()>;
}
