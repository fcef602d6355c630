use std::time::Duration;

use anyhow::{Context as _, Result};

use super::ctx::Context;
use super::scene::Scene;
use crate::platform::{Platform, PlatformEvent};
use crate::time::FrameClock;

/// Yield applied per tick while the window is minimized.
const INACTIVE_SLEEP: Duration = Duration::from_millis(1);

/// Counters describing one outer iteration.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TickStats {
    /// Smoothed delta, counter units.
    pub delta: f64,
    /// Accumulator right after the clock tick, before fixed steps drained it.
    pub accumulator: f64,
    pub resynced: bool,
    pub fixed_updates: u32,
    pub updates: u32,
}

/// Fixed-timestep game loop driver.
///
/// Locked mode pairs every fixed step with a variable update. Unlocked mode runs
/// fixed steps to drain the accumulator and a single variable update with the
/// remaining real time, so rendering is not capped by the fixed rate.
///
/// Input transitions are published right before each variable update, so a
/// tick that runs no update leaves them queued for the next one.
#[derive(Debug)]
pub struct FixedStepScheduler {
    clock: FrameClock,
    unlocked: bool,
    update_multiplier: u32,
    events: Vec<PlatformEvent>,
}

impl FixedStepScheduler {
    pub fn new(frame_rate: f64, frequency: u64, unlocked: bool) -> Self {
        Self {
            clock: FrameClock::new(frame_rate, frequency),
            unlocked,
            update_multiplier: 1,
            events: Vec::new(),
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        self.clock.set_frame_rate(frame_rate);
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn set_unlocked(&mut self, unlocked: bool) {
        self.unlocked = unlocked;
    }

    /// Rebases the clock on `counter`. The next tick is a resync tick.
    pub fn reset(&mut self, counter: u64) {
        self.clock.reset(counter);
    }

    /// Runs one outer iteration: clock, events, updates, draw, present.
    pub fn tick(
        &mut self,
        platform: &mut dyn Platform,
        ctx: &mut Context,
        scene: &mut dyn Scene,
    ) -> Result<TickStats> {
        let clock_tick = self.clock.tick(platform.performance_counter());
        let mut stats = TickStats {
            delta: clock_tick.delta,
            accumulator: clock_tick.accumulator,
            resynced: clock_tick.resynced,
            ..TickStats::default()
        };

        self.events.clear();
        platform.process_events(&mut self.events);
        for ev in &self.events {
            ctx.handle_platform_event(ev);
        }

        let desired = self.clock.desired_interval();
        let fixed_dt = self.clock.fixed_delta() as f32;

        if self.unlocked {
            let mut consumed = clock_tick.delta;

            while self.clock.accumulator() >= desired {
                scene.fixed_update(ctx, fixed_dt)?;
                stats.fixed_updates += 1;

                if consumed > desired {
                    ctx.audio.update();
                    ctx.input.begin_update();
                    scene.update(ctx, fixed_dt)?;
                    stats.updates += 1;
                    consumed -= desired;
                }

                self.clock.consume(desired);
            }

            ctx.audio.update();
            ctx.input.begin_update();
            scene.update(ctx, (consumed / self.clock.frequency()) as f32)?;
            stats.updates += 1;
        } else {
            let step = desired * self.update_multiplier as f64;

            while self.clock.accumulator() >= step {
                for _ in 0..self.update_multiplier {
                    ctx.audio.update();
                    ctx.input.begin_update();
                    scene.fixed_update(ctx, fixed_dt)?;
                    scene.update(ctx, fixed_dt)?;
                    stats.fixed_updates += 1;
                    stats.updates += 1;
                    self.clock.consume(desired);
                }
            }
        }

        scene.draw(ctx)?;
        ctx.graphics.frame().context("failed to present frame")?;

        if !ctx.is_active() {
            platform.sleep(INACTIVE_SLEEP);
        }

        Ok(stats)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::Audio;
    use crate::input::{InputEvent, Key};
    use crate::platform::scripted::ScriptedPlatform;
    use crate::render::testing::RecordingBackend;
    use crate::render::{Graphics, GraphicsSettings};

    /// Counter frequency giving an exact 10_000 tick frame at 60 Hz.
    pub(crate) const FREQ: u64 = 600_000;
    pub(crate) const FRAME: u64 = FREQ / 60;

    #[derive(Debug, Default)]
    pub(crate) struct CountingScene {
        pub loads: u32,
        pub unloads: u32,
        pub fixed: u32,
        pub updates: Vec<f32>,
        pub draws: u32,
        pub exit_after_draws: Option<u32>,
        pub fail_on_draw: Option<u32>,
        pub space_presses: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, _ctx: &mut Context) -> Result<()> {
            self.loads += 1;
            Ok(())
        }

        fn unload(&mut self, _ctx: &mut Context) -> Result<()> {
            self.unloads += 1;
            Ok(())
        }

        fn fixed_update(&mut self, _ctx: &mut Context, _dt: f32) -> Result<()> {
            self.fixed += 1;
            Ok(())
        }

        fn update(&mut self, ctx: &mut Context, dt: f32) -> Result<()> {
            self.updates.push(dt);
            if ctx.input.key_pressed(Key::Space) {
                self.space_presses += 1;
            }
            Ok(())
        }

        fn draw(&mut self, ctx: &mut Context) -> Result<()> {
            self.draws += 1;
            if self.fail_on_draw == Some(self.draws) {
                anyhow::bail!("draw {} failed", self.draws);
            }
            if self.exit_after_draws == Some(self.draws) {
                ctx.exit();
            }
            Ok(())
        }
    }

    fn context() -> Context {
        let gfx = Graphics::new(Box::new(RecordingBackend::new()), GraphicsSettings::default())
            .expect("graphics");
        let mut ctx = Context::new(gfx, Audio::new());
        ctx.start();
        ctx
    }

    fn steady_platform(step: u64) -> ScriptedPlatform {
        let mut p = ScriptedPlatform::new(FREQ, []);
        p.fallback_step = step;
        p
    }

    fn run_ticks(unlocked: bool, step: u64, ticks: usize) -> Vec<TickStats> {
        let mut platform = steady_platform(step);
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, unlocked);
        sched.reset(platform.performance_counter());

        (0..ticks)
            .map(|_| sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick"))
            .collect()
    }

    // ── determinism ───────────────────────────────────────────────────────

    #[test]
    fn locked_runs_one_fixed_step_per_frame() {
        let stats = run_ticks(false, FRAME, 10);
        assert!(stats[0].resynced);
        assert_eq!(stats[0].fixed_updates, 0);
        for s in &stats[1..] {
            assert_eq!(s.fixed_updates, 1);
            assert_eq!(s.updates, 1);
        }
    }

    #[test]
    fn unlocked_runs_one_fixed_step_per_frame() {
        let stats = run_ticks(true, FRAME, 10);
        for s in &stats[1..] {
            assert_eq!(s.fixed_updates, 1);
            assert_eq!(s.updates, 1);
        }
    }

    #[test]
    fn unlocked_variable_update_gets_remaining_time() {
        let mut platform = steady_platform(FRAME);
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, true);
        sched.reset(platform.performance_counter());

        for _ in 0..3 {
            sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick");
        }
        let last = *scene.updates.last().expect("update");
        assert_eq!(last, (FRAME as f64 / FREQ as f64) as f32);
    }

    #[test]
    fn thirty_hz_counter_runs_two_fixed_steps() {
        for unlocked in [false, true] {
            let stats = run_ticks(unlocked, FRAME * 2, 7);
            for s in &stats[3..] {
                assert_eq!(s.delta, (FRAME * 2) as f64);
                assert_eq!(s.fixed_updates, 2, "unlocked = {unlocked}");
                assert_eq!(s.updates, 2, "unlocked = {unlocked}");
            }
        }
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn four_ticks_at_sixty_hz() {
        let mut platform = ScriptedPlatform::new(FREQ, [0, FRAME, FRAME, FRAME, FRAME]);
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, false);
        sched.reset(platform.performance_counter());

        let stats: Vec<_> = (0..4)
            .map(|_| sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick"))
            .collect();

        assert_eq!(stats[3].delta, FRAME as f64);
        assert_eq!(stats[3].accumulator, FRAME as f64);
        assert_eq!(sched.clock().accumulator(), 0.0);
        assert_eq!(scene.fixed, 3);
        assert_eq!(scene.draws, 4);
    }

    // ── events ────────────────────────────────────────────────────────────

    fn space_tap() -> Vec<PlatformEvent> {
        vec![
            PlatformEvent::Input(InputEvent::Key { key: Key::Space, pressed: true, repeat: false }),
            PlatformEvent::Input(InputEvent::Key { key: Key::Space, pressed: false, repeat: false }),
        ]
    }

    fn count_space_presses(unlocked: bool, step: u64, ticks: usize) -> (CountingScene, usize) {
        let mut platform = steady_platform(step);
        for _ in 0..10 {
            platform.push_events(space_tap());
        }
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, unlocked);
        sched.reset(platform.performance_counter());

        for _ in 0..ticks {
            sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick");
        }
        let pending = ctx.input.pending_transitions();
        (scene, pending)
    }

    // ── input delivery ────────────────────────────────────────────────────

    #[test]
    fn locked_fast_display_keeps_every_press() {
        // 120 Hz ticks: only every other tick runs an update.
        let (scene, pending) = count_space_presses(false, FRAME / 2, 40);
        assert!(scene.updates.len() >= 10);
        assert_eq!(scene.space_presses, 10);
        assert_eq!(pending, 0);
    }

    #[test]
    fn unlocked_slow_display_reports_each_press_once() {
        // 30 Hz ticks: two variable updates per tick.
        let (scene, pending) = count_space_presses(true, FRAME * 2, 20);
        assert!(scene.updates.len() > 20);
        assert_eq!(scene.space_presses, 10);
        assert_eq!(pending, 0);
    }

    #[test]
    fn quit_event_stops_running_but_tick_completes() {
        let mut platform = steady_platform(FRAME);
        platform.push_events(vec![PlatformEvent::Quit]);
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, false);

        sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick");
        assert!(!ctx.is_running());
        assert_eq!(scene.draws, 1);
    }

    #[test]
    fn minimized_window_sleeps_each_tick() {
        let mut platform = steady_platform(FRAME);
        platform.push_events(vec![PlatformEvent::Minimized]);
        let mut ctx = context();
        let mut scene = CountingScene::default();
        let mut sched = FixedStepScheduler::new(60.0, FREQ, false);

        sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick");
        sched.tick(&mut platform, &mut ctx, &mut scene).expect("tick");
        assert_eq!(platform.sleeps, 2);
    }

    #[test]
    fn scene_error_propagates() {
        let mut platform = steady_platform(FRAME);
        let mut ctx = context();
        let mut scene = CountingScene { fail_on_draw: Some(1), ..Default::default() };
        let mut sched = FixedStepScheduler::new(60.0, FREQ, false);

        let err = sched.tick(&mut platform, &mut ctx, &mut scene).unwrap_err();
        assert!(err.to_string().contains("draw 1 failed"));
    }
}
