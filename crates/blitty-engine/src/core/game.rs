use anyhow::{Context as _, Result, bail};

use super::config::GameConfig;
use super::ctx::Context;
use super::scene::Scene;
use super::scheduler::FixedStepScheduler;
#[cfg(feature = "rodio")]
use crate::audio::RodioAudio;
use crate::audio::{Audio, AudioConfig, AudioError, NullAudio};
use crate::device::{GpuInit, WgpuBackend};
use crate::platform::{Platform, WinitPlatform};
use crate::render::{GpuBackend, Graphics};

/// Game host: owns the platform, the engine [`Context`] and runs a [`Scene`].
pub struct Game {
    config: GameConfig,
    platform: Box<dyn Platform>,
    ctx: Context,
    shut_down: bool,
}

impl Game {
    /// Opens the window and initializes graphics and audio.
    pub fn new(mut config: GameConfig) -> Result<Self> {
        config.sanitize();
        let (width, height) = config.window_size();

        let mut platform =
            WinitPlatform::new(&config.title, width, height).context("failed to initialize platform")?;
        if config.fullscreen {
            platform.set_fullscreen(true);
        }

        let backend = WgpuBackend::new(platform.window(), &GpuInit::with_vsync(config.vsync))
            .context("failed to initialize graphics")?;

        Self::with_platform(config, Box::new(platform), Box::new(backend))
    }

    /// Builds a game on caller-provided platform and GPU backend.
    pub fn with_platform(
        mut config: GameConfig,
        platform: Box<dyn Platform>,
        backend: Box<dyn GpuBackend>,
    ) -> Result<Self> {
        config.sanitize();

        let graphics = Graphics::new(backend, config.graphics_settings())
            .context("failed to create default graphics resources")?;

        let mut audio = Audio::new();
        if config.enable_audio {
            init_audio(&mut audio).context("failed to initialize audio")?;
        }

        log::info!(
            "game `{}` initialized ({} fps, {})",
            config.title,
            config.frame_rate,
            if config.unlock_frame_rate { "unlocked" } else { "locked" }
        );

        Ok(Self {
            config,
            platform,
            ctx: Context::new(graphics, audio),
            shut_down: false,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Frame rate and unlock mode are read when [`run`](Self::run) starts.
    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Runs `scene` until it exits or the window closes, then shuts the engine down.
    ///
    /// Scene errors stop the loop; `unload` and teardown still run before the
    /// error is returned.
    pub fn run(&mut self, scene: &mut dyn Scene) -> Result<()> {
        if self.shut_down {
            bail!("game has already been shut down");
        }

        let result = self.run_scene(scene);
        self.shutdown();
        result
    }

    fn run_scene(&mut self, scene: &mut dyn Scene) -> Result<()> {
        self.config.sanitize();
        let mut scheduler = FixedStepScheduler::new(
            self.config.frame_rate,
            self.platform.performance_frequency(),
            self.config.unlock_frame_rate,
        );

        self.platform.set_title(&self.config.title);
        self.ctx.start();

        scene.load(&mut self.ctx).context("scene load failed")?;

        let looped = self.run_loop(&mut scheduler, scene);
        let unloaded = scene.unload(&mut self.ctx).context("scene unload failed");
        looped.and(unloaded)
    }

    fn run_loop(&mut self, scheduler: &mut FixedStepScheduler, scene: &mut dyn Scene) -> Result<()> {
        // First frame is produced while the window is still hidden.
        scheduler.tick(self.platform.as_mut(), &mut self.ctx, scene)?;
        self.platform.show_window(true);
        scheduler.reset(self.platform.performance_counter());

        while self.ctx.is_running() {
            scheduler.tick(self.platform.as_mut(), &mut self.ctx, scene)?;
        }
        Ok(())
    }

    /// Releases graphics, audio and the platform. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        log::info!("BLITTY is shutting down");

        self.ctx.graphics.shutdown();
        self.ctx.audio.shutdown();
        self.platform.shutdown();
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Uses the system output device when built with it, otherwise silent audio.
fn init_audio(audio: &mut Audio) -> Result<(), AudioError> {
    let config = AudioConfig::default();
    #[cfg(feature = "rodio")]
    {
        match audio.init(Box::new(RodioAudio::new()), &config) {
            Ok(()) => return Ok(()),
            Err(e) => log::warn!("{e}; falling back to silent audio"),
        }
    }
    audio.init(Box::new(NullAudio::default()), &config)
}
