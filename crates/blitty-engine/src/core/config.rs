use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::render::{GraphicsSettings, MsaaLevel};

pub const DEFAULT_TITLE: &str = "BLITTY GAME";
pub const MIN_WINDOW_WIDTH: i32 = 320;
pub const MIN_WINDOW_HEIGHT: i32 = 240;
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Game settings persisted as JSON next to the executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub window_width: i32,
    pub window_height: i32,
    pub fullscreen: bool,
    pub enable_audio: bool,
    /// Fixed steps per second.
    pub frame_rate: f64,
    pub unlock_frame_rate: bool,
    pub vsync: bool,
    pub msaa: MsaaLevel,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            window_width: 640,
            window_height: 480,
            fullscreen: false,
            enable_audio: true,
            frame_rate: DEFAULT_FRAME_RATE,
            unlock_frame_rate: true,
            vsync: true,
            msaa: MsaaLevel::None,
        }
    }
}

impl GameConfig {
    /// Loads `path`, or writes and returns the defaults when it does not exist.
    ///
    /// Invalid values are replaced and the corrected config is written back.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("created default config at {}", path.display());
            return Ok(config);
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        if config.sanitize() {
            log::warn!("config {} had invalid values; rewriting", path.display());
            config.save(path)?;
        }

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("failed to write config {}", path.display()))
    }

    /// Replaces invalid values. Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut modified = false;

        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
            modified = true;
        }
        if self.window_width <= 0 {
            self.window_width = MIN_WINDOW_WIDTH;
            modified = true;
        }
        if self.window_height <= 0 {
            self.window_height = MIN_WINDOW_HEIGHT;
            modified = true;
        }
        if self.frame_rate <= 0.0 || !self.frame_rate.is_finite() {
            self.frame_rate = DEFAULT_FRAME_RATE;
            modified = true;
        }

        modified
    }

    /// Window size in pixels. Call after [`sanitize`](Self::sanitize).
    pub fn window_size(&self) -> (u32, u32) {
        (
            self.window_width.max(MIN_WINDOW_WIDTH) as u32,
            self.window_height.max(MIN_WINDOW_HEIGHT) as u32,
        )
    }

    pub fn graphics_settings(&self) -> GraphicsSettings {
        let (width, height) = self.window_size();
        GraphicsSettings {
            width,
            height,
            vsync: self.vsync,
            msaa: self.msaa,
        }
    }
}
