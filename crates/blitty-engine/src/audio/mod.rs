//! Audio subsystem.
//!
//! Playback itself lives behind [`AudioBackend`]; the engine initializes the
//! backend once, ticks it once per variable update and shuts it down on exit.
//! Scenes load [`Sound`]s and drive the channels they return through [`Audio`].

mod backend;
#[cfg(feature = "rodio")]
mod rodio_backend;
mod sound;

pub use backend::{AudioBackend, AudioConfig, NullAudio};
#[cfg(feature = "rodio")]
pub use rodio_backend::RodioAudio;
pub use sound::{ChannelHandle, PlaySettings, Sound, SoundHandle, SoundMode};

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio is already initialized")]
    AlreadyInitialized,

    #[error("audio is not initialized")]
    NotInitialized,

    #[error("audio backend failed to initialize: {0}")]
    Backend(String),

    #[error("failed to decode sound: {0}")]
    Decode(String),

    #[error("failed to read sound file: {0}")]
    Io(#[from] std::io::Error),

    #[error("sound was released or never loaded")]
    UnknownSound,

    #[error("channel has stopped or never existed")]
    UnknownChannel,

    #[error("all {0} channels are in use")]
    NoFreeChannel(usize),

    #[error("pitch must be a positive number, got {0}")]
    InvalidPitch(f32),
}

/// Owner of the active audio backend, if any.
#[derive(Default)]
pub struct Audio {
    backend: Option<Box<dyn AudioBackend>>,
}

impl Audio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Initializes `backend` and makes it active.
    pub fn init(&mut self, mut backend: Box<dyn AudioBackend>, config: &AudioConfig) -> Result<(), AudioError> {
        if self.backend.is_some() {
            return Err(AudioError::AlreadyInitialized);
        }
        backend.initialize(config)?;
        log::info!("audio initialized ({} channels)", config.max_channels);
        self.backend = Some(backend);
        Ok(())
    }

    /// Ticks the backend. No-op when audio is disabled.
    pub fn update(&mut self) {
        if let Some(b) = self.backend.as_mut() {
            b.update();
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut b) = self.backend.take() {
            log::info!("audio shutdown");
            b.stop_all();
            b.shutdown();
        }
    }

    fn backend(&self) -> Result<&dyn AudioBackend, AudioError> {
        self.backend.as_deref().ok_or(AudioError::NotInitialized)
    }

    fn backend_mut(&mut self) -> Result<&mut dyn AudioBackend, AudioError> {
        match self.backend.as_mut() {
            Some(b) => Ok(b.as_mut()),
            None => Err(AudioError::NotInitialized),
        }
    }

    // ── sounds ──

    /// Loads a fully decoded sound, for short effects.
    pub fn load_sound(&mut self, data: &[u8]) -> Result<Sound, AudioError> {
        self.load(data, SoundMode::Sample)
    }

    /// Loads a sound decoded while it plays, for music.
    pub fn load_streamed_sound(&mut self, data: &[u8]) -> Result<Sound, AudioError> {
        self.load(data, SoundMode::Stream)
    }

    pub fn load_sound_file(&mut self, path: impl AsRef<Path>, mode: SoundMode) -> Result<Sound, AudioError> {
        let path = path.as_ref();
        // Report a missing backend before touching the filesystem.
        self.backend()?;
        let data = std::fs::read(path)?;
        log::debug!("loading sound {} ({} bytes)", path.display(), data.len());
        self.load(&data, mode)
    }

    fn load(&mut self, data: &[u8], mode: SoundMode) -> Result<Sound, AudioError> {
        let handle = self.backend_mut()?.load_sound(data, mode)?;
        Ok(Sound::new(handle, mode))
    }

    /// Frees `sound`, stopping any channel still playing it.
    pub fn release_sound(&mut self, sound: &Sound) {
        if let Some(b) = self.backend.as_mut() {
            b.release_sound(sound.handle());
        }
    }

    /// Starts `sound` on a new channel using its looping, volume and pitch.
    pub fn play(&mut self, sound: &Sound) -> Result<ChannelHandle, AudioError> {
        self.backend_mut()?.play(sound.handle(), &sound.settings(false))
    }

    /// Like [`play`](Self::play) but the channel starts paused.
    pub fn play_paused(&mut self, sound: &Sound) -> Result<ChannelHandle, AudioError> {
        self.backend_mut()?.play(sound.handle(), &sound.settings(true))
    }

    // ── channels ──

    pub fn stop(&mut self, channel: ChannelHandle) {
        if let Some(b) = self.backend.as_mut() {
            b.stop(channel);
        }
    }

    pub fn stop_all(&mut self) {
        if let Some(b) = self.backend.as_mut() {
            b.stop_all();
        }
    }

    pub fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), AudioError> {
        self.backend_mut()?.set_paused(channel, paused)
    }

    pub fn is_paused(&self, channel: ChannelHandle) -> Result<bool, AudioError> {
        self.backend()?.is_paused(channel)
    }

    /// Negative volumes are treated as silence.
    pub fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError> {
        self.backend_mut()?.set_volume(channel, volume.max(0.0))
    }

    pub fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError> {
        self.backend()?.volume(channel)
    }

    /// Playback speed multiplier; 1.0 is the recorded pitch.
    pub fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), AudioError> {
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(AudioError::InvalidPitch(pitch));
        }
        self.backend_mut()?.set_pitch(channel, pitch)
    }

    /// False when audio is disabled.
    pub fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_playing(channel))
    }
}

impl std::fmt::Debug for Audio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Audio")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
