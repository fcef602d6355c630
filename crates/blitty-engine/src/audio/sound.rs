use slotmap::new_key_type;

new_key_type! {
    /// A sound loaded into the active backend.
    pub struct SoundHandle;
    /// One playing (or paused) instance of a sound.
    pub struct ChannelHandle;
}

/// How a sound's data is kept by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SoundMode {
    /// Decoded up front. Meant for short effects.
    Sample,
    /// Decoded while playing. Meant for music.
    Stream,
}

/// Per-channel parameters handed to [`AudioBackend::play`](super::AudioBackend::play).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaySettings {
    pub looping: bool,
    pub volume: f32,
    pub pitch: f32,
    /// Start the channel paused.
    pub paused: bool,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            looping: false,
            volume: 1.0,
            pitch: 1.0,
            paused: false,
        }
    }
}

/// A loaded sound plus the defaults new channels start with.
///
/// Changing `looping`, `volume` or `pitch` affects later plays only; use the
/// channel calls on [`Audio`](super::Audio) for sounds already playing.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    handle: SoundHandle,
    mode: SoundMode,
    pub looping: bool,
    pub volume: f32,
    pub pitch: f32,
}

impl Sound {
    pub(crate) fn new(handle: SoundHandle, mode: SoundMode) -> Self {
        Self {
            handle,
            mode,
            looping: false,
            volume: 1.0,
            pitch: 1.0,
        }
    }

    pub fn handle(&self) -> SoundHandle {
        self.handle
    }

    pub fn mode(&self) -> SoundMode {
        self.mode
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub(crate) fn settings(&self, paused: bool) -> PlaySettings {
        PlaySettings {
            looping: self.looping,
            volume: self.volume.max(0.0),
            pitch: if self.pitch > 0.0 { self.pitch } else { 1.0 },
            paused,
        }
    }
}
