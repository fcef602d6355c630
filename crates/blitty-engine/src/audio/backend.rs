use slotmap::SlotMap;

use super::AudioError;
use super::sound::{ChannelHandle, PlaySettings, SoundHandle, SoundMode};

/// Audio engine interface.
///
/// Single-threaded: every call happens on the game loop thread. Channel calls
/// with a handle that was stopped, finished or never issued fail with
/// [`AudioError::UnknownChannel`].
pub trait AudioBackend {
    fn initialize(&mut self, config: &AudioConfig) -> Result<(), AudioError>;

    /// Per-tick housekeeping (finished voices, streaming).
    fn update(&mut self);

    fn shutdown(&mut self);

    /// Takes an encoded sound file (WAV and whatever else the backend decodes).
    fn load_sound(&mut self, data: &[u8], mode: SoundMode) -> Result<SoundHandle, AudioError>;

    /// Frees a sound and stops every channel playing it.
    fn release_sound(&mut self, sound: SoundHandle);

    fn play(&mut self, sound: SoundHandle, settings: &PlaySettings) -> Result<ChannelHandle, AudioError>;

    /// Stops a channel. Unknown channels are ignored.
    fn stop(&mut self, channel: ChannelHandle);

    fn stop_all(&mut self);

    fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), AudioError>;

    fn is_paused(&self, channel: ChannelHandle) -> Result<bool, AudioError>;

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError>;

    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError>;

    fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), AudioError>;

    /// True while the channel exists and is not paused.
    fn is_playing(&self, channel: ChannelHandle) -> bool;
}

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub max_channels: u32,
    /// DSP buffer length in samples.
    pub dsp_buffer_length: u32,
    pub dsp_buffer_count: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_channels: 256,
            dsp_buffer_length: 4,
            dsp_buffer_count: 32,
        }
    }
}

#[derive(Debug, Clone)]
struct NullChannel {
    sound: SoundHandle,
    settings: PlaySettings,
}

/// Backend that produces no sound. Used when no output device is wanted.
///
/// Sounds and channels are tracked so the rest of the engine behaves as with a
/// real device, but nothing ever finishes: a channel lives until it is stopped
/// or its sound is released.
#[derive(Debug)]
pub struct NullAudio {
    ticks: u64,
    max_channels: usize,
    sounds: SlotMap<SoundHandle, SoundMode>,
    channels: SlotMap<ChannelHandle, NullChannel>,
}

impl Default for NullAudio {
    fn default() -> Self {
        Self {
            ticks: 0,
            max_channels: AudioConfig::default().max_channels as usize,
            sounds: SlotMap::with_key(),
            channels: SlotMap::with_key(),
        }
    }
}

impl NullAudio {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel(&self, channel: ChannelHandle) -> Result<&NullChannel, AudioError> {
        self.channels.get(channel).ok_or(AudioError::UnknownChannel)
    }

    fn channel_mut(&mut self, channel: ChannelHandle) -> Result<&mut NullChannel, AudioError> {
        self.channels.get_mut(channel).ok_or(AudioError::UnknownChannel)
    }
}

impl AudioBackend for NullAudio {
    fn initialize(&mut self, config: &AudioConfig) -> Result<(), AudioError> {
        log::debug!("null audio backend ({} channels requested)", config.max_channels);
        self.max_channels = config.max_channels as usize;
        Ok(())
    }

    fn update(&mut self) {
        self.ticks += 1;
    }

    fn shutdown(&mut self) {
        self.channels.clear();
        self.sounds.clear();
    }

    fn load_sound(&mut self, data: &[u8], mode: SoundMode) -> Result<SoundHandle, AudioError> {
        if data.is_empty() {
            return Err(AudioError::Decode("sound data is empty".into()));
        }
        Ok(self.sounds.insert(mode))
    }

    fn release_sound(&mut self, sound: SoundHandle) {
        if self.sounds.remove(sound).is_some() {
            self.channels.retain(|_, ch| ch.sound != sound);
        }
    }

    fn play(&mut self, sound: SoundHandle, settings: &PlaySettings) -> Result<ChannelHandle, AudioError> {
        if !self.sounds.contains_key(sound) {
            return Err(AudioError::UnknownSound);
        }
        if self.channels.len() >= self.max_channels {
            return Err(AudioError::NoFreeChannel(self.max_channels));
        }
        Ok(self.channels.insert(NullChannel {
            sound,
            settings: *settings,
        }))
    }

    fn stop(&mut self, channel: ChannelHandle) {
        self.channels.remove(channel);
    }

    fn stop_all(&mut self) {
        self.channels.clear();
    }

    fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), AudioError> {
        self.channel_mut(channel)?.settings.paused = paused;
        Ok(())
    }

    fn is_paused(&self, channel: ChannelHandle) -> Result<bool, AudioError> {
        Ok(self.channel(channel)?.settings.paused)
    }

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError> {
        self.channel_mut(channel)?.settings.volume = volume;
        Ok(())
    }

    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError> {
        Ok(self.channel(channel)?.settings.volume)
    }

    fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), AudioError> {
        self.channel_mut(channel)?.settings.pitch = pitch;
        Ok(())
    }

    fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.channels.get(channel).is_some_and(|ch| !ch.settings.paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> (NullAudio, SoundHandle) {
        let mut audio = NullAudio::default();
        audio.initialize(&AudioConfig::default()).unwrap();
        let sound = audio.load_sound(b"RIFF", SoundMode::Sample).unwrap();
        (audio, sound)
    }

    // ── loading ──

    #[test]
    fn empty_data_is_a_decode_error() {
        let mut audio = NullAudio::default();
        let err = audio.load_sound(&[], SoundMode::Stream);
        assert!(matches!(err, Err(AudioError::Decode(_))));
        assert_eq!(audio.sound_count(), 0);
    }

    #[test]
    fn released_sound_cannot_play_and_stops_its_channels() {
        let (mut audio, sound) = loaded();
        let ch = audio.play(sound, &PlaySettings::default()).unwrap();

        audio.release_sound(sound);

        assert!(!audio.is_playing(ch));
        assert_eq!(audio.channel_count(), 0);
        assert!(matches!(
            audio.play(sound, &PlaySettings::default()),
            Err(AudioError::UnknownSound)
        ));
    }

    // ── channels ──

    #[test]
    fn paused_start_is_not_playing() {
        let (mut audio, sound) = loaded();
        let ch = audio
            .play(sound, &PlaySettings { paused: true, ..Default::default() })
            .unwrap();

        assert!(!audio.is_playing(ch));
        assert!(audio.is_paused(ch).unwrap());

        audio.set_paused(ch, false).unwrap();
        assert!(audio.is_playing(ch));
    }

    #[test]
    fn stopped_channel_is_unknown() {
        let (mut audio, sound) = loaded();
        let ch = audio.play(sound, &PlaySettings::default()).unwrap();

        audio.stop(ch);
        audio.stop(ch);

        assert!(!audio.is_playing(ch));
        assert!(matches!(audio.set_volume(ch, 0.5), Err(AudioError::UnknownChannel)));
        assert!(matches!(audio.volume(ch), Err(AudioError::UnknownChannel)));
    }

    #[test]
    fn channel_limit_follows_config() {
        let mut audio = NullAudio::default();
        audio
            .initialize(&AudioConfig { max_channels: 2, ..Default::default() })
            .unwrap();
        let sound = audio.load_sound(b"RIFF", SoundMode::Sample).unwrap();

        let first = audio.play(sound, &PlaySettings::default()).unwrap();
        audio.play(sound, &PlaySettings::default()).unwrap();
        assert!(matches!(
            audio.play(sound, &PlaySettings::default()),
            Err(AudioError::NoFreeChannel(2))
        ));

        audio.stop(first);
        assert!(audio.play(sound, &PlaySettings::default()).is_ok());
    }
}
