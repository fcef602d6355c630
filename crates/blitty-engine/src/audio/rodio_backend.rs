use std::io::Cursor;
use std::sync::Arc;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use slotmap::SlotMap;

use super::backend::{AudioBackend, AudioConfig};
use super::sound::{ChannelHandle, PlaySettings, SoundHandle, SoundMode};
use super::AudioError;

enum LoadedSound {
    /// PCM decoded at load time.
    Sample {
        channels: u16,
        sample_rate: u32,
        samples: Vec<i16>,
    },
    /// Encoded bytes, decoded by each channel as it plays.
    Stream(Arc<[u8]>),
}

struct Voice {
    sound: SoundHandle,
    sink: Sink,
}

/// Output through the system's default device.
pub struct RodioAudio {
    // Dropping the stream silences every sink.
    stream: Option<(OutputStream, OutputStreamHandle)>,
    max_channels: usize,
    sounds: SlotMap<SoundHandle, LoadedSound>,
    voices: SlotMap<ChannelHandle, Voice>,
}

impl RodioAudio {
    pub fn new() -> Self {
        Self {
            stream: None,
            max_channels: AudioConfig::default().max_channels as usize,
            sounds: SlotMap::with_key(),
            voices: SlotMap::with_key(),
        }
    }

    fn decoder(data: Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, AudioError> {
        Decoder::new(Cursor::new(data)).map_err(|e| AudioError::Decode(e.to_string()))
    }

    fn sink(&self, channel: ChannelHandle) -> Result<&Sink, AudioError> {
        self.voices
            .get(channel)
            .map(|v| &v.sink)
            .ok_or(AudioError::UnknownChannel)
    }
}

impl Default for RodioAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RodioAudio {
    fn initialize(&mut self, config: &AudioConfig) -> Result<(), AudioError> {
        let stream = OutputStream::try_default()
            .map_err(|e| AudioError::Backend(format!("no audio output device: {e}")))?;
        self.stream = Some(stream);
        self.max_channels = config.max_channels as usize;
        log::info!("rodio audio backend initialized");
        Ok(())
    }

    fn update(&mut self) {
        self.voices.retain(|_, v| !v.sink.empty());
    }

    fn shutdown(&mut self) {
        self.stop_all();
        self.sounds.clear();
        self.stream = None;
        log::info!("rodio audio backend shut down");
    }

    fn load_sound(&mut self, data: &[u8], mode: SoundMode) -> Result<SoundHandle, AudioError> {
        let bytes: Arc<[u8]> = Arc::from(data);
        // Decoding once up front also validates streamed sounds.
        let decoder = Self::decoder(bytes.clone())?;
        let loaded = match mode {
            SoundMode::Sample => LoadedSound::Sample {
                channels: decoder.channels(),
                sample_rate: decoder.sample_rate(),
                samples: decoder.collect(),
            },
            SoundMode::Stream => LoadedSound::Stream(bytes),
        };
        Ok(self.sounds.insert(loaded))
    }

    fn release_sound(&mut self, sound: SoundHandle) {
        if self.sounds.remove(sound).is_some() {
            self.voices.retain(|_, v| {
                if v.sound == sound {
                    v.sink.stop();
                }
                v.sound != sound
            });
        }
    }

    fn play(&mut self, sound: SoundHandle, settings: &PlaySettings) -> Result<ChannelHandle, AudioError> {
        let (_, handle) = self.stream.as_ref().ok_or(AudioError::NotInitialized)?;
        let loaded = self.sounds.get(sound).ok_or(AudioError::UnknownSound)?;
        if self.voices.len() >= self.max_channels {
            return Err(AudioError::NoFreeChannel(self.max_channels));
        }

        let sink = Sink::try_new(handle).map_err(|e| AudioError::Backend(e.to_string()))?;
        sink.set_volume(settings.volume);
        sink.set_speed(settings.pitch);
        if settings.paused {
            sink.pause();
        }

        match loaded {
            LoadedSound::Sample {
                channels,
                sample_rate,
                samples,
            } => {
                let source = SamplesBuffer::new(*channels, *sample_rate, samples.clone());
                if settings.looping {
                    sink.append(source.repeat_infinite());
                } else {
                    sink.append(source);
                }
            }
            LoadedSound::Stream(bytes) => {
                let source = Self::decoder(bytes.clone())?;
                if settings.looping {
                    sink.append(source.repeat_infinite());
                } else {
                    sink.append(source);
                }
            }
        }

        Ok(self.voices.insert(Voice { sound, sink }))
    }

    fn stop(&mut self, channel: ChannelHandle) {
        if let Some(v) = self.voices.remove(channel) {
            v.sink.stop();
        }
    }

    fn stop_all(&mut self) {
        for (_, v) in self.voices.drain() {
            v.sink.stop();
        }
    }

    fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), AudioError> {
        let sink = self.sink(channel)?;
        if paused {
            sink.pause();
        } else {
            sink.play();
        }
        Ok(())
    }

    fn is_paused(&self, channel: ChannelHandle) -> Result<bool, AudioError> {
        Ok(self.sink(channel)?.is_paused())
    }

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError> {
        self.sink(channel)?.set_volume(volume);
        Ok(())
    }

    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError> {
        Ok(self.sink(channel)?.volume())
    }

    fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), AudioError> {
        self.sink(channel)?.set_speed(pitch);
        Ok(())
    }

    fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.voices
            .get(channel)
            .is_some_and(|v| !v.sink.is_paused() && !v.sink.empty())
    }
}

impl Drop for RodioAudio {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_data_is_a_decode_error() {
        let mut audio = RodioAudio::new();
        let err = audio.load_sound(b"not a sound file", SoundMode::Sample);
        assert!(matches!(err, Err(AudioError::Decode(_))));
    }

    #[test]
    fn play_before_initialize_is_an_error() {
        let mut audio = RodioAudio::new();
        let err = audio.play(SoundHandle::default(), &PlaySettings::default());
        assert!(matches!(err, Err(AudioError::NotInitialized)));
    }

    #[test]
    fn initialize_and_shutdown_when_a_device_exists() {
        let mut audio = RodioAudio::new();
        // CI machines often have no output device.
        if audio.initialize(&AudioConfig::default()).is_ok() {
            audio.shutdown();
            assert!(audio.stream.is_none());
        }
    }
}
