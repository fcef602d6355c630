use std::f32::consts::TAU;

use anyhow::Result;
use blitty_engine::audio::{ChannelHandle, Sound};
use blitty_engine::core::{Context, Scene};
use blitty_engine::input::Key;
use blitty_engine::paint::Color;
use blitty_engine::render::RenderView;

const SAMPLE_RATE: u32 = 22_050;

/// Looping music plus a blip on Space.
///
/// `P` pauses the music, Up/Down change its volume. The background flashes on
/// every blip. Without an audio device the scene runs silently.
#[derive(Default)]
pub struct AudioScene {
    blip: Option<Sound>,
    music: Option<ChannelHandle>,
    view: Option<RenderView>,
    flash: f32,
}

impl Scene for AudioScene {
    fn load(&mut self, ctx: &mut Context) -> Result<()> {
        self.view = Some(ctx.graphics.create_default_view().with_clear_color(Color::BLACK));

        let audio = &mut ctx.audio;
        if !audio.is_initialized() {
            log::warn!("audio is disabled; the audio demo will be silent");
            return Ok(());
        }

        let music = audio
            .load_streamed_sound(&tone_wav(220.0, 2.0, 0.2))?
            .with_looping(true)
            .with_volume(0.5);
        self.music = Some(audio.play(&music)?);
        self.blip = Some(audio.load_sound(&tone_wav(880.0, 0.08, 0.6))?);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, dt: f32) -> Result<()> {
        self.flash = (self.flash - dt * 4.0).max(0.0);

        if ctx.input.key_pressed(Key::Escape) {
            ctx.exit();
        }
        if ctx.input.key_pressed(Key::Space) {
            if let Some(blip) = &self.blip {
                ctx.audio.play(blip)?;
            }
            self.flash = 1.0;
        }

        let Some(music) = self.music else {
            return Ok(());
        };
        if ctx.input.key_pressed(Key::P) {
            let paused = ctx.audio.is_paused(music)?;
            ctx.audio.set_paused(music, !paused)?;
        }
        let step = if ctx.input.key_pressed(Key::Up) {
            0.1
        } else if ctx.input.key_pressed(Key::Down) {
            -0.1
        } else {
            0.0
        };
        if step != 0.0 {
            let volume = (ctx.audio.volume(music)? + step).clamp(0.0, 1.0);
            ctx.audio.set_volume(music, volume)?;
            log::info!("music volume {volume:.1}");
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> Result<()> {
        let Some(view) = self.view.as_mut() else {
            return Ok(());
        };
        let f = self.flash;
        view.clear_color = Color::from_f32(0.1 + 0.5 * f, 0.1 + 0.3 * f, 0.2, 1.0);
        ctx.graphics.apply_render_view(view);
        Ok(())
    }

    fn unload(&mut self, ctx: &mut Context) -> Result<()> {
        ctx.audio.stop_all();
        if let Some(blip) = self.blip.take() {
            ctx.audio.release_sound(&blip);
        }
        Ok(())
    }
}

/// Mono 16-bit PCM WAV of a sine tone with a short fade at both ends.
fn tone_wav(frequency: f32, seconds: f32, amplitude: f32) -> Vec<u8> {
    let count = (SAMPLE_RATE as f32 * seconds) as usize;
    let fade = (SAMPLE_RATE / 200) as usize;
    let samples = (0..count).map(|i| {
        let t = i as f32 / SAMPLE_RATE as f32;
        let edge = i.min(count - 1 - i).min(fade) as f32 / fade as f32;
        let v = (TAU * frequency * t).sin() * amplitude * edge;
        (v * i16::MAX as f32) as i16
    });

    let data_len = (count * 2) as u32;
    let mut wav = Vec::with_capacity(44 + count * 2);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_wav_header_matches_payload() {
        let wav = tone_wav(440.0, 0.5, 0.5);
        let count = SAMPLE_RATE as usize / 2;

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(wav.len(), 44 + count * 2);
        let riff_len = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]) as usize;
        assert_eq!(riff_len, wav.len() - 8);
        // Faded in from silence.
        assert_eq!(&wav[44..46], &[0, 0]);
    }
}
