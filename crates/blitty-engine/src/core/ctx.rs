use crate::audio::Audio;
use crate::input::Input;
use crate::platform::PlatformEvent;
use crate::render::Graphics;

/// Engine state handed to every [`Scene`](super::Scene) callback.
pub struct Context {
    pub graphics: Graphics,
    pub input: Input,
    pub audio: Audio,

    running: bool,
    active: bool,
}

impl Context {
    pub fn new(graphics: Graphics, audio: Audio) -> Self {
        Self {
            graphics,
            input: Input::new(),
            audio,
            running: false,
            active: true,
        }
    }

    /// Stops the game loop after the current tick.
    pub fn exit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// False while the window is minimized.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    pub fn handle_platform_event(&mut self, event: &PlatformEvent) {
        match event {
            PlatformEvent::Quit => {
                log::info!("quit requested");
                self.running = false;
            }
            PlatformEvent::Resized { width, height } => {
                if *width > 0 && *height > 0 {
                    self.graphics.set_backbuffer_size(*width, *height);
                }
            }
            PlatformEvent::Minimized => {
                log::debug!("window minimized");
                self.active = false;
            }
            PlatformEvent::Restored => {
                log::debug!("window restored");
                self.active = true;
            }
            PlatformEvent::Focused(false) => self.input.release_all(),
            PlatformEvent::Focused(true) => {}
            PlatformEvent::Input(ev) => self.input.apply_event(ev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, Key};
    use crate::render::testing::RecordingBackend;
    use crate::render::GraphicsSettings;

    fn ctx() -> Context {
        let gfx = Graphics::new(Box::new(RecordingBackend::new()), GraphicsSettings::default())
            .expect("graphics");
        Context::new(gfx, Audio::new())
    }

    #[test]
    fn quit_stops_running() {
        let mut c = ctx();
        c.start();
        c.handle_platform_event(&PlatformEvent::Quit);
        assert!(!c.is_running());
    }

    #[test]
    fn minimize_and_restore_toggle_active() {
        let mut c = ctx();
        c.handle_platform_event(&PlatformEvent::Minimized);
        assert!(!c.is_active());
        c.handle_platform_event(&PlatformEvent::Restored);
        assert!(c.is_active());
    }

    #[test]
    fn resize_updates_backbuffer_but_ignores_zero() {
        let mut c = ctx();
        c.handle_platform_event(&PlatformEvent::Resized { width: 800, height: 600 });
        assert_eq!((c.graphics.width(), c.graphics.height()), (800, 600));
        c.handle_platform_event(&PlatformEvent::Resized { width: 0, height: 600 });
        assert_eq!((c.graphics.width(), c.graphics.height()), (800, 600));
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut c = ctx();
        c.handle_platform_event(&PlatformEvent::Input(InputEvent::Key {
            key: Key::Space,
            pressed: true,
            repeat: false,
        }));
        c.input.begin_update();
        assert!(c.input.key_down(Key::Space));
        c.handle_platform_event(&PlatformEvent::Focused(false));
        c.input.begin_update();
        assert!(!c.input.key_down(Key::Space));
        assert!(c.input.key_released(Key::Space));
    }
}
