//! Platform layer: window, event pump and monotonic counter.
//!
//! The game loop only sees the [`Platform`] trait. [`WinitPlatform`] is the
//! desktop implementation.

mod desktop;

#[cfg(test)]
pub(crate) mod scripted;

use std::time::Duration;

use crate::input::InputEvent;

pub use desktop::WinitPlatform;

/// Event produced by [`Platform::process_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Quit,
    /// New backbuffer size in physical pixels.
    Resized { width: u32, height: u32 },
    Minimized,
    Restored,
    Focused(bool),
    Input(InputEvent),
}

pub trait Platform {
    /// Current value of the monotonic counter.
    fn performance_counter(&self) -> u64;

    /// Counter ticks per second.
    fn performance_frequency(&self) -> u64;

    /// Pumps pending OS events without blocking and appends them to `events`.
    fn process_events(&mut self, events: &mut Vec<PlatformEvent>);

    fn show_window(&mut self, visible: bool);

    /// Drawable size in physical pixels.
    fn window_size(&self) -> (u32, u32);

    fn set_title(&mut self, title: &str);

    /// Cooperative yield used while the window is inactive.
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn shutdown(&mut self);
}
