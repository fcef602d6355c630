//! Deterministic platform for loop tests.

use std::collections::VecDeque;
use std::time::Duration;

use super::{Platform, PlatformEvent};

/// Platform whose counter advances by a scripted list of deltas.
///
/// Every `performance_counter` call consumes the next delta; once the script is
/// exhausted the counter advances by `fallback_step`. Events are delivered one
/// batch per `process_events` call.
#[derive(Debug, Default)]
pub struct ScriptedPlatform {
    pub frequency: u64,
    counter: std::cell::Cell<u64>,
    deltas: std::cell::RefCell<VecDeque<u64>>,
    pub fallback_step: u64,
    pub event_batches: VecDeque<Vec<PlatformEvent>>,
    pub visible: bool,
    pub sleeps: u32,
    pub shutdowns: u32,
    pub title: String,
}

impl ScriptedPlatform {
    pub fn new(frequency: u64, deltas: impl IntoIterator<Item = u64>) -> Self {
        Self {
            frequency,
            deltas: std::cell::RefCell::new(deltas.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn push_events(&mut self, batch: Vec<PlatformEvent>) {
        self.event_batches.push_back(batch);
    }
}

impl Platform for ScriptedPlatform {
    fn performance_counter(&self) -> u64 {
        let step = self
            .deltas
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.fallback_step);
        self.counter.set(self.counter.get() + step);
        self.counter.get()
    }

    fn performance_frequency(&self) -> u64 {
        self.frequency
    }

    fn process_events(&mut self, events: &mut Vec<PlatformEvent>) {
        if let Some(batch) = self.event_batches.pop_front() {
            events.extend(batch);
        }
    }

    fn show_window(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn window_size(&self) -> (u32, u32) {
        (640, 480)
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_owned();
    }

    fn sleep(&mut self, _duration: Duration) {
        self.sleeps += 1;
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}
