use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use super::types::{InputEvent, Key, Modifiers, MouseButton};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum Control {
    Key(Key),
    Button(MouseButton),
}

/// Keyboard and mouse state.
///
/// Key and button transitions are queued as they arrive and handed out by
/// [`begin_update`](Self::begin_update). Each update receives at most one press
/// and one release per control, so a transition is reported to exactly one
/// update even when several arrive between updates or several updates run
/// between event pumps. Mouse position and modifiers apply immediately.
#[derive(Debug, Default)]
pub struct Input {
    modifiers: Modifiers,
    mouse_position: Vec2,
    wheel: Vec2,
    pending_wheel: Vec2,

    pending: VecDeque<(Control, bool)>,
    down: HashSet<Control>,
    pressed: HashSet<Control>,
    released: HashSet<Control>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the next batch of queued transitions. Called before each update.
    pub fn begin_update(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.wheel = std::mem::take(&mut self.pending_wheel);

        while let Some(&(control, press)) = self.pending.front() {
            let changes = self.down.contains(&control) != press;
            if changes {
                let edges = if press { &self.pressed } else { &self.released };
                if edges.contains(&control) {
                    break;
                }
                if press {
                    self.down.insert(control);
                    self.pressed.insert(control);
                } else {
                    self.down.remove(&control);
                    self.released.insert(control);
                }
            }
            self.pending.pop_front();
        }
    }

    /// Transitions not yet handed to an update.
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    pub fn apply_event(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::Key { key, pressed, .. } => self.pending.push_back((Control::Key(key), pressed)),
            InputEvent::MouseButton { button, pressed } => {
                self.pending.push_back((Control::Button(button), pressed))
            }
            InputEvent::MouseMoved { x, y } => self.mouse_position = Vec2::new(x, y),
            InputEvent::MouseWheel { dx, dy } => self.pending_wheel += Vec2::new(dx, dy),
            InputEvent::ModifiersChanged(m) => self.modifiers = m,
        }
    }

    /// Queues a release for everything held or about to be held, e.g. on focus loss.
    pub fn release_all(&mut self) {
        let mut held = self.down.clone();
        for &(control, press) in &self.pending {
            if press {
                held.insert(control);
            } else {
                held.remove(&control);
            }
        }
        self.pending.extend(held.into_iter().map(|c| (c, false)));
        self.modifiers = Modifiers::empty();
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.down.contains(&Control::Key(key))
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&Control::Key(key))
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.released.contains(&Control::Key(key))
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.down.contains(&Control::Button(button))
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(&Control::Button(button))
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.released.contains(&Control::Button(button))
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Wheel movement handed to the current update.
    pub fn wheel_delta(&self) -> Vec2 {
        self.wheel
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}
