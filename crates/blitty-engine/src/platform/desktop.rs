use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

use super::{Platform, PlatformEvent};
use crate::input::{InputEvent, Key, Modifiers, MouseButton};

/// Pixel-precise wheel deltas are reported in lines of this height.
const WHEEL_LINE_PX: f32 = 20.0;

/// How many pumps to wait for the initial window before giving up.
const CREATE_PUMP_LIMIT: u32 = 1000;

/// Desktop platform backed by a pumped winit event loop.
///
/// The window is created hidden and shown by the game once the first frame has
/// been produced.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    window: Arc<Window>,
    epoch: Instant,
}

impl WinitPlatform {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let mut event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut handler = WindowHandler::new(title, width, height);

        let mut pumps = 0;
        let window = loop {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut handler)
            {
                return Err(anyhow!("event loop exited with code {code} before the window was created"));
            }
            if let Some(err) = handler.create_error.take() {
                return Err(anyhow!(err)).context("failed to create window");
            }
            if let Some(window) = handler.window.clone() {
                break window;
            }
            pumps += 1;
            if pumps >= CREATE_PUMP_LIMIT {
                return Err(anyhow!("window was not created after {pumps} event pumps"));
            }
            std::thread::sleep(Duration::from_millis(1));
        };

        // Events seen while waiting for the window are not interesting to the game.
        handler.pending.clear();

        let size = window.inner_size();
        log::info!("window created: {}x{} ({title})", size.width, size.height);

        Ok(Self {
            event_loop,
            handler,
            window,
            epoch: Instant::now(),
        })
    }

    /// Shared handle for surface creation.
    pub fn window(&self) -> Arc<Window> {
        self.window.clone()
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }
}

impl Platform for WinitPlatform {
    fn performance_counter(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn performance_frequency(&self) -> u64 {
        1_000_000_000
    }

    fn process_events(&mut self, events: &mut Vec<PlatformEvent>) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);

        events.append(&mut self.handler.pending);

        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited ({code})");
            events.push(PlatformEvent::Quit);
        }
    }

    fn show_window(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }

    fn window_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn shutdown(&mut self) {
        self.window.set_visible(false);
        log::info!("platform shutdown");
    }
}

struct WindowHandler {
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    create_error: Option<String>,
    pending: Vec<PlatformEvent>,
    minimized: bool,
}

impl WindowHandler {
    fn new(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_string(),
            size: PhysicalSize::new(width, height),
            window: None,
            create_error: None,
            pending: Vec::new(),
            minimized: false,
        }
    }

    fn set_minimized(&mut self, minimized: bool) {
        if self.minimized == minimized {
            return;
        }
        self.minimized = minimized;
        self.pending.push(if minimized {
            PlatformEvent::Minimized
        } else {
            PlatformEvent::Restored
        });
    }
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size)
            .with_visible(false);

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.create_error = Some(e.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.pending.push(PlatformEvent::Quit);
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    self.set_minimized(true);
                } else {
                    self.set_minimized(false);
                    self.pending.push(PlatformEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
            }

            WindowEvent::Occluded(occluded) => self.set_minimized(occluded),

            WindowEvent::Focused(focused) => self.pending.push(PlatformEvent::Focused(focused)),

            other => {
                if let Some(ev) = translate_input_event(&other) {
                    self.pending.push(PlatformEvent::Input(ev));
                }
            }
        }
    }
}

fn translate_input_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::ModifiersChanged(m) => Some(InputEvent::ModifiersChanged(map_modifiers(m.state()))),

        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),

        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
            button: map_mouse_button(*button),
            pressed: *state == ElementState::Pressed,
        }),

        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => {
                    (p.x as f32 / WHEEL_LINE_PX, p.y as f32 / WHEEL_LINE_PX)
                }
            };
            Some(InputEvent::MouseWheel { dx, dy })
        }

        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: map_key(event.physical_key),
            pressed: event.state == ElementState::Pressed,
            repeat: event.repeat,
        }),

        _ => None,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::SHIFT, m.shift_key());
    out.set(Modifiers::CTRL, m.control_key());
    out.set(Modifiers::ALT, m.alt_key());
    out.set(Modifiers::META, m.super_key());
    out
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,

        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::ShiftRight => Key::RightShift,
        KeyCode::ControlLeft => Key::LeftCtrl,
        KeyCode::ControlRight => Key::RightCtrl,
        KeyCode::AltLeft => Key::LeftAlt,
        KeyCode::AltRight => Key::RightAlt,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Num0,
        KeyCode::Digit1 => Key::Num1,
        KeyCode::Digit2 => Key::Num2,
        KeyCode::Digit3 => Key::Num3,
        KeyCode::Digit4 => Key::Num4,
        KeyCode::Digit5 => Key::Num5,
        KeyCode::Digit6 => Key::Num6,
        KeyCode::Digit7 => Key::Num7,
        KeyCode::Digit8 => Key::Num8,
        KeyCode::Digit9 => Key::Num9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}
