use bitflags::bitflags;

/// Keyboard key, identified by physical position (US layout names).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Up,
    Down,
    Left,
    Right,

    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Num0, Num1, Num2, Num3, Num4,
    Num5, Num6, Num7, Num8, Num9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Key without a dedicated variant; carries a platform code.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0x1;
        const CTRL = 0x2;
        const ALT = 0x4;
        const META = 0x8;
    }
}

/// Platform-agnostic input event, as produced by the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, pressed: bool, repeat: bool },
    MouseButton { button: MouseButton, pressed: bool },
    /// Cursor position in backbuffer pixels.
    MouseMoved { x: f32, y: f32 },
    /// Wheel movement in lines.
    MouseWheel { dx: f32, dy: f32 },
    ModifiersChanged(Modifiers),
}
