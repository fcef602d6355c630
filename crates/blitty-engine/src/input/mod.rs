//! Keyboard and mouse input.
//!
//! Platform layers translate native events into [`InputEvent`]s; the game loop
//! feeds them into [`Input`], which scenes query.

mod state;
mod types;

pub use state::Input;
pub use types::{InputEvent, Key, Modifiers, MouseButton};
