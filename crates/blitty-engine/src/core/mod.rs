//! Game host and scene contracts.
//!
//! [`Game`] owns the platform and the engine [`Context`], and drives a
//! [`Scene`] through the [`FixedStepScheduler`] until it exits.

mod config;
mod ctx;
mod fatal;
mod game;
mod scene;
mod scheduler;

pub use config::{
    DEFAULT_FRAME_RATE, DEFAULT_TITLE, GameConfig, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};
pub use ctx::Context;
pub use fatal::{fatal_report, report_fatal};
pub use game::Game;
pub use scene::Scene;
pub use scheduler::{FixedStepScheduler, TickStats};
