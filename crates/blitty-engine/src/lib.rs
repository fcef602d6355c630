//! BLITTY engine crate.
//!
//! A small 2D game engine: a desktop platform layer, a fixed-timestep game
//! loop, and a deferred renderer with a batching 2D canvas on top of `wgpu`.
//!
//! Applications implement [`core::Scene`] and hand it to [`core::Game::run`].

pub mod audio;
pub mod content;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod platform;
pub mod render;
pub mod time;
