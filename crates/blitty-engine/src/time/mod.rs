//! Frame timing.
//!
//! [`FrameClock`] turns samples of a monotonic platform counter into a smoothed,
//! snapped delta and a fixed-step accumulator. It never reads the wall clock
//! itself, so it is fully deterministic under test.

mod frame_clock;

pub use frame_clock::{ClockTick, DELTA_HISTORY, FrameClock};
