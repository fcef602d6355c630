/// Number of recent deltas averaged together.
pub const DELTA_HISTORY: usize = 4;

/// Result of one clock tick, in counter units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClockTick {
    /// Smoothed delta for this iteration.
    pub delta: f64,

    /// Accumulated time not yet consumed by fixed steps.
    pub accumulator: f64,

    /// Whether this tick discarded accumulated time.
    pub resynced: bool,
}

/// Fixed-timestep frame clock.
///
/// Consumes samples of a monotonic counter running at `frequency` ticks per second
/// and produces a smoothed delta:
/// - anomalous samples (negative, or longer than 8 frames) are clamped
/// - samples within `frequency * 0.0002` of a common refresh interval snap to it
/// - the result is averaged over the last [`DELTA_HISTORY`] samples
///
/// When the accumulator exceeds 8 frames the clock resyncs: pending time is
/// dropped and the delta becomes exactly one frame. The first tick after
/// construction or [`reset`](Self::reset) is always a resync tick.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frequency: f64,
    frame_rate: f64,
    desired_interval: f64,
    vsync_error: f64,
    snaps: [f64; 5],
    history: [f64; DELTA_HISTORY],
    previous: u64,
    accumulator: f64,
    resync: bool,
}

impl FrameClock {
    /// Creates a clock for `frame_rate` fixed steps per second over a counter
    /// ticking `frequency` times per second.
    pub fn new(frame_rate: f64, frequency: u64) -> Self {
        debug_assert!(frame_rate > 0.0 && frequency > 0);
        let frequency = frequency as f64;
        let mut clock = Self {
            frequency,
            frame_rate,
            desired_interval: 0.0,
            vsync_error: frequency * 0.0002,
            snaps: [0.0; 5],
            history: [0.0; DELTA_HISTORY],
            previous: 0,
            accumulator: 0.0,
            resync: true,
        };
        clock.set_frame_rate(frame_rate);
        clock
    }

    /// Changes the fixed step rate. The next tick resyncs.
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        debug_assert!(frame_rate > 0.0);
        self.frame_rate = frame_rate;
        self.desired_interval = self.frequency / frame_rate;

        let t60 = self.frequency / 60.0;
        self.snaps = [t60, t60 * 2.0, t60 * 3.0, t60 * 4.0, (t60 + 1.0) / 2.0];

        self.history = [self.desired_interval; DELTA_HISTORY];
        self.accumulator = 0.0;
        self.resync = true;
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Counter ticks per fixed step.
    pub fn desired_interval(&self) -> f64 {
        self.desired_interval
    }

    /// Fixed step in seconds.
    pub fn fixed_delta(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Rebases the clock on `counter` and drops pending time.
    pub fn reset(&mut self, counter: u64) {
        self.previous = counter;
        self.accumulator = 0.0;
        self.resync = true;
    }

    /// Advances the clock with a new counter sample.
    pub fn tick(&mut self, counter: u64) -> ClockTick {
        let mut raw = counter as f64 - self.previous as f64;
        self.previous = counter;

        if raw > self.desired_interval * 8.0 {
            raw = self.desired_interval;
        }
        if raw < 0.0 {
            raw = 0.0;
        }

        if let Some(snap) = self
            .snaps
            .iter()
            .copied()
            .find(|s| (raw - s).abs() < self.vsync_error)
        {
            raw = snap;
        }

        self.history.rotate_left(1);
        self.history[DELTA_HISTORY - 1] = raw;
        let mut delta = self.history.iter().sum::<f64>() / DELTA_HISTORY as f64;

        self.accumulator += delta;

        if self.accumulator > self.desired_interval * 8.0 {
            self.resync = true;
        }

        let resynced = self.resync;
        if resynced {
            self.accumulator = 0.0;
            delta = self.desired_interval;
            self.resync = false;
        }

        ClockTick { delta, accumulator: self.accumulator, resynced }
    }

    /// Removes `amount` counter ticks from the accumulator, never below zero.
    pub fn consume(&mut self, amount: f64) {
        self.accumulator = (self.accumulator - amount).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREQ: u64 = 1_000_000;

    /// Clock rebased at 0 with a steady history and no pending resync.
    fn primed(frame_rate: f64) -> FrameClock {
        let mut c = FrameClock::new(frame_rate, FREQ);
        c.reset(0);
        c.resync = false;
        c
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn first_tick_resyncs() {
        let mut c = FrameClock::new(60.0, FREQ);
        c.reset(1000);
        let t = c.tick(1000 + 20_000);
        assert!(t.resynced);
        assert_eq!(t.delta, c.desired_interval());
        assert_eq!(t.accumulator, 0.0);
    }

    #[test]
    fn derived_values() {
        let c = FrameClock::new(50.0, FREQ);
        assert_eq!(c.desired_interval(), 20_000.0);
        assert_eq!(c.fixed_delta(), 0.02);
    }

    // ── clamping ──────────────────────────────────────────────────────────

    #[test]
    fn negative_delta_clamps_to_zero() {
        let mut c = primed(60.0);
        c.previous = 10_000;
        let t = c.tick(5_000);
        assert_eq!(c.history[DELTA_HISTORY - 1], 0.0);
        assert!(t.delta < c.desired_interval());
    }

    #[test]
    fn huge_delta_clamps_to_desired() {
        let mut c = primed(60.0);
        c.tick(10 * FREQ);
        assert_eq!(c.history[DELTA_HISTORY - 1], c.desired_interval());
    }

    // ── snapping ──────────────────────────────────────────────────────────

    #[test]
    fn near_refresh_interval_snaps_exactly() {
        let mut c = primed(60.0);
        let t60 = FREQ as f64 / 60.0;
        // within the 200-tick tolerance of a 60 Hz frame
        c.tick((t60 + 150.0) as u64);
        assert_eq!(c.history[DELTA_HISTORY - 1], t60);
    }

    #[test]
    fn snaps_to_30hz() {
        let mut c = primed(60.0);
        let t30 = FREQ as f64 / 30.0;
        c.tick((t30 - 100.0) as u64);
        assert_eq!(c.history[DELTA_HISTORY - 1], t30);
    }

    #[test]
    fn outside_tolerance_does_not_snap() {
        let mut c = primed(60.0);
        c.tick(17_000);
        assert_eq!(c.history[DELTA_HISTORY - 1], 17_000.0);
    }

    // ── averaging ─────────────────────────────────────────────────────────

    #[test]
    fn delta_is_mean_of_history() {
        let mut c = primed(60.0);
        let d = c.desired_interval();
        let t = c.tick(10_000);
        assert!((t.delta - (3.0 * d + 10_000.0) / 4.0).abs() < 1e-9);
        assert!((t.accumulator - t.delta).abs() < 1e-9);
    }

    #[test]
    fn four_distinct_deltas_average() {
        let mut c = primed(60.0);
        let d = c.desired_interval();
        let raws = [12_000.0, 14_000.0, 20_000.0, 22_000.0];

        let mut now = 0.0;
        let mut accumulated = 0.0;
        for (i, raw) in raws.iter().enumerate() {
            now += raw;
            let t = c.tick(now as u64);
            let seen: f64 = raws[..=i].iter().sum();
            let expected = (seen + d * (3 - i) as f64) / 4.0;
            assert!((t.delta - expected).abs() < 1e-9, "tick {i}: {} != {expected}", t.delta);
            accumulated += expected;
            assert!((t.accumulator - accumulated).abs() < 1e-6);
        }
        assert_eq!(c.history, raws);
        assert!((c.tick(now as u64 + 16_000).delta - (14_000.0 + 20_000.0 + 22_000.0 + 16_000.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn steady_input_converges() {
        let mut c = primed(100.0);
        let mut now = 0;
        let mut last = None;
        for _ in 0..6 {
            now += 10_000;
            last = Some(c.tick(now));
        }
        assert_eq!(last.map(|t| t.delta), Some(10_000.0));
    }

    // ── spiral of death ───────────────────────────────────────────────────

    #[test]
    fn accumulator_overflow_resyncs() {
        let mut c = primed(100.0);
        let mut now = 0;
        let mut resynced = false;
        // 7-frame stalls are not clamped but overflow the 8-frame budget quickly.
        for _ in 0..4 {
            now += 70_000;
            let t = c.tick(now);
            if t.resynced {
                resynced = true;
                assert_eq!(t.accumulator, 0.0);
                assert_eq!(t.delta, c.desired_interval());
            }
        }
        assert!(resynced);
    }

    #[test]
    fn consume_never_goes_negative() {
        let mut c = primed(60.0);
        c.tick(16_666);
        c.consume(1e9);
        assert_eq!(c.accumulator(), 0.0);
    }

    #[test]
    fn set_frame_rate_forces_resync() {
        let mut c = primed(60.0);
        c.tick(16_666);
        c.set_frame_rate(30.0);
        assert_eq!(c.history, [FREQ as f64 / 30.0; DELTA_HISTORY]);
        let t = c.tick(16_666 + 33_333);
        assert!(t.resynced);
        assert_eq!(t.delta, FREQ as f64 / 30.0);
    }
}
