//! Frame clock
//!
//! Hosts usually get a raw millisecond timestamp per display refresh. The
//! world wants `delta` in seconds and a monotonic `time`, so the frame driver
//! funnels timestamps through a `FrameClock`.

use std::time::Duration;

/// Default refresh rate used to synthesize timestamps in headless runs.
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Longest step handed to systems; bigger gaps (tab switch, debugger) are
/// clamped so integrators do not explode.
pub const DEFAULT_MAX_DELTA: f32 = 0.25;

/// Arguments for one `World::update` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous tick, clamped to the clock's `max_delta`.
    pub delta: f32,
    /// Milliseconds, never decreasing.
    pub time: f64,
}

#[derive(Clone, Debug)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    time: f64,
    max_delta: f32,
    frames: u64,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last_timestamp: None,
            time: 0.0,
            max_delta,
            frames: 0,
        }
    }

    /// Feed the host timestamp (milliseconds). The first tick has a zero
    /// delta; a timestamp that goes backwards is treated as no time passing.
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTick {
        let elapsed_ms = match self.last_timestamp {
            Some(last) => (timestamp_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        self.time = self.time.max(timestamp_ms);
        self.frames += 1;

        FrameTick {
            delta: ((elapsed_ms / 1000.0) as f32).min(self.max_delta),
            time: self.time,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA)
    }
}

/// Fixed step length for a refresh rate. A zero rate falls back to the
/// default rate.
pub fn fixed_step(tick_rate_hz: u32) -> Duration {
    let rate = if tick_rate_hz == 0 {
        DEFAULT_TICK_RATE_HZ
    } else {
        tick_rate_hz
    };
    Duration::from_secs_f64(1.0 / f64::from(rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_milliseconds_to_seconds() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(1000.0), FrameTick { delta: 0.0, time: 1000.0 });

        let tick = clock.tick(1016.0);
        assert!((tick.delta - 0.016).abs() < 1e-6);
        assert_eq!(tick.time, 1016.0);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn clamps_long_gaps_and_ignores_regressions() {
        let mut clock = FrameClock::new(0.1);
        clock.tick(0.0);
        assert_eq!(clock.tick(5000.0).delta, 0.1);

        let back = clock.tick(4000.0);
        assert_eq!(back.delta, 0.0);
        assert_eq!(back.time, 5000.0);
    }

    #[test]
    fn fixed_step_matches_rate() {
        assert_eq!(fixed_step(50), Duration::from_millis(20));
        assert_eq!(fixed_step(0), fixed_step(DEFAULT_TICK_RATE_HZ));
    }
}
