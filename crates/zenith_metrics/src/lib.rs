//! Zenith Metrics - frame and system instrumentation
//!
//! Everything in this crate is real only when the `metrics` feature is on.
//! Without it the same types exist as empty stubs so callers never need
//! their own `cfg` guards.
//!
//! # Usage
//!
//! ```ignore
//! use zenith_metrics::{FrameTimer, SystemProfiler};
//!
//! let mut timer = FrameTimer::new(120);
//! let mut profiler = SystemProfiler::new();
//!
//! timer.begin();
//! profiler.time_system("velocity", || step_velocity());
//! timer.end();
//!
//! tracing::info!(fps = timer.fps(), velocity_ms = ?profiler.last("velocity"));
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::{SystemProfiler, SystemTiming};

/// Whether instrumentation is compiled in.
pub const ENABLED: bool = cfg!(feature = "metrics");

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
mod stubs {
    use std::time::Duration;

    #[derive(Debug, Default)]
    pub struct FrameTimer;

    impl FrameTimer {
        pub fn new(_capacity: usize) -> Self { Self }
        pub fn begin(&mut self) {}
        pub fn end(&mut self) {}
        pub fn frames(&self) -> u64 { 0 }
        pub fn fps(&self) -> f64 { 0.0 }
        pub fn frame_time_ms(&self) -> f64 { 0.0 }
        pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
    }

    #[derive(Debug)]
    pub struct RingBuffer<T>(std::marker::PhantomData<T>);

    impl<T> RingBuffer<T> {
        pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
        pub fn push(&mut self, _value: T) {}
        pub fn len(&self) -> usize { 0 }
        pub fn is_empty(&self) -> bool { true }
    }

    #[derive(Debug, Default)]
    pub struct Counter;

    impl Counter {
        pub fn new() -> Self { Self }
        pub fn increment(&mut self, _name: &str, _value: usize) {}
        pub fn set(&mut self, _name: &str, _value: usize) {}
        pub fn get(&self, _name: &str) -> usize { 0 }
        pub fn reset_all(&mut self) {}
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SystemTiming {
        pub total: Duration,
        pub last: Duration,
        pub calls: u64,
    }

    #[derive(Debug, Default)]
    pub struct SystemProfiler;

    impl SystemProfiler {
        pub fn new() -> Self { Self }
        pub fn time_system<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
        pub fn timing(&self, _name: &str) -> SystemTiming { SystemTiming::default() }
        pub fn last(&self, _name: &str) -> Duration { Duration::ZERO }
        pub fn forget(&mut self, _name: &str) {}
        pub fn reset(&mut self) {}
    }
}

#[cfg(not(feature = "metrics"))]
pub use stubs::{Counter, FrameTimer, RingBuffer, SystemProfiler, SystemTiming};
