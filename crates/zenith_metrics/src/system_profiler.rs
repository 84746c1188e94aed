//! Per-system update timing

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated timing for one system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemTiming {
    pub total: Duration,
    pub last: Duration,
    pub calls: u64,
}

impl SystemTiming {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        self.total / self.calls as u32
    }
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: HashMap<String, SystemTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = match self.timings.get_mut(name) {
            Some(timing) => timing,
            None => self.timings.entry(name.to_string()).or_default(),
        };
        timing.total += elapsed;
        timing.last = elapsed;
        timing.calls += 1;
        result
    }

    pub fn timing(&self, name: &str) -> SystemTiming {
        self.timings.get(name).copied().unwrap_or_default()
    }

    pub fn last(&self, name: &str) -> Duration {
        self.timing(name).last
    }

    /// Drop the history of a system that was deactivated.
    pub fn forget(&mut self, name: &str) {
        self.timings.remove(name);
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SystemTiming)> {
        self.timings.iter().map(|(name, timing)| (name.as_str(), timing))
    }
}
