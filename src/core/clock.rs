//! Local monotonic clock.
//!
//! All protocol timestamps are floating-point seconds read from a
//! [`LocalClock`]. The clock is a cheap `Copy` handle over a fixed origin
//! instant, so the worker task and foreground callers share the same time
//! base without coordination.

use std::time::Instant;

/// Monotonic clock reporting seconds since its creation.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    /// Origin instant; all readings are relative to this.
    origin: Instant,
}

impl LocalClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock's origin.
    ///
    /// Monotonic and non-decreasing across all copies of the same clock.
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}
