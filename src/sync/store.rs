//! Shared holder for the latest published clock offset.
//!
//! The store is the only state shared between the background estimation
//! worker and foreground callers. It is built on a `watch` channel: a single
//! producer (the worker) broadcasts the latest value, any number of readers
//! wait on it with a deadline. A separate atomic flag records clock resets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::core::ClockwaveError;

/// One published clock-offset measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    /// Estimated difference between the remote and local clocks, in seconds.
    ///
    /// `remote_time ≈ local_time + offset` at the instant of measurement.
    pub offset: f64,
    /// Remote clock reading at the instant of this measurement.
    pub remote_time: f64,
    /// Error bound of the estimate; the round-trip time of the winning probe.
    pub uncertainty: f64,
}

/// Thread-safe holder for the most recent offset estimate.
///
/// `None` is the not-yet-assigned state: no wave has published since the
/// store was created or last invalidated.
#[derive(Debug)]
pub struct OffsetStore {
    /// Latest value; the store keeps the sender alive for its whole lifetime.
    latest: watch::Sender<Option<ClockOffset>>,
    /// Set by [`invalidate`](Self::invalidate), cleared by
    /// [`consume_reset_flag`](Self::consume_reset_flag).
    reset: AtomicBool,
}

impl OffsetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            latest,
            reset: AtomicBool::new(false),
        }
    }

    /// Publish a new estimate, releasing every waiting reader.
    ///
    /// Called only from the estimation worker.
    pub fn publish(&self, estimate: ClockOffset) {
        self.latest.send_replace(Some(estimate));
    }

    /// Whether an estimate has been published since creation or the last
    /// invalidation.
    pub fn has_value(&self) -> bool {
        self.latest.borrow().is_some()
    }

    /// Read the current estimate, waiting up to `timeout` for one to appear.
    ///
    /// Returns immediately when a value already exists, regardless of the
    /// timeout (including zero). Otherwise the caller suspends until the next
    /// publish or until the deadline elapses, in which case
    /// [`ClockwaveError::Timeout`] is returned. Any number of callers may
    /// wait concurrently; one publish releases them all with the same value.
    pub async fn read(&self, timeout: Duration) -> Result<ClockOffset, ClockwaveError> {
        let mut rx = self.latest.subscribe();
        match time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            // The sender lives as long as the store, so wait_for itself can
            // only resolve with a value.
            Ok(Ok(value)) => (*value).ok_or(ClockwaveError::Timeout),
            Ok(Err(_)) => Err(ClockwaveError::Timeout),
            Err(_elapsed) => Err(ClockwaveError::Timeout),
        }
    }

    /// Drop the current value and raise the reset flag.
    ///
    /// Used on connection recovery: previously cached offsets may no longer
    /// be comparable. Readers blocked in [`read`](Self::read) stay blocked
    /// until the next publish.
    pub fn invalidate(&self) {
        self.reset.store(true, Ordering::Release);
        self.latest.send_replace(None);
    }

    /// Atomically read and clear the reset flag.
    ///
    /// Yields `true` at most once per reset event.
    pub fn consume_reset_flag(&self) -> bool {
        self.reset.swap(false, Ordering::AcqRel)
    }
}

impl Default for OffsetStore {
    fn default() -> Self {
        Self::new()
    }
}
