//! High-level clock-tracking API.
//!
//! Provides [`ClockTracker`] for continuously estimating the offset between
//! the local clock and a remote producer's clock.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::core::{ClockwaveResult, LocalClock, WaveConfig};
use crate::sync::{ClockOffset, OffsetStore, RecoveryWatcher, Scheduler};
use crate::transport::{ConnectionMonitor, ProbeSocket};

/// Continuously maintained clock-offset tracker for one remote producer.
///
/// The actual probe exchange runs in a background task; the public methods
/// only wait on its results. The first [`time_correction`](Self::time_correction)
/// call takes up to one wave to resolve, subsequent calls are instantaneous,
/// and the offset keeps being re-estimated every few seconds in the
/// background. The background task stops only when the tracker is shut down
/// or the underlying connection is permanently lost.
///
/// # Example
///
/// ```ignore
/// use clockwave::client::ClockTracker;
/// use clockwave::core::{constants, WaveConfig};
/// use clockwave::transport::ConnectionMonitor;
///
/// let monitor = ConnectionMonitor::new();
/// let tracker = ClockTracker::connect(remote_addr, WaveConfig::default(), &monitor).await?;
///
/// let offset = tracker.time_correction(constants::DEFAULT_CORRECTION_TIMEOUT).await?;
/// let local_now = tracker.local_time();
/// let remote_now = local_now + offset;
/// ```
#[derive(Debug)]
pub struct ClockTracker {
    /// Shared estimate holder; the worker publishes, we read.
    store: Arc<OffsetStore>,
    /// Clock the published offsets are relative to.
    clock: LocalClock,
    /// Signal that stops the background worker.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// The estimation worker task.
    scheduler: Option<JoinHandle<()>>,
    /// The recovery watcher task.
    watcher: Option<JoinHandle<()>>,
    /// Keeps the lifecycle channel open for the worker's whole life.
    _monitor: ConnectionMonitor,
}

impl ClockTracker {
    /// Start tracking the producer reachable at `remote`.
    ///
    /// Binds an ephemeral UDP socket, connects it to the producer's time
    /// endpoint, and spawns the estimation worker and recovery watcher.
    /// Lifecycle events from `monitor` steer both tasks.
    pub async fn connect(
        remote: SocketAddr,
        config: WaveConfig,
        monitor: &ConnectionMonitor,
    ) -> ClockwaveResult<Self> {
        // The wildcard must match the remote's address family, or connect()
        // fails with EAFNOSUPPORT.
        let wildcard: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = ProbeSocket::bind(wildcard).await?;
        socket.connect(remote).await?;

        let clock = LocalClock::new();
        let store = Arc::new(OffsetStore::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let scheduler = Scheduler::new(
            socket,
            clock,
            config,
            store.clone(),
            monitor.subscribe(),
            shutdown_rx,
        );
        let watcher = RecoveryWatcher::new(monitor.subscribe(), store.clone());

        Ok(Self {
            store,
            clock,
            shutdown_tx: Some(shutdown_tx),
            scheduler: Some(tokio::spawn(scheduler.run())),
            watcher: Some(tokio::spawn(watcher.run())),
            _monitor: monitor.clone(),
        })
    }

    /// Retrieve the estimated time-correction offset, in seconds.
    ///
    /// Adding the returned offset to a local clock reading yields the
    /// corresponding remote clock value. Waits up to `timeout` for the first
    /// estimate ([`constants::DEFAULT_CORRECTION_TIMEOUT`] is the
    /// conventional window); once an estimate exists the call returns
    /// immediately. Fails with
    /// [`ClockwaveError::Timeout`](crate::core::ClockwaveError::Timeout)
    /// only when no estimate appears within the window; the background
    /// worker keeps running regardless.
    ///
    /// [`constants::DEFAULT_CORRECTION_TIMEOUT`]: crate::core::constants::DEFAULT_CORRECTION_TIMEOUT
    pub async fn time_correction(&self, timeout: Duration) -> ClockwaveResult<f64> {
        Ok(self.store.read(timeout).await?.offset)
    }

    /// Like [`time_correction`](Self::time_correction), but also yields the
    /// remote clock reading and the uncertainty (round-trip time) of the
    /// measurement.
    pub async fn time_correction_full(&self, timeout: Duration) -> ClockwaveResult<ClockOffset> {
        self.store.read(timeout).await
    }

    /// Determine whether the remote clock was (potentially) reset since the
    /// last call.
    ///
    /// Returns `true` at most once per reset event. A reset happens when the
    /// connection recovers to a possibly different host, e.g. after the
    /// producer crashed and was restarted elsewhere; previously cached
    /// timestamps are then no longer comparable.
    pub fn was_reset(&self) -> bool {
        self.store.consume_reset_flag()
    }

    /// Current local time, in the seconds the offsets are relative to.
    pub fn local_time(&self) -> f64 {
        self.clock.now()
    }

    /// The local clock handle shared with the estimation worker.
    pub fn local_clock(&self) -> LocalClock {
        self.clock
    }

    /// Stop the background tasks and wait for them to exit.
    ///
    /// All pending probes and timers are cancelled and the socket is
    /// released before this returns.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.scheduler.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.watcher.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for ClockTracker {
    fn drop(&mut self) {
        // Stop the worker even when shutdown() was never awaited.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}
