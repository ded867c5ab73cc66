//! Offset invalidation on connection recovery.
//!
//! When the external connection layer recovers the stream, the producer may
//! be a different process on a different host with an unrelated clock. The
//! watcher invalidates the store so the next read blocks until a fresh wave
//! completes, and raises the reset flag so callers know cached timestamps
//! may no longer be comparable.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::sync::store::OffsetStore;
use crate::transport::ConnectionEvent;

/// Task that mirrors connection recoveries into the offset store.
#[derive(Debug)]
pub struct RecoveryWatcher {
    events: broadcast::Receiver<ConnectionEvent>,
    store: Arc<OffsetStore>,
}

impl RecoveryWatcher {
    /// Create a watcher over a lifecycle subscription.
    pub fn new(events: broadcast::Receiver<ConnectionEvent>, store: Arc<OffsetStore>) -> Self {
        Self { events, store }
    }

    /// Consume lifecycle events until the connection ends.
    pub async fn run(mut self) {
        loop {
            match self.events.recv().await {
                Ok(ConnectionEvent::Recovered { remote }) => {
                    tracing::debug!(%remote, "connection recovered, invalidating offset");
                    self.store.invalidate();
                }
                Ok(ConnectionEvent::Connected) => {}
                Ok(ConnectionEvent::Lost) | Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "lagged behind connection events");
                }
            }
        }
    }
}
