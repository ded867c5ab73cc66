//! Connection lifecycle notifications.
//!
//! The estimation core never manages the underlying connection itself; the
//! embedding connection layer owns setup, retry, and host discovery, and
//! reports lifecycle transitions through a [`ConnectionMonitor`]. The worker
//! and the recovery watcher each hold a subscription.

use std::net::SocketAddr;

use tokio::sync::broadcast;

/// Number of lifecycle events buffered per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Lifecycle events reported by the external connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection is established.
    Connected,
    /// The connection recovered, possibly to a different remote host.
    ///
    /// Cached offsets are no longer comparable after this event.
    Recovered {
        /// Time endpoint of the (possibly new) remote host.
        remote: SocketAddr,
    },
    /// The connection is permanently lost; no recovery will follow.
    Lost,
}

/// Broadcast handle through which the connection layer reports events.
///
/// Cloning is cheap; all clones feed the same subscribers.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl ConnectionMonitor {
    /// Create a monitor with no subscribers yet.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }

    /// Report that the connection is established.
    pub fn connected(&self) {
        let _ = self.tx.send(ConnectionEvent::Connected);
    }

    /// Report that the connection recovered, bound to `remote`.
    pub fn recovered(&self, remote: SocketAddr) {
        let _ = self.tx.send(ConnectionEvent::Recovered { remote });
    }

    /// Report that the connection is permanently lost.
    pub fn lost(&self) {
        let _ = self.tx.send(ConnectionEvent::Lost);
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_all_subscribers() {
        let monitor = ConnectionMonitor::new();
        let mut a = monitor.subscribe();
        let mut b = monitor.subscribe();

        let remote: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        monitor.recovered(remote);

        assert_eq!(a.recv().await.unwrap(), ConnectionEvent::Recovered { remote });
        assert_eq!(b.recv().await.unwrap(), ConnectionEvent::Recovered { remote });
    }

    #[test]
    fn test_send_without_subscribers_is_ok() {
        let monitor = ConnectionMonitor::new();
        monitor.connected();
        monitor.lost();
    }
}
