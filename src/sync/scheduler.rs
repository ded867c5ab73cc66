//! Background estimation scheduler.
//!
//! A single cooperative task that owns the probe socket and three
//! independent timers: the next-wave timer, the intra-wave probe pacing
//! timer, and the per-wave aggregation deadline. It suspends only while
//! waiting for I/O or timer readiness.
//!
//! Per-packet loss, undecodable datagrams, stale replies, and recoverable
//! socket errors are all absorbed: the current wave simply runs to its
//! deadline as if those packets were lost. The loop terminates only on the
//! owner's shutdown signal or when the connection layer reports permanent
//! loss.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::time::{self, Instant};

use crate::core::{LocalClock, WaveConfig};
use crate::sync::store::OffsetStore;
use crate::sync::wave::Wave;
use crate::transport::{ConnectionEvent, ProbeSocket, TimeProbe, TimeReply};

/// The background estimation worker.
///
/// Owns all wave-local state; nothing here is shared with foreground
/// callers except the [`OffsetStore`].
#[derive(Debug)]
pub struct Scheduler {
    socket: ProbeSocket,
    clock: LocalClock,
    config: WaveConfig,
    store: Arc<OffsetStore>,
    wave: Wave,
    events: broadcast::Receiver<ConnectionEvent>,
    shutdown: oneshot::Receiver<()>,
}

impl Scheduler {
    /// Create a scheduler over a socket already connected to the remote
    /// time endpoint.
    pub fn new(
        socket: ProbeSocket,
        clock: LocalClock,
        config: WaveConfig,
        store: Arc<OffsetStore>,
        events: broadcast::Receiver<ConnectionEvent>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            socket,
            clock,
            config,
            store,
            wave: Wave::new(),
            events,
            shutdown,
        }
    }

    /// Drive periodic estimation waves until shutdown or permanent
    /// connection loss.
    ///
    /// Dropping the returned future (or returning from it) releases the
    /// socket and cancels all pending timers; no network activity survives
    /// the loop.
    pub async fn run(self) {
        let Self {
            mut socket,
            clock,
            config,
            store,
            mut wave,
            mut events,
            mut shutdown,
        } = self;

        // The three wave timers. The first wave starts immediately; the
        // probe and aggregation timers only matter while a wave is open.
        let mut next_wave = Box::pin(time::sleep(Duration::ZERO));
        let mut next_probe = Box::pin(time::sleep(Duration::ZERO));
        let mut aggregate = Box::pin(time::sleep(Duration::ZERO));
        let mut wave_open = false;
        let mut sent: u32 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("shutdown requested, stopping estimation");
                    break;
                }

                event = events.recv() => match event {
                    Ok(ConnectionEvent::Lost) => {
                        tracing::warn!("connection permanently lost, stopping estimation");
                        break;
                    }
                    Ok(ConnectionEvent::Recovered { remote }) => {
                        // The producer may live on a different host now;
                        // redirect future probes there. The open wave runs
                        // to its deadline either way.
                        if let Err(err) = socket.connect(remote).await {
                            tracing::warn!(%err, %remote, "re-connect after recovery failed");
                        } else {
                            tracing::debug!(%remote, "probe socket re-connected after recovery");
                        }
                    }
                    Ok(ConnectionEvent::Connected) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "lagged behind connection events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // No lifecycle signal can ever arrive again; do not
                        // keep probing unsupervised.
                        tracing::warn!("connection monitor dropped, stopping estimation");
                        break;
                    }
                },

                _ = &mut next_wave, if !wave_open => {
                    let id = wave.begin();
                    wave_open = true;
                    sent = 0;
                    let now = Instant::now();
                    next_probe.as_mut().reset(now);
                    aggregate.as_mut().reset(now + config.aggregation_deadline());
                    next_wave.as_mut().reset(now + config.wave_interval);
                    tracing::debug!(wave = id, "starting estimation wave");
                }

                _ = &mut next_probe, if wave_open && sent < config.probes_per_wave => {
                    let probe = TimeProbe {
                        wave_id: wave.id(),
                        seq: sent,
                        sent_at: clock.now(),
                    };
                    // A failed send is indistinguishable from a lost packet.
                    if let Err(err) = socket.send(&probe.to_bytes()).await {
                        tracing::debug!(%err, seq = probe.seq, "probe send failed");
                    }
                    sent += 1;
                    next_probe.as_mut().reset(Instant::now() + config.probe_interval);
                }

                _ = &mut aggregate, if wave_open => {
                    wave_open = false;
                    match wave.aggregate() {
                        Some(estimate) => {
                            tracing::debug!(
                                wave = wave.id(),
                                replies = wave.len(),
                                offset = estimate.offset,
                                uncertainty = estimate.uncertainty,
                                "publishing offset estimate"
                            );
                            store.publish(estimate);
                        }
                        // Total loss: keep the previous estimate and let the
                        // next wave try again.
                        None => tracing::debug!(wave = wave.id(), "wave yielded no estimates"),
                    }
                }

                received = socket.recv() => match received {
                    Ok(datagram) => {
                        let recv_time = clock.now();
                        if !wave_open {
                            // The wave already closed; late replies are stale.
                            continue;
                        }
                        match TimeReply::from_bytes(datagram) {
                            Ok(reply) => {
                                if !wave.record_reply(&reply, recv_time) {
                                    tracing::trace!(
                                        got = reply.wave_id,
                                        current = wave.id(),
                                        "discarding stale-wave reply"
                                    );
                                }
                            }
                            Err(err) => tracing::debug!(%err, "undecodable time datagram"),
                        }
                    }
                    Err(err) => {
                        // Recoverable socket errors count as packet loss.
                        tracing::debug!(%err, "socket receive error");
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::net::UdpSocket;

    use crate::sync::store::ClockOffset;
    use crate::transport::ConnectionMonitor;

    /// Spawn a producer stand-in that answers probes with its own clock
    /// shifted by `shift` seconds. Returns its address.
    async fn spawn_responder(shift: f64) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let clock = LocalClock::new();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                if let Ok(probe) = TimeProbe::from_bytes(&buf[..len]) {
                    let reply = probe.reply(clock.now() + shift);
                    let _ = socket.send_to(&reply.to_bytes(), peer).await;
                }
            }
        });
        addr
    }

    fn fast_config() -> WaveConfig {
        WaveConfig::default()
            .probes_per_wave(4)
            .probe_interval(Duration::from_millis(5))
            .probe_max_rtt(Duration::from_millis(100))
            .wave_interval(Duration::from_millis(200))
    }

    async fn spawn_scheduler(
        remote: SocketAddr,
        config: WaveConfig,
        store: Arc<OffsetStore>,
        monitor: &ConnectionMonitor,
    ) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let socket = ProbeSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        socket.connect(remote).await.unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let scheduler = Scheduler::new(
            socket,
            LocalClock::new(),
            config,
            store,
            monitor.subscribe(),
            shutdown_rx,
        );
        (shutdown_tx, tokio::spawn(scheduler.run()))
    }

    #[tokio::test]
    async fn test_scheduler_publishes_offset() {
        let remote = spawn_responder(5.0).await;
        let store = Arc::new(OffsetStore::new());
        let monitor = ConnectionMonitor::new();
        let (shutdown, handle) =
            spawn_scheduler(remote, fast_config(), store.clone(), &monitor).await;

        let estimate = store.read(Duration::from_secs(5)).await.unwrap();
        // Loopback round trips are well under the 0.5s tolerance.
        assert!((estimate.offset - 5.0).abs() < 0.5);
        assert!(estimate.uncertainty >= 0.0);

        let _ = shutdown.send(());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_total_loss_keeps_previous_value() {
        // A bound socket that never answers: every wave is a total loss.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let remote = silent.local_addr().unwrap();

        let store = Arc::new(OffsetStore::new());
        let previous = ClockOffset {
            offset: 3.5,
            remote_time: 100.0,
            uncertainty: 0.01,
        };
        store.publish(previous);

        let monitor = ConnectionMonitor::new();
        let config = fast_config().wave_interval(Duration::from_millis(50));
        let (shutdown, handle) = spawn_scheduler(remote, config, store.clone(), &monitor).await;

        // Let several empty waves complete.
        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.read(Duration::ZERO).await.unwrap(), previous);

        let _ = shutdown.send(());
        handle.await.unwrap();
        drop(silent);
    }

    /// Spawn a producer stand-in that holds every reply back by `delay`
    /// before sending it.
    async fn spawn_delayed_responder(delay: Duration) -> SocketAddr {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let clock = LocalClock::new();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                if let Ok(probe) = TimeProbe::from_bytes(&buf[..len]) {
                    let socket = socket.clone();
                    tokio::spawn(async move {
                        time::sleep(delay).await;
                        let reply = probe.reply(clock.now());
                        let _ = socket.send_to(&reply.to_bytes(), peer).await;
                    });
                }
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_replies_after_deadline_are_discarded() {
        // Deadline is 2 * 5ms + 40ms = 50ms; every reply arrives well after
        // it, and the next wave is too far out to pick them up either.
        let config = WaveConfig::default()
            .probes_per_wave(2)
            .probe_interval(Duration::from_millis(5))
            .probe_max_rtt(Duration::from_millis(40))
            .wave_interval(Duration::from_secs(30));
        let remote = spawn_delayed_responder(Duration::from_millis(200)).await;

        let store = Arc::new(OffsetStore::new());
        let monitor = ConnectionMonitor::new();
        let (shutdown, handle) = spawn_scheduler(remote, config, store.clone(), &monitor).await;

        // Wait until the delayed replies have come and gone.
        time::sleep(Duration::from_millis(500)).await;
        assert!(!store.has_value());

        let _ = shutdown.send(());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_never_answered_store_stays_empty() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let remote = silent.local_addr().unwrap();

        let store = Arc::new(OffsetStore::new());
        let monitor = ConnectionMonitor::new();
        let (shutdown, handle) =
            spawn_scheduler(remote, fast_config(), store.clone(), &monitor).await;

        time::sleep(Duration::from_millis(300)).await;
        assert!(!store.has_value());

        let _ = shutdown.send(());
        handle.await.unwrap();
        drop(silent);
    }

    #[tokio::test]
    async fn test_lost_event_terminates_loop() {
        let remote = spawn_responder(0.0).await;
        let store = Arc::new(OffsetStore::new());
        let monitor = ConnectionMonitor::new();
        let (_shutdown, handle) =
            spawn_scheduler(remote, fast_config(), store, &monitor).await;

        monitor.lost();
        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop on permanent loss")
            .unwrap();
    }
}
