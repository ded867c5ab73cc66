//! Per-wave estimate collection and aggregation.
//!
//! A wave is one bounded round of probe/reply exchanges, identified by a
//! strictly increasing id. Replies from superseded waves carry an old id and
//! are rejected here; everything else is aggregated once the wave's deadline
//! fires.

use crate::sync::store::ClockOffset;
use crate::transport::TimeReply;

/// One offset measurement derived from a probe/reply pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Estimated clock offset in seconds, assuming a symmetric path.
    pub offset: f64,
    /// Round-trip time of the pair; the error bound of `offset`.
    pub uncertainty: f64,
}

/// Local/remote timestamp pair parallel to an [`Estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSample {
    /// Local send time of the probe, in seconds.
    pub local_sent: f64,
    /// Remote clock reading reported in the reply.
    pub remote_time: f64,
}

/// Mutable state of the current estimation wave.
///
/// The estimate and sample buffers are cleared and reused from wave to wave,
/// so steady-state operation does not allocate.
#[derive(Debug, Default)]
pub struct Wave {
    /// Id of the current wave; 0 means no wave has started yet.
    id: u32,
    /// Estimates collected so far, in reply-arrival order.
    estimates: Vec<Estimate>,
    /// Timestamp pairs parallel to `estimates`.
    samples: Vec<TimedSample>,
}

impl Wave {
    /// Create an idle wave holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next wave: allocate a fresh id and clear collected data.
    ///
    /// Returns the new wave id.
    pub fn begin(&mut self) -> u32 {
        self.id = self.id.wrapping_add(1);
        self.estimates.clear();
        self.samples.clear();
        self.id
    }

    /// Id of the current wave.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of estimates collected in the current wave.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Whether the current wave has collected no estimates.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Estimates collected so far, in reply-arrival order.
    pub fn estimates(&self) -> &[Estimate] {
        &self.estimates
    }

    /// Timestamp pairs parallel to [`estimates`](Self::estimates), kept for
    /// diagnostics.
    pub fn samples(&self) -> &[TimedSample] {
        &self.samples
    }

    /// Incorporate a reply received at `recv_time` (local seconds).
    ///
    /// Replies tagged with a stale wave id are rejected and `false` is
    /// returned. Otherwise the round trip is measured against the echoed
    /// send time and the midpoint offset estimate is recorded.
    pub fn record_reply(&mut self, reply: &TimeReply, recv_time: f64) -> bool {
        if reply.wave_id != self.id {
            return false;
        }

        let round_trip = recv_time - reply.sent_at;
        self.estimates.push(Estimate {
            offset: reply.remote_time - (reply.sent_at + round_trip / 2.0),
            uncertainty: round_trip,
        });
        self.samples.push(TimedSample {
            local_sent: reply.sent_at,
            remote_time: reply.remote_time,
        });
        true
    }

    /// Aggregate the wave into a single publishable offset.
    ///
    /// Selects the estimate with the smallest round-trip time: under the
    /// symmetric-path assumption that is the one with the smallest offset
    /// error. Returns `None` for a wave with no replies.
    pub fn aggregate(&self) -> Option<ClockOffset> {
        let (index, best) = self
            .estimates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.uncertainty.total_cmp(&b.uncertainty))?;

        Some(ClockOffset {
            offset: best.offset,
            remote_time: self.samples[index].remote_time,
            uncertainty: best.uncertainty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TimeProbe;

    fn reply(wave_id: u32, seq: u32, sent_at: f64, remote_time: f64) -> TimeReply {
        TimeReply {
            wave_id,
            seq,
            sent_at,
            remote_time,
        }
    }

    #[test]
    fn test_begin_increases_id_and_clears() {
        let mut wave = Wave::new();
        let first = wave.begin();
        assert_eq!(first, 1);
        assert!(wave.record_reply(&reply(first, 0, 1.0, 100.0), 1.002));
        assert_eq!(wave.len(), 1);

        let second = wave.begin();
        assert_eq!(second, 2);
        assert!(wave.is_empty());
    }

    #[test]
    fn test_stale_wave_id_rejected() {
        let mut wave = Wave::new();
        let id = wave.begin();

        // Reply from the previous (or any other) wave must not contribute.
        assert!(!wave.record_reply(&reply(id - 1, 0, 1.0, 100.0), 1.002));
        assert!(!wave.record_reply(&reply(id + 1, 0, 1.0, 100.0), 1.002));
        assert!(wave.is_empty());
        assert!(wave.aggregate().is_none());
    }

    #[test]
    fn test_round_trip_math() {
        let mut wave = Wave::new();
        let id = wave.begin();

        // Sent at t=10, answered with remote time 510.003, received at t=10.006:
        // rtt = 6ms, offset = 510.003 - (10 + 0.003) = 500.0
        assert!(wave.record_reply(&reply(id, 0, 10.0, 510.003), 10.006));
        let result = wave.aggregate().unwrap();
        assert!((result.offset - 500.0).abs() < 1e-9);
        assert!((result.uncertainty - 0.006).abs() < 1e-9);
        assert_eq!(result.remote_time, 510.003);
    }

    #[test]
    fn test_minimum_uncertainty_wins() {
        // 8-probe wave, replies for probes 0, 2, 5 with RTTs 4ms, 2ms, 9ms.
        let sends = [1.000, 1.128, 1.320];
        let rtts = [0.004, 0.002, 0.009];
        let remote = [2000.0, 2000.2, 2000.5];
        let seqs = [0, 2, 5];

        let mut wave = Wave::new();
        let id = wave.begin();
        for i in 0..3 {
            let r = reply(id, seqs[i], sends[i], remote[i]);
            assert!(wave.record_reply(&r, sends[i] + rtts[i]));
        }
        assert_eq!(wave.len(), 3);
        // Arrival order is preserved in both parallel sequences.
        assert_eq!(wave.samples()[1].local_sent, sends[1]);
        assert!((wave.estimates()[2].uncertainty - rtts[2]).abs() < 1e-9);

        // Probe 2's estimate (minimum uncertainty 2ms) must be selected:
        // offset = t1 - (send_2 + rtt/2)
        let result = wave.aggregate().unwrap();
        assert!((result.uncertainty - 0.002).abs() < 1e-9);
        assert_eq!(result.remote_time, remote[1]);
        let expected = remote[1] - (sends[1] + 0.001);
        assert!((result.offset - expected).abs() < 1e-9);
    }

    #[test]
    fn test_partial_wave_aggregates() {
        // 1 of 8 probes answered is still a valid wave.
        let mut wave = Wave::new();
        let id = wave.begin();
        let probe = TimeProbe {
            wave_id: id,
            seq: 7,
            sent_at: 5.0,
        };
        assert!(wave.record_reply(&probe.reply(42.0), 5.001));
        assert!(wave.aggregate().is_some());
    }

    #[test]
    fn test_empty_wave_aggregates_to_none() {
        let mut wave = Wave::new();
        wave.begin();
        assert!(wave.aggregate().is_none());
    }
}
