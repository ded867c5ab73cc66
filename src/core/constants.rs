//! Protocol constants and default tunables.
//!
//! The timing defaults match the reference deployment profile; they can all
//! be overridden through [`WaveConfig`](crate::core::WaveConfig).

use std::time::Duration;

// =============================================================================
// WAVE TIMING
// =============================================================================

/// Number of probes sent per estimation wave.
pub const DEFAULT_PROBES_PER_WAVE: u32 = 8;

/// Pacing interval between consecutive probes of a wave.
///
/// Pacing is time-driven: probes go out on this cadence whether or not
/// earlier replies have arrived, which bounds wave duration under total loss.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(64);

/// Slack added on top of the probe schedule before results are aggregated.
///
/// This is the worst round-trip time the protocol still waits for; replies
/// arriving after the aggregation deadline are discarded.
pub const DEFAULT_PROBE_MAX_RTT: Duration = Duration::from_millis(500);

/// Interval between the starts of consecutive estimation waves.
pub const DEFAULT_WAVE_INTERVAL: Duration = Duration::from_secs(2);

// =============================================================================
// PUBLIC SURFACE
// =============================================================================

/// Default timeout for callers waiting on the first offset estimate.
pub const DEFAULT_CORRECTION_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// DATAGRAM SIZES
// =============================================================================

/// Receive buffer size.
///
/// Sized generously to tolerate batched or padded reply payloads; a single
/// reply needs only [`REPLY_DATAGRAM_SIZE`] bytes.
pub const RECV_BUFFER_SIZE: usize = 16384;

/// Encoded probe datagram size (type + wave id + sequence + send time).
pub const PROBE_DATAGRAM_SIZE: usize = 1 + 4 + 4 + 8;

/// Encoded reply datagram size (probe fields + remote timestamp).
pub const REPLY_DATAGRAM_SIZE: usize = PROBE_DATAGRAM_SIZE + 8;
