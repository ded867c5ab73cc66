//! # CLOCKWAVE Protocol
//!
//! Wave-based UDP clock-offset estimation for unreliable networks.
//!
//! CLOCKWAVE continuously estimates the offset (and its round-trip-time
//! uncertainty bound) between a local consumer's clock and a remote data
//! producer's clock, so timestamps produced remotely can be translated into
//! local clock units. It provides:
//!
//! - **Loss tolerance**: waves aggregate whatever replies arrive; total loss
//!   of a wave is a skipped cycle, never an error
//! - **Staleness rejection**: replies are tagged with a wave id and stale
//!   ones are discarded, for any arrival timing
//! - **Background operation**: one cooperative worker task owns the socket
//!   and all timers; foreground callers only block-with-timeout on results
//! - **Recovery awareness**: reconnection to a (possibly different) host
//!   invalidates cached offsets and raises a consumable reset flag
//!
//! ## Modules
//!
//! - [`core`]: configuration, local clock, constants, and error types
//! - [`transport`]: probe/reply datagram codec, UDP socket, lifecycle events
//! - [`sync`]: offset store, wave aggregation, scheduler, recovery watcher
//! - [`client`]: the high-level [`ClockTracker`] API
//!
//! ## Example Usage
//!
//! ```ignore
//! use clockwave::prelude::*;
//! use clockwave::core::constants::DEFAULT_CORRECTION_TIMEOUT;
//!
//! // The connection layer owns endpoint discovery and reports lifecycle
//! // events through a monitor.
//! let monitor = ConnectionMonitor::new();
//! let tracker = ClockTracker::connect(time_endpoint, WaveConfig::default(), &monitor).await?;
//!
//! // First call waits for the initial estimation wave; later calls are
//! // instantaneous and the estimate is refreshed in the background.
//! let offset = tracker.time_correction(DEFAULT_CORRECTION_TIMEOUT).await?;
//! let remote_now = tracker.local_time() + offset;
//!
//! if tracker.was_reset() {
//!     // Previously cached remote timestamps are no longer comparable.
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod core;
pub mod sync;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::ClockTracker;
    pub use crate::core::{ClockwaveError, ClockwaveResult, LocalClock, WaveConfig};
    pub use crate::sync::{ClockOffset, OffsetStore};
    pub use crate::transport::{ConnectionEvent, ConnectionMonitor, TimeProbe, TimeReply};
}

// Re-export commonly used items at crate root
pub use crate::client::ClockTracker;
pub use crate::core::{ClockwaveError, ClockwaveResult, LocalClock, WaveConfig};
pub use crate::sync::ClockOffset;
pub use crate::transport::{ConnectionEvent, ConnectionMonitor};
