//! Error types for the CLOCKWAVE protocol.

use thiserror::Error;

/// Top-level CLOCKWAVE errors.
#[derive(Debug, Error)]
pub enum ClockwaveError {
    /// No offset estimate became available within the caller's window.
    ///
    /// This is a per-call condition: the background estimation worker keeps
    /// running, so a later call may succeed.
    #[error("timed out waiting for a clock-offset estimate")]
    Timeout,

    /// I/O error while setting up the probe socket.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for CLOCKWAVE operations.
pub type ClockwaveResult<T> = Result<T, ClockwaveError>;
