//! Datagram encoding and decoding for time probes and replies.
//!
//! Wire format (little-endian):
//!
//! ```text
//! Probe (17 bytes):
//! +--------+------------+------------+--------------------+
//! | Type   | Wave ID    | Sequence   | Send Time          |
//! | 1 byte | 4 bytes LE | 4 bytes LE | 8 bytes LE f64     |
//! +--------+------------+------------+--------------------+
//!
//! Reply (25 bytes): probe fields, echoed verbatim, followed by
//! +--------------------+
//! | Remote Time        |
//! | 8 bytes LE f64     |
//! +--------------------+
//! ```
//!
//! The reply echoes the probe's send time, so the receiving side never has
//! to remember outstanding probes: one reply carries everything needed for a
//! round-trip measurement.

use thiserror::Error;

use crate::core::constants::{PROBE_DATAGRAM_SIZE, REPLY_DATAGRAM_SIZE};

/// Errors that can occur when decoding a time datagram.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Datagram shorter than the fixed wire size.
    #[error("datagram too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },

    /// Unknown datagram type byte.
    #[error("invalid datagram type: {0:#04x}")]
    InvalidType(u8),
}

/// Datagram type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DatagramType {
    /// Outbound time probe.
    Probe = 0x01,
    /// Inbound reply carrying the remote timestamp.
    Reply = 0x02,
}

impl DatagramType {
    /// Parse a datagram type from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Probe),
            0x02 => Some(Self::Reply),
            _ => None,
        }
    }

    /// Convert the datagram type to its byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A timestamped probe sent to the remote producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeProbe {
    /// Wave the probe belongs to.
    pub wave_id: u32,
    /// Position of the probe within its wave.
    pub seq: u32,
    /// Local send time in seconds.
    pub sent_at: f64,
}

impl TimeProbe {
    /// Serialize the probe to its wire representation.
    pub fn to_bytes(&self) -> [u8; PROBE_DATAGRAM_SIZE] {
        let mut buf = [0u8; PROBE_DATAGRAM_SIZE];
        buf[0] = DatagramType::Probe.as_byte();
        buf[1..5].copy_from_slice(&self.wave_id.to_le_bytes());
        buf[5..9].copy_from_slice(&self.seq.to_le_bytes());
        buf[9..17].copy_from_slice(&self.sent_at.to_le_bytes());
        buf
    }

    /// Parse a probe from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < PROBE_DATAGRAM_SIZE {
            return Err(WireError::TooShort {
                expected: PROBE_DATAGRAM_SIZE,
                actual: bytes.len(),
            });
        }
        match DatagramType::from_byte(bytes[0]) {
            Some(DatagramType::Probe) => {}
            _ => return Err(WireError::InvalidType(bytes[0])),
        }

        Ok(Self {
            wave_id: u32::from_le_bytes(bytes[1..5].try_into().unwrap()),
            seq: u32::from_le_bytes(bytes[5..9].try_into().unwrap()),
            sent_at: f64::from_le_bytes(bytes[9..17].try_into().unwrap()),
        })
    }

    /// Build the reply answering this probe with the given remote timestamp.
    pub fn reply(&self, remote_time: f64) -> TimeReply {
        TimeReply {
            wave_id: self.wave_id,
            seq: self.seq,
            sent_at: self.sent_at,
            remote_time,
        }
    }
}

/// A reply from the remote producer to one [`TimeProbe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeReply {
    /// Wave id echoed from the probe.
    pub wave_id: u32,
    /// Sequence number echoed from the probe.
    pub seq: u32,
    /// Probe send time echoed from the probe, in local seconds.
    pub sent_at: f64,
    /// Remote clock reading taken when the probe was answered.
    pub remote_time: f64,
}

impl TimeReply {
    /// Serialize the reply to its wire representation.
    pub fn to_bytes(&self) -> [u8; REPLY_DATAGRAM_SIZE] {
        let mut buf = [0u8; REPLY_DATAGRAM_SIZE];
        buf[0] = DatagramType::Reply.as_byte();
        buf[1..5].copy_from_slice(&self.wave_id.to_le_bytes());
        buf[5..9].copy_from_slice(&self.seq.to_le_bytes());
        buf[9..17].copy_from_slice(&self.sent_at.to_le_bytes());
        buf[17..25].copy_from_slice(&self.remote_time.to_le_bytes());
        buf
    }

    /// Parse a reply from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < REPLY_DATAGRAM_SIZE {
            return Err(WireError::TooShort {
                expected: REPLY_DATAGRAM_SIZE,
                actual: bytes.len(),
            });
        }
        match DatagramType::from_byte(bytes[0]) {
            Some(DatagramType::Reply) => {}
            _ => return Err(WireError::InvalidType(bytes[0])),
        }

        Ok(Self {
            wave_id: u32::from_le_bytes(bytes[1..5].try_into().unwrap()),
            seq: u32::from_le_bytes(bytes[5..9].try_into().unwrap()),
            sent_at: f64::from_le_bytes(bytes[9..17].try_into().unwrap()),
            remote_time: f64::from_le_bytes(bytes[17..25].try_into().unwrap()),
        })
    }
}
