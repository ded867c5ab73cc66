//! CLOCKWAVE transport layer.
//!
//! - **Datagram codec**: [`TimeProbe`] / [`TimeReply`] wire format handling
//! - **Async sockets**: [`ProbeSocket`] wrapper for tokio UDP
//! - **Lifecycle plumbing**: [`ConnectionMonitor`] events from the external
//!   connection layer
//!
//! The transport layer is agnostic to estimation policy: it moves timestamped
//! datagrams and lifecycle events, nothing more.

mod lifecycle;
mod socket;
mod wire;

pub use lifecycle::{ConnectionEvent, ConnectionMonitor};
pub use socket::ProbeSocket;
pub use wire::{DatagramType, TimeProbe, TimeReply, WireError};
