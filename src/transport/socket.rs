//! Async UDP socket for the time-probe exchange.
//!
//! Thin wrapper over a tokio UDP socket with an owned receive buffer, sized
//! per the protocol's 16 KiB tolerance for batched or padded replies.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::core::constants::RECV_BUFFER_SIZE;

/// Async UDP socket used by the estimation worker.
///
/// The worker is the only owner; probes go out through [`send`](Self::send)
/// and replies come back through [`recv`](Self::recv) on the private buffer.
#[derive(Debug)]
pub struct ProbeSocket {
    /// The underlying UDP socket.
    socket: UdpSocket,
    /// Receive buffer, reused across datagrams.
    recv_buffer: Vec<u8>,
}

impl ProbeSocket {
    /// Create a probe socket bound to the given local address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Create a probe socket from an existing UDP socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Connect to the remote time endpoint.
    ///
    /// After connecting, datagrams from other sources are filtered out by
    /// the OS, so `send`/`recv` only ever talk to the producer.
    pub async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        self.socket.connect(addr).await
    }

    /// Send a datagram to the connected endpoint.
    pub async fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.socket.send(data).await
    }

    /// Receive a datagram from the connected endpoint.
    pub async fn recv(&mut self) -> io::Result<&[u8]> {
        let len = self.socket.recv(&mut self.recv_buffer).await?;
        Ok(&self.recv_buffer[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_socket_bind() {
        let socket = ProbeSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert!(socket.local_addr().unwrap().port() != 0);
    }

    #[tokio::test]
    async fn test_socket_connected_send_recv() {
        let remote = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let remote_addr = remote.local_addr().unwrap();

        let mut socket = ProbeSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        socket.connect(remote_addr).await.unwrap();

        let data = b"clockwave probe";
        socket.send(data).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, from) = remote.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], data);
        assert_eq!(from, socket.local_addr().unwrap());

        remote.send_to(b"clockwave reply", from).await.unwrap();
        let received = socket.recv().await.unwrap();
        assert_eq!(received, b"clockwave reply");
    }
}
