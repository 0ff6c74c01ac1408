//! Plain TCP Transport
//!
//! Cleartext transport over `tokio::net::TcpStream`. Errors are plain
//! `io::Error`s carrying the platform's error kinds.

use std::io;
use std::net::SocketAddr;
use std::path::Path;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::net::TcpStream;

use super::stream::{self, not_connected};
use super::traits::Transport;
use super::types::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot,
};
use crate::timeout::Timeout;

/// A TCP connection plus the metadata the transport reports for it
///
/// Addresses are captured when the stream is wrapped so they stay available
/// after `close`. Bytes read off the socket but not yet returned by `recv`
/// wait in `read_buf`.
#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
    read_buf: BytesMut,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    stats: StatsSnapshot,
}

impl TcpConnection {
    /// Wrap a connected stream
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot report its local or peer address (for
    /// example because the peer already reset it).
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        Ok(Self {
            stream: Some(stream),
            read_buf: BytesMut::new(),
            local_addr,
            peer_addr,
            stats: StatsSnapshot::default(),
        })
    }

    /// Check if `close` has not been called yet
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// The underlying stream, unless closed
    pub fn stream(&self) -> Option<&TcpStream> {
        self.stream.as_ref()
    }

    pub(crate) fn local_info(&self) -> AddressInfo {
        AddressInfo::new(self.local_addr)
    }

    pub(crate) fn peer_info(&self) -> AddressInfo {
        AddressInfo::new(self.peer_addr)
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats
    }

    fn open_stream(&self) -> io::Result<&TcpStream> {
        self.stream.as_ref().ok_or_else(not_connected)
    }

    /// Bytes received but not yet handed out by `recv`
    pub fn buffered_len(&self) -> usize {
        self.read_buf.len()
    }

    fn split_mut(&mut self) -> io::Result<(&mut TcpStream, &mut BytesMut, &mut StatsSnapshot)> {
        match self.stream.as_mut() {
            Some(stream) => Ok((stream, &mut self.read_buf, &mut self.stats)),
            None => Err(not_connected()),
        }
    }
}

/// Cleartext TCP transport
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Create the transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = io::Error;

    async fn handshake(&self, _conn: &mut TcpConnection) -> io::Result<()> {
        Ok(())
    }

    async fn recv(
        &self,
        conn: &mut TcpConnection,
        length: usize,
        timeout: Timeout,
    ) -> io::Result<Bytes> {
        let (stream, buffered, stats) = conn.split_mut()?;
        stream::read_bytes(stream, buffered, length, timeout, stats).await
    }

    async fn send(&self, conn: &mut TcpConnection, data: IoData) -> io::Result<()> {
        let (stream, _, stats) = conn.split_mut()?;
        stream::write_data(stream, &data, stats).await
    }

    async fn sendfile(
        &self,
        conn: &mut TcpConnection,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> io::Result<u64> {
        let (stream, _, stats) = conn.split_mut()?;
        stream::copy_file_region(stream, path, offset, length, stats).await
    }

    async fn shutdown(
        &self,
        conn: &mut TcpConnection,
        direction: ShutdownDirection,
    ) -> io::Result<()> {
        stream::shutdown_socket(conn.open_stream()?, direction.into())?;
        tracing::debug!(peer = %conn.peer_addr, ?direction, "TCP shutdown");
        Ok(())
    }

    async fn close(&self, conn: &mut TcpConnection) -> io::Result<()> {
        match conn.stream.take() {
            Some(stream) => {
                drop(stream);
                conn.read_buf = BytesMut::new();
                tracing::debug!(peer = %conn.peer_addr, "TCP connection closed");
                Ok(())
            }
            None => Err(not_connected()),
        }
    }

    fn getopts(
        &self,
        conn: &TcpConnection,
        options: &[SocketOption],
    ) -> io::Result<Vec<SocketOptionValue>> {
        stream::get_options(conn.open_stream()?, options)
    }

    fn setopts(&self, conn: &TcpConnection, options: &[SocketOptionValue]) -> io::Result<()> {
        stream::set_options(conn.open_stream()?, options)
    }

    fn local_info(&self, conn: &TcpConnection) -> AddressInfo {
        conn.local_info()
    }

    fn peer_info(&self, conn: &TcpConnection) -> AddressInfo {
        conn.peer_info()
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn getstat(&self, conn: &TcpConnection) -> StatsSnapshot {
        conn.stats()
    }

    fn negotiated_protocol(&self, _conn: &TcpConnection) -> Option<ProtocolId> {
        None
    }
}
