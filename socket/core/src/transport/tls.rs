//! TLS Transport
//!
//! Server-side TLS over TCP using `tokio-rustls`. A connection starts out as
//! a plain TCP stream and becomes a TLS session once `handshake` succeeds.
//!
//! Errors are [`TlsError`] values; they are not mapped onto `io::Error`
//! so callers can tell a failed negotiation from a broken pipe.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use rustls::ServerConfig;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

use super::stream;
use super::traits::Transport;
use super::types::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot,
};
use crate::timeout::{with_timeout, Timeout};

/// Default bound on the TLS negotiation of one connection
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on sending close_notify during `close`
pub const DEFAULT_CLOSE_NOTIFY_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors produced by the TLS transport
#[derive(Debug, Error)]
pub enum TlsError {
    /// I/O failure on an established session or the TCP socket below it
    #[error("TLS I/O error: {0}")]
    Io(#[from] io::Error),

    /// Negotiation failed or timed out; the TCP stream is gone
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),

    /// Application data requested before `handshake` completed
    #[error("TLS session not established")]
    NotEstablished,

    /// The connection was closed or lost in a failed handshake
    #[error("connection closed")]
    Closed,
}

enum TlsState {
    Pending(TcpStream),
    Established(Box<TlsStream<TcpStream>>),
    Closed,
}

/// A TCP connection that is, or will become, a TLS session
pub struct TlsConnection {
    state: TlsState,
    read_buf: BytesMut,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    stats: StatsSnapshot,
}

impl TlsConnection {
    /// Wrap an accepted TCP stream that has not negotiated yet
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot report its local or peer address.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        Ok(Self {
            state: TlsState::Pending(stream),
            read_buf: BytesMut::new(),
            local_addr,
            peer_addr,
            stats: StatsSnapshot::default(),
        })
    }

    /// Check if the handshake has completed
    pub fn is_established(&self) -> bool {
        matches!(self.state, TlsState::Established(_))
    }

    /// Check if the connection is closed (explicitly or by a failed handshake)
    pub fn is_closed(&self) -> bool {
        matches!(self.state, TlsState::Closed)
    }

    pub(crate) fn local_info(&self) -> AddressInfo {
        AddressInfo::new(self.local_addr)
    }

    pub(crate) fn peer_info(&self) -> AddressInfo {
        let certificate = match &self.state {
            TlsState::Established(tls) => tls
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|chain| chain.first())
                .map(|cert| cert.as_ref().to_vec()),
            _ => None,
        };
        AddressInfo {
            address: self.peer_addr,
            certificate,
        }
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats
    }

    pub(crate) fn negotiated_protocol(&self) -> Option<ProtocolId> {
        match &self.state {
            TlsState::Established(tls) => tls.get_ref().1.alpn_protocol().map(ProtocolId::from),
            _ => None,
        }
    }

    /// TCP socket underneath, in any live state
    fn tcp(&self) -> Result<&TcpStream, TlsError> {
        match &self.state {
            TlsState::Pending(tcp) => Ok(tcp),
            TlsState::Established(tls) => Ok(tls.get_ref().0),
            TlsState::Closed => Err(TlsError::Closed),
        }
    }

    /// Decrypted bytes received but not yet handed out by `recv`
    pub fn buffered_len(&self) -> usize {
        self.read_buf.len()
    }

    fn session_mut(&mut self) -> Result<Session<'_>, TlsError> {
        match &mut self.state {
            TlsState::Established(tls) => Ok(Session {
                tls: tls.as_mut(),
                read_buf: &mut self.read_buf,
                stats: &mut self.stats,
            }),
            TlsState::Pending(_) => Err(TlsError::NotEstablished),
            TlsState::Closed => Err(TlsError::Closed),
        }
    }
}

/// Borrowed parts of an established connection
struct Session<'a> {
    tls: &'a mut TlsStream<TcpStream>,
    read_buf: &'a mut BytesMut,
    stats: &'a mut StatsSnapshot,
}

impl fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            TlsState::Pending(_) => "pending",
            TlsState::Established(_) => "established",
            TlsState::Closed => "closed",
        };
        f.debug_struct("TlsConnection")
            .field("state", &state)
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr)
            .field("buffered", &self.read_buf.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Server-side TLS transport
#[derive(Clone)]
pub struct TlsTransport {
    acceptor: TlsAcceptor,
    config: Arc<ServerConfig>,
    handshake_timeout: Duration,
    close_notify_timeout: Duration,
}

impl TlsTransport {
    /// Create the transport from a rustls server configuration
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            acceptor: TlsAcceptor::from(Arc::clone(&config)),
            config,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            close_notify_timeout: DEFAULT_CLOSE_NOTIFY_TIMEOUT,
        }
    }

    /// Bound the negotiation; a client that stalls longer fails the handshake
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Bound the close_notify write in `close`
    #[must_use]
    pub fn with_close_notify_timeout(mut self, timeout: Duration) -> Self {
        self.close_notify_timeout = timeout;
        self
    }

    /// How long `handshake` waits for the client
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// The server configuration handshakes run with
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }
}

impl fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTransport")
            .field("alpn_protocols", &self.config.alpn_protocols.len())
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TlsTransport {
    type Connection = TlsConnection;
    type Error = TlsError;

    async fn handshake(&self, conn: &mut TlsConnection) -> Result<(), TlsError> {
        match std::mem::replace(&mut conn.state, TlsState::Closed) {
            TlsState::Pending(tcp) => {
                let accept = self.acceptor.accept(tcp);
                let tls = with_timeout(Timeout::After(self.handshake_timeout), accept)
                    .await
                    .map_err(TlsError::Handshake)?;
                tracing::debug!(
                    peer = %conn.peer_addr,
                    alpn = ?tls.get_ref().1.alpn_protocol().map(String::from_utf8_lossy),
                    "TLS handshake complete"
                );
                conn.state = TlsState::Established(Box::new(tls));
                Ok(())
            }
            established @ TlsState::Established(_) => {
                conn.state = established;
                Ok(())
            }
            TlsState::Closed => Err(TlsError::Closed),
        }
    }

    async fn recv(
        &self,
        conn: &mut TlsConnection,
        length: usize,
        timeout: Timeout,
    ) -> Result<Bytes, TlsError> {
        let Session {
            tls,
            read_buf,
            stats,
        } = conn.session_mut()?;
        Ok(stream::read_bytes(tls, read_buf, length, timeout, stats).await?)
    }

    async fn send(&self, conn: &mut TlsConnection, data: IoData) -> Result<(), TlsError> {
        let Session { tls, stats, .. } = conn.session_mut()?;
        Ok(stream::write_data(tls, &data, stats).await?)
    }

    async fn sendfile(
        &self,
        conn: &mut TlsConnection,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<u64, TlsError> {
        let Session { tls, stats, .. } = conn.session_mut()?;
        Ok(stream::copy_file_region(tls, path, offset, length, stats).await?)
    }

    async fn shutdown(
        &self,
        conn: &mut TlsConnection,
        direction: ShutdownDirection,
    ) -> Result<(), TlsError> {
        if direction != ShutdownDirection::Read && conn.is_established() {
            // close_notify, then the TCP write half
            conn.session_mut()?.tls.shutdown().await?;
            if direction == ShutdownDirection::ReadWrite {
                stream::shutdown_socket(conn.tcp()?, std::net::Shutdown::Read)?;
            }
        } else {
            stream::shutdown_socket(conn.tcp()?, direction.into())?;
        }
        tracing::debug!(peer = %conn.peer_addr, ?direction, "TLS shutdown");
        Ok(())
    }

    async fn close(&self, conn: &mut TlsConnection) -> Result<(), TlsError> {
        conn.read_buf = BytesMut::new();
        match std::mem::replace(&mut conn.state, TlsState::Closed) {
            TlsState::Established(mut tls) => {
                // Bounded close_notify; the socket is released either way.
                let notify = with_timeout(
                    Timeout::After(self.close_notify_timeout),
                    tls.shutdown(),
                )
                .await;
                drop(tls);
                tracing::debug!(peer = %conn.peer_addr, "TLS connection closed");
                notify.map_err(TlsError::Io)
            }
            TlsState::Pending(tcp) => {
                drop(tcp);
                tracing::debug!(peer = %conn.peer_addr, "TLS connection closed before handshake");
                Ok(())
            }
            TlsState::Closed => Err(TlsError::Closed),
        }
    }

    fn getopts(
        &self,
        conn: &TlsConnection,
        options: &[SocketOption],
    ) -> Result<Vec<SocketOptionValue>, TlsError> {
        Ok(stream::get_options(conn.tcp()?, options)?)
    }

    fn setopts(&self, conn: &TlsConnection, options: &[SocketOptionValue]) -> Result<(), TlsError> {
        Ok(stream::set_options(conn.tcp()?, options)?)
    }

    fn local_info(&self, conn: &TlsConnection) -> AddressInfo {
        conn.local_info()
    }

    fn peer_info(&self, conn: &TlsConnection) -> AddressInfo {
        conn.peer_info()
    }

    fn is_secure(&self) -> bool {
        true
    }

    fn getstat(&self, conn: &TlsConnection) -> StatsSnapshot {
        conn.stats()
    }

    fn negotiated_protocol(&self, conn: &TlsConnection) -> Option<ProtocolId> {
        conn.negotiated_protocol()
    }
}
