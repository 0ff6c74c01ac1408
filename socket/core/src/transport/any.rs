//! Runtime-Selected Transport
//!
//! [`AnyTransport`] is the closed set of backends this crate ships, picked at
//! runtime from configuration. Each variant keeps its own connection and
//! error types; [`AnyError`] carries a backend's error unchanged inside the
//! variant that produced it.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::net::TcpStream;

use super::tcp::{TcpConnection, TcpTransport};
use super::tls::{TlsConnection, TlsError, TlsTransport};
use super::traits::Transport;
use super::types::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot,
};
use crate::timeout::Timeout;

/// Transport chosen from configuration
#[derive(Clone, Debug)]
pub enum AnyTransport {
    /// Cleartext TCP
    Plain(TcpTransport),
    /// TLS over TCP
    Secure(TlsTransport),
}

/// Connection matching one of the [`AnyTransport`] variants
#[derive(Debug)]
pub enum AnyConnection {
    Plain(TcpConnection),
    Secure(TlsConnection),
}

/// Error from whichever backend handled the call
#[derive(Debug, Error)]
pub enum AnyError {
    /// From the plain transport
    #[error(transparent)]
    Plain(io::Error),

    /// From the TLS transport
    #[error(transparent)]
    Secure(TlsError),

    /// The connection was built for the other variant
    #[error("{connection} connection used with {transport} transport")]
    Mismatch {
        /// Transport variant name
        transport: &'static str,
        /// Connection variant name
        connection: &'static str,
    },
}

impl AnyTransport {
    /// Variant name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Secure(_) => "secure",
        }
    }

    /// Wrap an accepted stream in the connection type this variant expects
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot report its addresses.
    pub fn wrap(&self, stream: TcpStream) -> io::Result<AnyConnection> {
        match self {
            Self::Plain(_) => TcpConnection::new(stream).map(AnyConnection::Plain),
            Self::Secure(_) => TlsConnection::new(stream).map(AnyConnection::Secure),
        }
    }
}

impl AnyConnection {
    fn name(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Secure(_) => "secure",
        }
    }
}

/// Pair the transport variant with its connection, or report a mismatch.
/// Expands to the plain arm and the secure arm of a dispatch.
macro_rules! dispatch {
    ($transport:expr, $conn:expr, |$t:ident, $c:ident| $call:expr) => {
        match ($transport, $conn) {
            (AnyTransport::Plain($t), AnyConnection::Plain($c)) => $call.map_err(AnyError::Plain),
            (AnyTransport::Secure($t), AnyConnection::Secure($c)) => {
                $call.map_err(AnyError::Secure)
            }
            (transport, conn) => Err(AnyError::Mismatch {
                transport: transport.name(),
                connection: conn.name(),
            }),
        }
    };
}

#[async_trait]
impl Transport for AnyTransport {
    type Connection = AnyConnection;
    type Error = AnyError;

    async fn handshake(&self, conn: &mut AnyConnection) -> Result<(), AnyError> {
        dispatch!(self, conn, |t, c| t.handshake(c).await)
    }

    async fn recv(
        &self,
        conn: &mut AnyConnection,
        length: usize,
        timeout: Timeout,
    ) -> Result<Bytes, AnyError> {
        dispatch!(self, conn, |t, c| t.recv(c, length, timeout).await)
    }

    async fn send(&self, conn: &mut AnyConnection, data: IoData) -> Result<(), AnyError> {
        dispatch!(self, conn, |t, c| t.send(c, data).await)
    }

    async fn sendfile(
        &self,
        conn: &mut AnyConnection,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<u64, AnyError> {
        dispatch!(self, conn, |t, c| t.sendfile(c, path, offset, length).await)
    }

    async fn shutdown(
        &self,
        conn: &mut AnyConnection,
        direction: ShutdownDirection,
    ) -> Result<(), AnyError> {
        dispatch!(self, conn, |t, c| t.shutdown(c, direction).await)
    }

    async fn close(&self, conn: &mut AnyConnection) -> Result<(), AnyError> {
        dispatch!(self, conn, |t, c| t.close(c).await)
    }

    fn getopts(
        &self,
        conn: &AnyConnection,
        options: &[SocketOption],
    ) -> Result<Vec<SocketOptionValue>, AnyError> {
        dispatch!(self, conn, |t, c| t.getopts(c, options))
    }

    fn setopts(&self, conn: &AnyConnection, options: &[SocketOptionValue]) -> Result<(), AnyError> {
        dispatch!(self, conn, |t, c| t.setopts(c, options))
    }

    // Metadata lives on the connection, so these never mismatch.

    fn local_info(&self, conn: &AnyConnection) -> AddressInfo {
        match conn {
            AnyConnection::Plain(c) => c.local_info(),
            AnyConnection::Secure(c) => c.local_info(),
        }
    }

    fn peer_info(&self, conn: &AnyConnection) -> AddressInfo {
        match conn {
            AnyConnection::Plain(c) => c.peer_info(),
            AnyConnection::Secure(c) => c.peer_info(),
        }
    }

    fn is_secure(&self) -> bool {
        match self {
            Self::Plain(t) => t.is_secure(),
            Self::Secure(t) => t.is_secure(),
        }
    }

    fn getstat(&self, conn: &AnyConnection) -> StatsSnapshot {
        match conn {
            AnyConnection::Plain(c) => c.stats(),
            AnyConnection::Secure(c) => c.stats(),
        }
    }

    fn negotiated_protocol(&self, conn: &AnyConnection) -> Option<ProtocolId> {
        match conn {
            AnyConnection::Plain(_) => None,
            AnyConnection::Secure(c) => c.negotiated_protocol(),
        }
    }
}
