//! Transport Trait
//!
//! The capability contract every socket backend implements. A backend owns
//! all platform and TLS logic; callers reach it through
//! [`SocketHandle`](crate::SocketHandle), which forwards each call verbatim.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use super::types::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot,
};
use crate::timeout::Timeout;

/// Socket capability contract
///
/// Every operation takes the raw connection as its first argument. The
/// transport value itself holds only configuration (for example a TLS
/// acceptor) and is shared by every connection it serves.
///
/// Errors are whatever the backend produces. Plain sockets report
/// platform-style `io::Error`s, TLS reports its own type; nothing above this
/// trait normalizes them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Raw connection resource this transport operates on
    type Connection: Send;

    /// Backend-defined error value
    type Error: fmt::Debug + Send + 'static;

    /// Negotiate the connection. No-op for transports without negotiation.
    async fn handshake(&self, conn: &mut Self::Connection) -> Result<(), Self::Error>;

    /// Read from the connection
    ///
    /// `length == 0` returns whatever the next delivery carries; `length > 0`
    /// asks for up to that many bytes. `timeout` is already resolved.
    async fn recv(
        &self,
        conn: &mut Self::Connection,
        length: usize,
        timeout: Timeout,
    ) -> Result<Bytes, Self::Error>;

    /// Write all of `data`
    async fn send(&self, conn: &mut Self::Connection, data: IoData) -> Result<(), Self::Error>;

    /// Send `length` bytes of the file at `path` starting at `offset`
    ///
    /// `length == 0` sends everything from `offset` to end of file. Returns
    /// the number of bytes written.
    async fn sendfile(
        &self,
        conn: &mut Self::Connection,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<u64, Self::Error>;

    /// Half- or full-close the connection
    async fn shutdown(
        &self,
        conn: &mut Self::Connection,
        direction: ShutdownDirection,
    ) -> Result<(), Self::Error>;

    /// Release the connection. Calling it again must return an error value,
    /// never panic.
    async fn close(&self, conn: &mut Self::Connection) -> Result<(), Self::Error>;

    /// Read socket options
    fn getopts(
        &self,
        conn: &Self::Connection,
        options: &[SocketOption],
    ) -> Result<Vec<SocketOptionValue>, Self::Error>;

    /// Apply socket options
    fn setopts(
        &self,
        conn: &Self::Connection,
        options: &[SocketOptionValue],
    ) -> Result<(), Self::Error>;

    /// Metadata for our end
    fn local_info(&self, conn: &Self::Connection) -> AddressInfo;

    /// Metadata for the remote end
    fn peer_info(&self, conn: &Self::Connection) -> AddressInfo;

    /// Whether this transport encrypts. Constant per transport type.
    fn is_secure(&self) -> bool;

    /// Counters as tracked by the backend
    fn getstat(&self, conn: &Self::Connection) -> StatsSnapshot;

    /// Protocol agreed during handshake, `None` if the transport does not
    /// negotiate or nothing was agreed
    fn negotiated_protocol(&self, conn: &Self::Connection) -> Option<ProtocolId>;
}
