//! Socket Handle
//!
//! A connection paired with the transport that operates on it and a default
//! read timeout. Connection-handling code uses the handle without knowing
//! whether the transport underneath is cleartext or TLS.
//!
//! Every operation is a single delegation to the transport. The handle keeps
//! no connection state, never retries, and returns the transport's result
//! exactly as produced.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::timeout::{self, Timeout};
use crate::transport::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot, Transport,
};

/// What a handle is built from besides the raw connection
pub struct HandleConfig<T> {
    /// Transport shared by every handle built from this config
    pub transport: Arc<T>,
    /// Default for `recv` calls that pass no timeout
    pub read_timeout: Timeout,
}

impl<T> HandleConfig<T> {
    /// Create a config owning `transport`
    pub fn new(transport: T, read_timeout: Timeout) -> Self {
        Self::shared(Arc::new(transport), read_timeout)
    }

    /// Create a config around an already shared transport
    pub fn shared(transport: Arc<T>, read_timeout: Timeout) -> Self {
        Self {
            transport,
            read_timeout,
        }
    }
}

// Manual impl: `T` itself need not be `Clone`.
impl<T> Clone for HandleConfig<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            read_timeout: self.read_timeout,
        }
    }
}

impl<T> fmt::Debug for HandleConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleConfig")
            .field("transport", &std::any::type_name::<T>())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

/// Transport-agnostic socket handle
///
/// Owned by exactly one task. Operations that touch the wire take
/// `&mut self`; introspection takes `&self`. The transport and read timeout
/// cannot change after construction.
pub struct SocketHandle<T: Transport> {
    connection: T::Connection,
    transport: Arc<T>,
    read_timeout: Timeout,
}

impl<T: Transport> SocketHandle<T> {
    /// Wrap `connection` using the transport and timeout from `config`
    ///
    /// Performs no I/O.
    pub fn new(connection: T::Connection, config: &HandleConfig<T>) -> Self {
        Self {
            connection,
            transport: Arc::clone(&config.transport),
            read_timeout: config.read_timeout,
        }
    }

    /// The raw connection
    pub fn connection(&self) -> &T::Connection {
        &self.connection
    }

    /// The transport chosen at construction
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Default read timeout
    pub fn read_timeout(&self) -> Timeout {
        self.read_timeout
    }

    /// Give up the handle, returning the raw connection
    pub fn into_connection(self) -> T::Connection {
        self.connection
    }

    /// Run transport negotiation
    ///
    /// On success the same handle is handed back so calls can be chained.
    pub async fn handshake(&mut self) -> Result<&mut Self, T::Error> {
        self.transport.handshake(&mut self.connection).await?;
        Ok(self)
    }

    /// Receive up to `length` bytes (`0` = whatever the next delivery holds)
    ///
    /// `None` for `timeout` uses the handle's read timeout.
    pub async fn recv(
        &mut self,
        length: usize,
        timeout: Option<Timeout>,
    ) -> Result<Bytes, T::Error> {
        let timeout = timeout::resolve(timeout, self.read_timeout);
        self.transport.recv(&mut self.connection, length, timeout).await
    }

    /// Send a buffer or a list of chunks
    pub async fn send(&mut self, data: impl Into<IoData>) -> Result<(), T::Error> {
        self.transport.send(&mut self.connection, data.into()).await
    }

    /// Send a region of a file, returning the bytes written
    pub async fn sendfile(
        &mut self,
        path: impl AsRef<Path>,
        offset: u64,
        length: u64,
    ) -> Result<u64, T::Error> {
        self.transport
            .sendfile(&mut self.connection, path.as_ref(), offset, length)
            .await
    }

    /// Half- or full-close the connection
    pub async fn shutdown(&mut self, direction: ShutdownDirection) -> Result<(), T::Error> {
        self.transport.shutdown(&mut self.connection, direction).await
    }

    /// Release the connection. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), T::Error> {
        self.transport.close(&mut self.connection).await
    }

    /// Read socket options
    pub fn getopts(&self, options: &[SocketOption]) -> Result<Vec<SocketOptionValue>, T::Error> {
        self.transport.getopts(&self.connection, options)
    }

    /// Apply socket options
    pub fn setopts(&self, options: &[SocketOptionValue]) -> Result<(), T::Error> {
        self.transport.setopts(&self.connection, options)
    }

    /// Local address metadata
    pub fn local_info(&self) -> AddressInfo {
        self.transport.local_info(&self.connection)
    }

    /// Remote address metadata
    pub fn peer_info(&self) -> AddressInfo {
        self.transport.peer_info(&self.connection)
    }

    /// Whether the transport encrypts
    pub fn is_secure(&self) -> bool {
        self.transport.is_secure()
    }

    /// Connection statistics
    pub fn getstat(&self) -> StatsSnapshot {
        self.transport.getstat(&self.connection)
    }

    /// ALPN result, if the transport negotiates one
    pub fn negotiated_protocol(&self) -> Option<ProtocolId> {
        self.transport.negotiated_protocol(&self.connection)
    }
}

impl<T: Transport> fmt::Debug for SocketHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketHandle")
            .field("transport", &std::any::type_name::<T>())
            .field("secure", &self.transport.is_secure())
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}
