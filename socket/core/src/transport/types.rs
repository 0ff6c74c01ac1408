//! Transport Value Types
//!
//! Plain data passed across the transport contract: send payloads, shutdown
//! directions, socket options, address metadata, statistics and negotiated
//! protocol identifiers.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Payload for `send`: one contiguous buffer or a list of chunks
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IoData {
    /// A single contiguous buffer
    Single(Bytes),
    /// Chunks written back to back, in order
    Chunks(Vec<Bytes>),
}

impl IoData {
    /// Total number of bytes across all chunks
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(b) => b.len(),
            Self::Chunks(chunks) => chunks.iter().map(Bytes::len).sum(),
        }
    }

    /// Check if there is nothing to write
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the non-empty chunks in write order
    pub fn chunks(&self) -> impl Iterator<Item = &Bytes> {
        let slice: &[Bytes] = match self {
            Self::Single(b) => std::slice::from_ref(b),
            Self::Chunks(chunks) => chunks,
        };
        slice.iter().filter(|b| !b.is_empty())
    }

    /// Number of chunks (a single buffer counts as one)
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Chunks(chunks) => chunks.len(),
        }
    }
}

impl From<Bytes> for IoData {
    fn from(b: Bytes) -> Self {
        Self::Single(b)
    }
}

impl From<Vec<u8>> for IoData {
    fn from(v: Vec<u8>) -> Self {
        Self::Single(Bytes::from(v))
    }
}

impl From<&'static [u8]> for IoData {
    fn from(s: &'static [u8]) -> Self {
        Self::Single(Bytes::from_static(s))
    }
}

impl From<&'static str> for IoData {
    fn from(s: &'static str) -> Self {
        Self::Single(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<Bytes>> for IoData {
    fn from(chunks: Vec<Bytes>) -> Self {
        Self::Chunks(chunks)
    }
}

/// Which half of the connection `shutdown` closes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownDirection {
    /// Stop receiving
    Read,
    /// Stop sending (the peer sees EOF)
    Write,
    /// Both halves
    ReadWrite,
}

impl From<ShutdownDirection> for std::net::Shutdown {
    fn from(dir: ShutdownDirection) -> Self {
        match dir {
            ShutdownDirection::Read => Self::Read,
            ShutdownDirection::Write => Self::Write,
            ShutdownDirection::ReadWrite => Self::Both,
        }
    }
}

/// Socket option names accepted by `getopts`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketOption {
    /// `TCP_NODELAY`
    NoDelay,
    /// `SO_KEEPALIVE`
    KeepAlive,
    /// `SO_LINGER`
    Linger,
    /// `SO_RCVBUF`
    RecvBuffer,
    /// `SO_SNDBUF`
    SendBuffer,
    /// `IP_TTL`
    Ttl,
    /// `SO_REUSEADDR`
    ReuseAddress,
    /// Message-delivery mode of the owning process. Meaningless for
    /// pull-based async sockets; backends reject it.
    Active,
}

/// Socket option with a value, returned by `getopts` and accepted by `setopts`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketOptionValue {
    NoDelay(bool),
    KeepAlive(bool),
    Linger(Option<Duration>),
    RecvBuffer(usize),
    SendBuffer(usize),
    Ttl(u32),
    ReuseAddress(bool),
    Active(bool),
}

impl SocketOptionValue {
    /// The option this value belongs to
    #[must_use]
    pub fn option(&self) -> SocketOption {
        match self {
            Self::NoDelay(_) => SocketOption::NoDelay,
            Self::KeepAlive(_) => SocketOption::KeepAlive,
            Self::Linger(_) => SocketOption::Linger,
            Self::RecvBuffer(_) => SocketOption::RecvBuffer,
            Self::SendBuffer(_) => SocketOption::SendBuffer,
            Self::Ttl(_) => SocketOption::Ttl,
            Self::ReuseAddress(_) => SocketOption::ReuseAddress,
            Self::Active(_) => SocketOption::Active,
        }
    }
}

/// Address metadata for one end of a connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressInfo {
    /// IP address and port
    pub address: SocketAddr,
    /// DER-encoded certificate presented by this end, if any
    pub certificate: Option<Vec<u8>>,
}

impl AddressInfo {
    /// Address info without certificate
    #[must_use]
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            certificate: None,
        }
    }

    /// Port number
    #[must_use]
    pub fn port(&self) -> u16 {
        self.address.port()
    }
}

/// Connection statistics as counted by the transport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Bytes received
    pub recv_oct: u64,
    /// Successful reads
    pub recv_cnt: u64,
    /// Bytes sent
    pub send_oct: u64,
    /// Successful writes
    pub send_cnt: u64,
}

/// Application protocol agreed during handshake (ALPN)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProtocolId(pub Vec<u8>);

impl ProtocolId {
    /// Raw protocol bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for ProtocolId {
    fn from(b: &[u8]) -> Self {
        Self(b.to_vec())
    }
}

impl From<&str> for ProtocolId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
