//! Transport Layer
//!
//! The capability contract a socket backend implements, and the backends
//! shipped with this crate:
//! - `TcpTransport`: cleartext TCP
//! - `TlsTransport`: server-side TLS over TCP (rustls)
//! - `AnyTransport`: either of the above, chosen from configuration
//!
//! # Errors
//!
//! Each backend keeps its own error type. The plain transport reports
//! `io::Error` kinds straight from the OS; TLS reports [`TlsError`]. Code
//! matching on specific errors should match on the backend's type.

pub mod any;
pub mod config;
pub mod factory;
mod stream;
pub mod tcp;
pub mod tls;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use any::{AnyConnection, AnyError, AnyTransport};
pub use config::{TransportConfig, TransportType};
pub use factory::create_transport;
pub use stream::MAX_DELIVERY;
pub use tcp::{TcpConnection, TcpTransport};
pub use tls::{
    TlsConnection, TlsError, TlsTransport, DEFAULT_CLOSE_NOTIFY_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT,
};
pub use traits::Transport;
pub use types::{
    AddressInfo, IoData, ProtocolId, ShutdownDirection, SocketOption, SocketOptionValue,
    StatsSnapshot,
};
