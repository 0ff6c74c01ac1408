//! Socket Core - Transport-Agnostic Socket Handles
//!
//! A [`SocketHandle`] wraps a raw connection together with the transport
//! that knows how to operate on it and a default read timeout. Connection
//! handlers read, write, shut down and inspect connections through the
//! handle without caring whether the bytes travel in cleartext or over TLS.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Connection handler  │
//! └──────────┬───────────┘
//!            │ recv / send / sendfile / shutdown / close / ...
//! ┌──────────┴───────────┐
//! │     SocketHandle     │  connection + transport + read_timeout
//! └──────────┬───────────┘
//!            │ one delegation per call, results unchanged
//! ┌──────────┴───────────┐
//! │  Transport (trait)   │
//! │  ┌─────┐  ┌───────┐  │
//! │  │ TCP │  │  TLS  │  │
//! │  └─────┘  └───────┘  │
//! └──────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SocketHandle`]: the handle itself
//! - [`HandleConfig`]: transport plus default read timeout
//! - [`Transport`]: the capability contract backends implement
//! - [`AnyTransport`]: runtime choice between [`TcpTransport`] and [`TlsTransport`]
//! - [`Timeout`]: finite or infinite read timeout
//!
//! # Quick Start
//!
//! ```ignore
//! use socket_core::{transport::create_transport, SocketHandle, TransportConfig};
//! use tokio::net::TcpListener;
//!
//! let config = TransportConfig::from_env();
//! let handle_config = config.handle_config(create_transport(&config)?);
//!
//! let listener = TcpListener::bind("127.0.0.1:4000").await?;
//! let (stream, _) = listener.accept().await?;
//! let connection = handle_config.transport.wrap(stream)?;
//!
//! let mut socket = SocketHandle::new(connection, &handle_config);
//! socket.handshake().await?;
//! let request = socket.recv(0, None).await?;
//! socket.send(request).await?;
//! socket.close().await?;
//! ```

pub mod config;
pub mod handle;
pub mod timeout;
pub mod transport;

pub use config::{load_config, load_config_from_path, ConfigError, ConfigSource};
pub use handle::{HandleConfig, SocketHandle};
pub use timeout::Timeout;
pub use transport::{
    AddressInfo, AnyConnection, AnyError, AnyTransport, IoData, ProtocolId, ShutdownDirection,
    SocketOption, SocketOptionValue, StatsSnapshot, TcpConnection, TcpTransport, TlsConnection,
    TlsError, TlsTransport, Transport, TransportConfig, TransportType,
};

/// Handle over whichever transport configuration selected
pub type AnySocket = SocketHandle<AnyTransport>;
