//! Transport Factory
//!
//! Factory functions for creating transport instances based on configuration.
//! Connection-handling code gets an [`AnyTransport`] and never needs to know
//! which backend it is talking to.

use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use super::any::AnyTransport;
use super::config::{TransportConfig, TransportType};
use super::tcp::TcpTransport;
use super::tls::TlsTransport;
use crate::config::ConfigError;

/// Create a transport based on configuration
///
/// # Errors
///
/// Returns an error if the configuration fails validation, or (secure only)
/// the certificate chain or private key cannot be loaded or is rejected by
/// rustls.
///
/// # Example
///
/// ```ignore
/// use socket_core::transport::{create_transport, TransportConfig};
///
/// let config = TransportConfig::secure("server.pem", "server.key");
/// let transport = create_transport(&config)?;
/// let handle_config = config.handle_config(transport);
/// ```
pub fn create_transport(config: &TransportConfig) -> Result<AnyTransport, ConfigError> {
    config.validate()?;

    match &config.transport {
        TransportType::Plain => Ok(AnyTransport::Plain(TcpTransport::new())),

        TransportType::Secure {
            cert_path,
            key_path,
            alpn_protocols,
        } => {
            let server_config = load_server_config(cert_path, key_path, alpn_protocols)?;
            tracing::debug!(
                cert = %cert_path.display(),
                alpn = ?alpn_protocols,
                "Built TLS transport"
            );
            let transport = TlsTransport::new(Arc::new(server_config))
                .with_handshake_timeout(config.handshake_timeout());
            Ok(AnyTransport::Secure(transport))
        }
    }
}

/// Build a rustls server configuration from PEM files
///
/// Client certificates are not requested.
///
/// # Errors
///
/// Returns `ConfigError::PemError` if either file is unreadable or holds no
/// usable item, and `ConfigError::TlsError` if rustls rejects the pair.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    alpn_protocols: &[String],
) -> Result<ServerConfig, ConfigError> {
    let pem_error = |path: &Path, message: String| ConfigError::PemError {
        path: path.to_path_buf(),
        message,
    };

    let certs = CertificateDer::pem_file_iter(cert_path)
        .map_err(|e| pem_error(cert_path, format!("{e:?}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| pem_error(cert_path, format!("{e:?}")))?;
    if certs.is_empty() {
        return Err(pem_error(cert_path, "no certificates found".into()));
    }

    let key =
        PrivateKeyDer::from_pem_file(key_path).map_err(|e| pem_error(key_path, format!("{e:?}")))?;

    server_config(certs, key, alpn_protocols)
}

/// Build a rustls server configuration from DER material already in memory
///
/// # Errors
///
/// Returns `ConfigError::TlsError` if rustls rejects the certificate or key.
pub fn server_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    alpn_protocols: &[String],
) -> Result<ServerConfig, ConfigError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = alpn_protocols
        .iter()
        .map(|p| p.as_bytes().to_vec())
        .collect();
    Ok(config)
}
