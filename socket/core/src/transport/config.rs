//! Transport Configuration
//!
//! Configuration types for selecting a transport and the default read
//! timeout handed to every socket handle built from it.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::handle::HandleConfig;
use crate::timeout::Timeout;

/// Transport type selection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportType {
    /// Cleartext TCP
    #[default]
    Plain,

    /// TLS over TCP
    ///
    /// Handles must complete `handshake` before exchanging data.
    Secure {
        /// PEM file holding the certificate chain, leaf first
        cert_path: PathBuf,
        /// PEM file holding the private key
        key_path: PathBuf,
        /// ALPN protocols offered, in preference order (e.g. "h2", "http/1.1")
        #[serde(default)]
        alpn_protocols: Vec<String>,
    },
}

/// Transport configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Which transport to use
    pub transport: TransportType,

    /// Read timeout in milliseconds (0 = no timeout)
    ///
    /// Used by `recv` calls that do not pass their own timeout.
    pub read_timeout_ms: u64,

    /// TLS negotiation timeout in milliseconds (secure only, must be > 0)
    pub handshake_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport: TransportType::Plain,
            read_timeout_ms: 0,
            handshake_timeout_ms: 10_000, // 10 seconds
        }
    }
}

impl TransportConfig {
    /// Create configuration for cleartext TCP
    pub fn plain() -> Self {
        Self::default()
    }

    /// Create configuration for TLS with the given PEM files
    pub fn secure(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            transport: TransportType::Secure {
                cert_path: cert_path.into(),
                key_path: key_path.into(),
                alpn_protocols: Vec::new(),
            },
            ..Default::default()
        }
    }

    /// Set the read timeout in milliseconds (0 = no timeout)
    #[must_use]
    pub fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SOCKET_TRANSPORT`: "plain", "tcp", "secure", "tls"
    /// - `SOCKET_TLS_CERT`: Path to the PEM certificate chain
    /// - `SOCKET_TLS_KEY`: Path to the PEM private key
    /// - `SOCKET_TLS_ALPN`: Comma-separated ALPN protocols
    /// - `SOCKET_READ_TIMEOUT`: Read timeout in ms (0 = none)
    /// - `SOCKET_TLS_HANDSHAKE_TIMEOUT`: TLS negotiation timeout in ms
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables
    ///
    /// Returns `true` if any variable was applied.
    pub fn apply_env(&mut self) -> bool {
        let mut applied = false;

        match std::env::var("SOCKET_TRANSPORT")
            .as_deref()
            .map(str::to_lowercase)
        {
            Ok(ref s) if s == "plain" || s == "tcp" => {
                self.transport = TransportType::Plain;
                applied = true;
            }
            Ok(ref s) if s == "secure" || s == "tls" => {
                if !self.is_secure() {
                    self.transport = TransportType::Secure {
                        cert_path: PathBuf::new(),
                        key_path: PathBuf::new(),
                        alpn_protocols: Vec::new(),
                    };
                }
                applied = true;
            }
            Ok(ref other) => {
                tracing::warn!(
                    value = %other,
                    "Unknown SOCKET_TRANSPORT, keeping current transport"
                );
            }
            Err(_) => {}
        }

        if let TransportType::Secure {
            cert_path,
            key_path,
            alpn_protocols,
        } = &mut self.transport
        {
            if let Ok(path) = std::env::var("SOCKET_TLS_CERT") {
                *cert_path = PathBuf::from(path);
                applied = true;
            }
            if let Ok(path) = std::env::var("SOCKET_TLS_KEY") {
                *key_path = PathBuf::from(path);
                applied = true;
            }
            if let Ok(list) = std::env::var("SOCKET_TLS_ALPN") {
                *alpn_protocols = parse_alpn_list(&list);
                applied = true;
            }
        }

        if let Some(ms) = std::env::var("SOCKET_READ_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.read_timeout_ms = ms;
            applied = true;
        }

        if let Some(ms) = std::env::var("SOCKET_TLS_HANDSHAKE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.handshake_timeout_ms = ms;
            applied = true;
        }

        applied
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if a secure transport lacks a
    /// certificate or key path, lists an empty ALPN protocol, or has a zero
    /// handshake timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let TransportType::Secure {
            cert_path,
            key_path,
            alpn_protocols,
        } = &self.transport
        {
            if cert_path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "secure transport requires a certificate path".into(),
                ));
            }
            if key_path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "secure transport requires a private key path".into(),
                ));
            }
            if alpn_protocols.iter().any(String::is_empty) {
                return Err(ConfigError::ValidationError(
                    "ALPN protocol names must not be empty".into(),
                ));
            }
            if self.handshake_timeout_ms == 0 {
                return Err(ConfigError::ValidationError(
                    "handshake timeout must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }

    /// Check if this is a TLS configuration
    pub fn is_secure(&self) -> bool {
        matches!(self.transport, TransportType::Secure { .. })
    }

    /// Default read timeout for handles
    pub fn read_timeout(&self) -> Timeout {
        Timeout::from_config_millis(self.read_timeout_ms)
    }

    /// Bound on TLS negotiation
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Handle configuration pairing `transport` with this read timeout
    pub fn handle_config<T>(&self, transport: T) -> HandleConfig<T> {
        HandleConfig::new(transport, self.read_timeout())
    }
}

/// Split a comma-separated ALPN list, dropping blanks
pub fn parse_alpn_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
