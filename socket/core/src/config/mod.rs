//! TOML Configuration File Support
//!
//! Loads transport settings from `~/.config/socket-core/socket.toml`,
//! with environment variables taking priority over the file.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [transport]
//! kind = "secure"
//! cert_path = "/etc/socket-core/server.pem"
//! key_path = "/etc/socket-core/server.key"
//! alpn_protocols = ["h2", "http/1.1"]
//! read_timeout_ms = 60000
//! handshake_timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::config::{TransportConfig, TransportType};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration or building a transport
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Certificate or key file could not be loaded
    #[error("Failed to load PEM file at {path}: {message}")]
    PemError {
        /// The file that was attempted
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// rustls rejected the certificate, key or protocol settings
    #[error("TLS configuration rejected: {0}")]
    TlsError(#[from] rustls::Error),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Transport section of the TOML configuration
///
/// Every field is optional so a file only needs to list what it changes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportToml {
    /// "plain" or "secure"
    pub kind: Option<String>,

    /// PEM certificate chain (secure only)
    pub cert_path: Option<PathBuf>,

    /// PEM private key (secure only)
    pub key_path: Option<PathBuf>,

    /// ALPN protocols in preference order (secure only)
    pub alpn_protocols: Option<Vec<String>>,

    /// Read timeout in milliseconds (0 = no timeout)
    pub read_timeout_ms: Option<u64>,

    /// TLS negotiation timeout in milliseconds
    pub handshake_timeout_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketToml {
    /// Transport configuration section
    pub transport: TransportToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Loaded configuration plus where it came from
#[derive(Clone, Debug, Default)]
pub struct SocketConfigFile {
    /// Transport configuration
    pub transport: TransportConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: Option<ConfigSource>,
}

impl SocketConfigFile {
    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source.unwrap_or(ConfigSource::Default)
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/socket-core/socket.toml` or
/// `~/.config/socket-core/socket.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("socket-core").join("socket.toml"))
}

/// Load configuration from the default path and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// result fails validation. A missing config file is not an error.
pub fn load_config() -> Result<SocketConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// the merged configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SocketConfigFile, ConfigError> {
    let mut config = SocketConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_config = read_toml(config_path)?;
            apply_toml_config(&mut config.transport, &toml_config.transport)?;
            config.config_file_path = Some(config_path.clone());
            config.source = Some(ConfigSource::File);

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    if config.transport.apply_env() {
        config.source = Some(ConfigSource::Env);
    }

    config.transport.validate()?;
    Ok(config)
}

fn read_toml(path: &Path) -> Result<SocketToml, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply TOML configuration values to the transport config
fn apply_toml_config(
    config: &mut TransportConfig,
    toml: &TransportToml,
) -> Result<(), ConfigError> {
    match toml.kind.as_deref().map(str::to_lowercase).as_deref() {
        None => {}
        Some("plain") | Some("tcp") => config.transport = TransportType::Plain,
        Some("secure") | Some("tls") => {
            if !config.is_secure() {
                config.transport = TransportType::Secure {
                    cert_path: PathBuf::new(),
                    key_path: PathBuf::new(),
                    alpn_protocols: Vec::new(),
                };
            }
        }
        Some(other) => {
            return Err(ConfigError::ValidationError(format!(
                "unknown transport kind {other:?}"
            )))
        }
    }

    if let TransportType::Secure {
        cert_path,
        key_path,
        alpn_protocols,
    } = &mut config.transport
    {
        if let Some(path) = &toml.cert_path {
            cert_path.clone_from(path);
        }
        if let Some(path) = &toml.key_path {
            key_path.clone_from(path);
        }
        if let Some(protocols) = &toml.alpn_protocols {
            alpn_protocols.clone_from(protocols);
        }
    }

    if let Some(timeout) = toml.read_timeout_ms {
        config.read_timeout_ms = timeout;
    }
    if let Some(timeout) = toml.handshake_timeout_ms {
        config.handshake_timeout_ms = timeout;
    }

    Ok(())
}
