//! Read Timeouts
//!
//! A read timeout is either a finite duration or infinite. Handles carry a
//! default timeout; individual `recv` calls may override it.

use std::fmt;
use std::future::Future;
use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a read may suspend the caller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeout {
    /// Wait until data arrives or the peer goes away
    #[default]
    Infinite,
    /// Give up after the given duration
    After(Duration),
}

impl Timeout {
    /// Finite timeout in milliseconds
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self::After(Duration::from_millis(ms))
    }

    /// Timeout from a configured millisecond count (0 = infinite)
    #[must_use]
    pub const fn from_config_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::Infinite
        } else {
            Self::from_millis(ms)
        }
    }

    /// The finite duration, if any
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Infinite => None,
            Self::After(d) => Some(*d),
        }
    }

    /// Check if this timeout never expires
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::After(d)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => write!(f, "infinity"),
            Self::After(d) => write!(f, "{}ms", d.as_millis()),
        }
    }
}

/// Pick the timeout for a single read: an explicit value always wins over the
/// handle's default.
#[must_use]
pub fn resolve(explicit: Option<Timeout>, default: Timeout) -> Timeout {
    explicit.unwrap_or(default)
}

/// Drive an I/O future under `timeout`, mapping expiry to `ErrorKind::TimedOut`
///
/// The future is dropped on expiry.
pub(crate) async fn with_timeout<F, T>(timeout: Timeout, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout {
        Timeout::Infinite => fut.await,
        Timeout::After(d) => match tokio::time::timeout(d, fut).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {}ms", d.as_millis()),
            )),
        },
    }
}
