//! Error types

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving descriptors, driving sockets, or binding
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid descriptor, option, or TLS configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying connect call failed (DNS, refused, timeout)
    #[error("Unable to connect to {host}: {message}")]
    Connection {
        /// Target host as given by the caller
        host: String,
        /// Native diagnostic message
        message: String,
    },

    /// TLS handshake failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Blocking read did not complete within the read timeout
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// Peer closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// Operation not allowed in the current socket state
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state description
        expected: String,
        /// Actual state description
        actual: String,
    },

    /// Directory server rejected the bind
    #[error("bind failed with result code {code}: {message}")]
    Bind {
        /// LDAP result code
        code: u32,
        /// Diagnostic message from the server
        message: String,
    },

    /// Malformed or unexpected protocol data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Whether this error came from establishing the connection
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Whether the failure is tied to one server, so another server may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. }
                | Error::Tls(_)
                | Error::Timeout(_)
                | Error::ConnectionClosed
                | Error::Io(_)
        )
    }

    pub(crate) fn connection(host: &str, message: impl std::fmt::Display) -> Self {
        Error::Connection {
            host: host.to_string(),
            message: message.to_string(),
        }
    }
}
