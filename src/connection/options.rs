//! Socket options
//!
//! Options are strongly typed but (de)serializable, so callers can hand over
//! loosely-typed overrides (`serde_json::Value`) that are merged onto the
//! defaults and validated in one step.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default LDAP port
pub const DEFAULT_PORT: u16 = 389;

/// Default LDAPS port
pub const DEFAULT_SECURE_PORT: u16 = 636;

/// Maximum UDP datagram payload size
pub const MAX_UDP_DATAGRAM: usize = 65507;

/// Transport kind for a socket
///
/// Serialized as `tcp`, `tcp6`, `udp` or `udp6`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransportKind {
    /// TCP over IPv4
    #[default]
    Tcp4,
    /// TCP over IPv6
    Tcp6,
    /// UDP over IPv4
    Udp4,
    /// UDP over IPv6
    Udp6,
}

impl TransportKind {
    /// Every valid transport kind
    pub const ALL: [TransportKind; 4] = [
        TransportKind::Tcp4,
        TransportKind::Tcp6,
        TransportKind::Udp4,
        TransportKind::Udp6,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp4 => "tcp",
            Self::Tcp6 => "tcp6",
            Self::Udp4 => "udp",
            Self::Udp6 => "udp6",
        }
    }

    /// Whether this is a datagram transport
    pub fn is_udp(&self) -> bool {
        matches!(self, Self::Udp4 | Self::Udp6)
    }

    /// Whether this transport uses the IPv6 address family
    pub fn is_ipv6(&self) -> bool {
        matches!(self, Self::Tcp6 | Self::Udp6)
    }

    fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Error::Config(format!(
                    "The transport \"{}\" is not valid. It must be one of: {}",
                    s,
                    Self::valid_names()
                ))
            })
    }
}

impl TryFrom<String> for TransportKind {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportKind> for String {
    fn from(kind: TransportKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Options for a single [`Socket`](super::Socket)
///
/// # Defaults
///
/// - `transport`: `tcp`
/// - `port`: 389
/// - `use_ssl`: false
/// - `ssl_validate_cert`: true
/// - `ssl_allow_self_signed`: None
/// - `ssl_ca_file`: None (system roots)
/// - `timeout_connect`: 3 seconds
/// - `timeout_read`: 15 seconds
/// - `buffer_size`: None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketOptions {
    /// Transport kind
    pub transport: TransportKind,
    /// Remote port
    pub port: u16,
    /// Perform the TLS handshake right after connecting
    pub use_ssl: bool,
    /// Verify the server certificate chain
    pub ssl_validate_cert: bool,
    /// Tolerate certificates from an unknown issuer when validating
    pub ssl_allow_self_signed: Option<bool>,
    /// PEM file with trusted CA certificates
    pub ssl_ca_file: Option<String>,
    /// Connect timeout, in seconds when serialized
    #[serde(with = "seconds")]
    pub timeout_connect: Duration,
    /// Read timeout, in seconds when serialized
    #[serde(with = "seconds")]
    pub timeout_read: Duration,
    /// Receive buffer size (datagram size for UDP)
    pub buffer_size: Option<usize>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            port: DEFAULT_PORT,
            use_ssl: false,
            ssl_validate_cert: true,
            ssl_allow_self_signed: None,
            ssl_ca_file: None,
            timeout_connect: Duration::from_secs(3),
            timeout_read: Duration::from_secs(15),
            buffer_size: None,
        }
    }
}

impl SocketOptions {
    /// Merge loosely-typed overrides onto these options
    ///
    /// Keys present in `overrides` win; unknown keys are ignored. Values are
    /// validated, so an unknown `transport` fails with a configuration error
    /// that lists the valid transports.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldap_session::connection::{SocketOptions, TransportKind};
    ///
    /// let opts = SocketOptions::default()
    ///     .merged(serde_json::json!({ "transport": "udp6", "timeout_read": 2.5 }))
    ///     .unwrap();
    /// assert_eq!(opts.transport, TransportKind::Udp6);
    ///
    /// let err = SocketOptions::default()
    ///     .merged(serde_json::json!({ "transport": "sctp" }))
    ///     .unwrap_err();
    /// assert!(err.is_config());
    /// ```
    pub fn merged(self, overrides: serde_json::Value) -> Result<Self> {
        let overrides = match overrides {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Ok(self),
            other => {
                return Err(Error::Config(format!(
                    "socket options must be an object, got {}",
                    other
                )))
            }
        };

        let mut base = serde_json::to_value(&self)
            .map_err(|e| Error::Config(format!("unable to serialize socket options: {}", e)))?;
        if let serde_json::Value::Object(map) = &mut base {
            map.extend(overrides);
        }

        serde_json::from_value(base).map_err(|e| Error::Config(e.to_string()))
    }

    /// Set transport kind
    pub fn transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Set remote port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable implicit TLS
    pub fn use_ssl(mut self, enabled: bool) -> Self {
        self.use_ssl = enabled;
        self
    }

    /// Enable or disable certificate validation
    pub fn ssl_validate_cert(mut self, validate: bool) -> Self {
        self.ssl_validate_cert = validate;
        self
    }

    /// Allow or reject self-signed certificates
    pub fn ssl_allow_self_signed(mut self, allow: bool) -> Self {
        self.ssl_allow_self_signed = Some(allow);
        self
    }

    /// Trust the CA certificates in a PEM file instead of the system roots
    pub fn ssl_ca_file(mut self, path: impl Into<String>) -> Self {
        self.ssl_ca_file = Some(path.into());
        self
    }

    /// Set connect timeout
    pub fn timeout_connect(mut self, timeout: Duration) -> Self {
        self.timeout_connect = timeout;
        self
    }

    /// Set read timeout
    pub fn timeout_read(mut self, timeout: Duration) -> Self {
        self.timeout_read = timeout;
        self
    }

    /// Set receive buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }
}

/// `Duration` as (fractional) seconds
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
