//! Connection management
//!
//! This module handles:
//! * Transport kinds (TCP/UDP over IPv4/IPv6) and socket options
//! * Stream abstraction (plain TCP, TLS over TCP, UDP)
//! * Socket lifecycle (connect, upgrade, close) as a state machine
//! * TLS configuration and certificate policy

mod options;
mod socket;
mod state;
mod tls;
mod transport;

pub use options::{
    SocketOptions, TransportKind, DEFAULT_PORT, DEFAULT_SECURE_PORT, MAX_UDP_DATAGRAM,
};
pub use socket::Socket;
pub use state::SocketState;
pub use tls::{parse_server_name, TlsConfig, TlsConfigBuilder};
pub use transport::{Stream, TcpVariant};
