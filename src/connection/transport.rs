//! Stream abstraction (TCP with optional TLS vs UDP)

use super::options::TransportKind;
use super::tls::TlsConfig;
use crate::{Error, Result};
use bytes::BytesMut;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// TCP stream variant: plain or TLS-encrypted
#[allow(clippy::large_enum_variant)]
pub enum TcpVariant {
    /// Plain TCP connection
    Plain(TcpStream),
    /// TLS-encrypted TCP connection
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
}

impl std::fmt::Debug for TcpVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TcpVariant::Plain(_) => f.write_str("TcpVariant::Plain(TcpStream)"),
            TcpVariant::Tls(_) => f.write_str("TcpVariant::Tls(TlsStream)"),
        }
    }
}

impl TcpVariant {
    fn tcp(&self) -> &TcpStream {
        match self {
            TcpVariant::Plain(stream) => stream,
            TcpVariant::Tls(stream) => stream.get_ref().0,
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            TcpVariant::Plain(stream) => stream.write_all(buf).await,
            TcpVariant::Tls(stream) => stream.write_all(buf).await,
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match self {
            TcpVariant::Plain(stream) => stream.flush().await,
            TcpVariant::Tls(stream) => stream.flush().await,
        }
    }

    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        match self {
            TcpVariant::Plain(stream) => stream.read_buf(buf).await,
            TcpVariant::Tls(stream) => stream.read_buf(buf).await,
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            TcpVariant::Plain(stream) => stream.shutdown().await,
            TcpVariant::Tls(stream) => stream.shutdown().await,
        }
    }
}

/// One connected OS-level stream
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Stream {
    /// TCP socket (plain or TLS)
    Tcp(TcpVariant),
    /// Connected UDP socket
    Udp(UdpSocket),
}

impl Stream {
    /// Connect to `host:port` using the given transport kind
    ///
    /// The host is resolved and only addresses of the transport's family are
    /// considered. UDP sockets are bound to an ephemeral local port and then
    /// connected, so reads only accept datagrams from the peer.
    pub async fn connect(kind: TransportKind, host: &str, port: u16) -> io::Result<Self> {
        let addr = resolve(kind, host, port).await?;

        if kind.is_udp() {
            let local: SocketAddr = if kind.is_ipv6() {
                (Ipv6Addr::UNSPECIFIED, 0).into()
            } else {
                (Ipv4Addr::UNSPECIFIED, 0).into()
            };
            let socket = UdpSocket::bind(local).await?;
            socket.connect(addr).await?;
            Ok(Stream::Udp(socket))
        } else {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            Ok(Stream::Tcp(TcpVariant::Plain(stream)))
        }
    }

    /// Upgrade a plain TCP stream to TLS over the same connection.
    ///
    /// Consumes `self` and returns a new `Stream` with a TLS-encrypted stream.
    /// Returns an error if the stream is not a plain TCP connection.
    pub async fn upgrade_to_tls(self, tls_config: &TlsConfig, hostname: &str) -> Result<Self> {
        match self {
            Stream::Tcp(TcpVariant::Plain(tcp_stream)) => {
                let server_name = super::tls::parse_server_name(hostname)?;
                let server_name =
                    rustls_pki_types::ServerName::try_from(server_name).map_err(|_| {
                        Error::Config(format!("Invalid hostname for TLS: {}", hostname))
                    })?;

                let tls_connector = tokio_rustls::TlsConnector::from(tls_config.client_config());
                let tls_stream = tls_connector
                    .connect(server_name, tcp_stream)
                    .await
                    .map_err(|e| Error::Tls(format!("TLS handshake failed: {}", e)))?;

                Ok(Stream::Tcp(TcpVariant::Tls(tls_stream)))
            }
            Stream::Tcp(TcpVariant::Tls(_)) => {
                Err(Error::Config("stream is already TLS-encrypted".into()))
            }
            Stream::Udp(_) => Err(Error::Config(
                "TLS is only supported for TCP transports".into(),
            )),
        }
    }

    /// Write bytes to the stream (one datagram for UDP)
    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Stream::Tcp(variant) => variant.write_all(buf).await,
            Stream::Udp(socket) => {
                let sent = socket.send(buf).await?;
                if sent < buf.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("datagram truncated: sent {} of {} bytes", sent, buf.len()),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Flush buffered writes
    pub async fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(variant) => variant.flush().await,
            Stream::Udp(_) => Ok(()),
        }
    }

    /// Read into buffer
    ///
    /// For UDP, `datagram_size` bytes are reserved so a whole datagram fits.
    /// Cancel safe: dropping the future before completion loses no data.
    pub async fn read_buf(&mut self, buf: &mut BytesMut, datagram_size: usize) -> io::Result<usize> {
        match self {
            Stream::Tcp(variant) => variant.read_buf(buf).await,
            Stream::Udp(socket) => {
                buf.reserve(datagram_size);
                socket.recv_buf(buf).await
            }
        }
    }

    /// Shutdown the stream
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(variant) => variant.shutdown().await,
            Stream::Udp(_) => Ok(()),
        }
    }

    /// Whether the OS still reports a connected peer
    pub fn is_connected(&self) -> bool {
        self.peer_addr().is_ok()
    }

    /// Address of the connected peer
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Stream::Tcp(variant) => variant.tcp().peer_addr(),
            Stream::Udp(socket) => socket.peer_addr(),
        }
    }

    /// Whether TLS is active on this stream
    pub fn is_tls(&self) -> bool {
        matches!(self, Stream::Tcp(TcpVariant::Tls(_)))
    }
}

impl From<TcpStream> for Stream {
    fn from(stream: TcpStream) -> Self {
        Stream::Tcp(TcpVariant::Plain(stream))
    }
}

impl From<UdpSocket> for Stream {
    fn from(socket: UdpSocket) -> Self {
        Stream::Udp(socket)
    }
}

/// Resolve `host:port`, keeping the first address of the transport's family
async fn resolve(kind: TransportKind, host: &str, port: u16) -> io::Result<SocketAddr> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let mut addrs = tokio::net::lookup_host((host, port)).await?;

    addrs
        .find(|addr| addr.is_ipv6() == kind.is_ipv6())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!(
                    "no {} address found for {}",
                    if kind.is_ipv6() { "IPv6" } else { "IPv4" },
                    host
                ),
            )
        })
}
