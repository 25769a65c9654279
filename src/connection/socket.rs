//! Core socket type

use super::options::{SocketOptions, TransportKind, MAX_UDP_DATAGRAM};
use super::state::SocketState;
use super::tls::TlsConfig;
use super::transport::Stream;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures::FutureExt;
use std::time::Instant;
use tracing::Instrument;

/// Initial read buffer capacity for stream transports
const READ_BUFFER_CAPACITY: usize = 8192;

/// A single directory connection
///
/// Owns at most one OS-level stream. Created disconnected (or pre-bound to an
/// existing stream), connected with [`connect`](Self::connect), optionally
/// upgraded with [`encrypt`](Self::encrypt), and released with
/// [`close`](Self::close).
///
/// Methods take `&mut self`: one task drives a socket at a time.
#[derive(Debug)]
pub struct Socket {
    stream: Option<Stream>,
    state: SocketState,
    options: SocketOptions,
    host: Option<String>,
    read_buf: BytesMut,
}

impl Socket {
    /// Create a socket, optionally bound to an already connected stream
    pub fn new(stream: Option<Stream>, options: SocketOptions) -> Self {
        let state = match &stream {
            Some(stream) if stream.is_tls() => SocketState::ConnectedEncrypted,
            Some(_) => SocketState::ConnectedPlain,
            None => SocketState::Disconnected,
        };

        Self {
            stream,
            state,
            options,
            host: None,
            read_buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
        }
    }

    /// Create a socket from loosely-typed option overrides
    ///
    /// Overrides are merged onto [`SocketOptions::default`]; the caller's
    /// values win. Fails with a configuration error when a value is invalid,
    /// e.g. a transport outside `tcp`, `tcp6`, `udp`, `udp6`.
    pub fn with_overrides(stream: Option<Stream>, overrides: serde_json::Value) -> Result<Self> {
        let options = SocketOptions::default().merged(overrides)?;
        Ok(Self::new(stream, options))
    }

    /// Create a socket and connect it to `host`
    pub async fn create(host: &str, options: SocketOptions) -> Result<Self> {
        let mut socket = Self::new(None, options);
        socket.connect(host).await?;
        Ok(socket)
    }

    /// Create a TCP (IPv4) socket connected to `host`
    pub async fn tcp(host: &str, options: SocketOptions) -> Result<Self> {
        Self::create(host, options.transport(TransportKind::Tcp4)).await
    }

    /// Create a UDP (IPv4) socket connected to `host`
    ///
    /// The receive buffer is sized for the largest possible datagram.
    pub async fn udp(host: &str, options: SocketOptions) -> Result<Self> {
        Self::create(
            host,
            options
                .transport(TransportKind::Udp4)
                .buffer_size(MAX_UDP_DATAGRAM),
        )
        .await
    }

    /// Get the effective options
    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    /// Get current socket state
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// Host passed to the last successful [`connect`](Self::connect)
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Whether a stream is attached and the OS reports it connected
    pub fn is_connected(&self) -> bool {
        self.state.is_connected() && self.stream.as_ref().is_some_and(Stream::is_connected)
    }

    /// Whether TLS has been established on this socket
    pub fn is_encrypted(&self) -> bool {
        self.state == SocketState::ConnectedEncrypted
    }

    /// Connect to `host` on the configured port
    ///
    /// Gives up after `timeout_connect`. When `use_ssl` is set the TLS
    /// handshake runs before this returns, with its own `timeout_connect`
    /// limit. Any failure leaves the socket disconnected.
    ///
    /// # Errors
    ///
    /// * [`Error::Connection`] with the native message if the connect fails
    ///   or times out
    /// * [`Error::InvalidState`] if the socket is already connected
    /// * [`Error::Config`] if `use_ssl` is set on a UDP transport or the TLS
    ///   options are invalid; nothing is connected in that case
    /// * [`Error::Tls`] if the handshake fails or times out
    pub async fn connect(&mut self, host: &str) -> Result<()> {
        if self.state.is_connected() {
            return Err(Error::InvalidState {
                expected: SocketState::Disconnected.to_string(),
                actual: self.state.to_string(),
            });
        }

        let span = tracing::debug_span!(
            "connect",
            host = %host,
            port = self.options.port,
            transport = %self.options.transport
        );

        async {
            let transport = self.options.transport;
            let timeout = self.options.timeout_connect;
            let tls_config = if self.options.use_ssl {
                if transport.is_udp() {
                    return Err(Error::Config(
                        "TLS is only supported for TCP transports".into(),
                    ));
                }
                Some(TlsConfig::from_options(&self.options)?)
            } else {
                None
            };
            let started = Instant::now();

            let stream = match tokio::time::timeout(
                timeout,
                Stream::connect(transport, host, self.options.port),
            )
            .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    crate::metrics::counters::connection_failed(
                        transport.as_str(),
                        crate::metrics::labels::REASON_IO,
                    );
                    tracing::debug!(error = %e, "connect failed");
                    return Err(Error::connection(host, e));
                }
                Err(_) => {
                    crate::metrics::counters::connection_failed(
                        transport.as_str(),
                        crate::metrics::labels::REASON_TIMEOUT,
                    );
                    tracing::debug!(?timeout, "connect timed out");
                    return Err(Error::connection(
                        host,
                        format!("timed out after {:?}", timeout),
                    ));
                }
            };

            self.stream = Some(stream);
            self.host = Some(host.to_string());
            self.read_buf.clear();
            self.state.transition(SocketState::ConnectedPlain)?;

            if let Some(tls_config) = tls_config {
                if let Err(e) = self.handshake(&tls_config).await {
                    crate::metrics::counters::connection_failed(
                        transport.as_str(),
                        crate::metrics::labels::REASON_TLS,
                    );
                    return Err(e);
                }
            }

            crate::metrics::counters::connection_opened(transport.as_str());
            crate::metrics::histograms::connect_duration(
                transport.as_str(),
                started.elapsed().as_millis() as u64,
            );
            tracing::debug!(encrypted = self.is_encrypted(), "socket connected");

            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Upgrade the existing connection to TLS
    ///
    /// Applies `ssl_validate_cert`/`ssl_allow_self_signed` (and `ssl_ca_file`)
    /// and runs the handshake over the open connection. There is no way back
    /// to plaintext: `encrypt(false)` is a no-op on a plain socket and an
    /// error on an encrypted one.
    ///
    /// The handshake is bounded by `timeout_connect`. A failed or expired
    /// handshake consumes the connection and leaves the socket disconnected.
    pub async fn encrypt(&mut self, enable: bool) -> Result<()> {
        if !enable {
            return match self.state {
                SocketState::ConnectedEncrypted => Err(Error::InvalidState {
                    expected: SocketState::ConnectedPlain.to_string(),
                    actual: self.state.to_string(),
                }),
                _ => Ok(()),
            };
        }

        if self.state != SocketState::ConnectedPlain {
            return Err(Error::InvalidState {
                expected: SocketState::ConnectedPlain.to_string(),
                actual: self.state.to_string(),
            });
        }
        if self.options.transport.is_udp() {
            return Err(Error::Config(
                "TLS is only supported for TCP transports".into(),
            ));
        }

        let tls_config = TlsConfig::from_options(&self.options)?;
        let result = self.handshake(&tls_config).await;
        if result.is_err() {
            crate::metrics::counters::connection_closed(self.options.transport.as_str());
        }
        result
    }

    /// Run the TLS handshake over the plain stream, bounded by `timeout_connect`
    ///
    /// On failure the stream is dropped and the socket is left disconnected.
    async fn handshake(&mut self, tls_config: &TlsConfig) -> Result<()> {
        let server_name = match (&self.host, &self.stream) {
            (Some(host), _) => host.clone(),
            (None, Some(stream)) => stream.peer_addr()?.ip().to_string(),
            (None, None) => return Err(Error::ConnectionClosed),
        };
        let stream = self.stream.take().ok_or(Error::ConnectionClosed)?;
        let timeout = self.options.timeout_connect;

        let result =
            match tokio::time::timeout(timeout, stream.upgrade_to_tls(tls_config, &server_name))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Tls(format!(
                    "TLS handshake timed out after {:?}",
                    timeout
                ))),
            };

        match result {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state.transition(SocketState::ConnectedEncrypted)?;
                crate::metrics::counters::tls_upgrade(crate::metrics::labels::OUTCOME_SUCCESS);
                tracing::info!(host = %server_name, "TLS connection established");
                Ok(())
            }
            Err(e) => {
                self.state = SocketState::Disconnected;
                self.host = None;
                self.read_buf.clear();
                crate::metrics::counters::tls_upgrade(crate::metrics::labels::OUTCOME_FAILURE);
                tracing::warn!(host = %server_name, error = %e, "TLS upgrade failed");
                Err(e)
            }
        }
    }

    /// Read the next chunk of data
    ///
    /// With `block = false` the stream is polled exactly once: if nothing is
    /// pending, `Ok(None)` is returned immediately and the connection is left
    /// as it is. Otherwise the read waits up to `timeout_read`.
    ///
    /// # Errors
    ///
    /// * [`Error::Timeout`] if a blocking read expires
    /// * [`Error::ConnectionClosed`] if the peer closed a stream transport
    /// * [`Error::InvalidState`] if the socket is not connected
    pub async fn read(&mut self, block: bool) -> Result<Option<Bytes>> {
        if !self.read_buf.is_empty() {
            return Ok(Some(self.read_buf.split().freeze()));
        }

        let timeout = self.options.timeout_read;
        let is_udp = self.options.transport.is_udp();
        let read_size = self.options.buffer_size.unwrap_or(if is_udp {
            MAX_UDP_DATAGRAM
        } else {
            READ_BUFFER_CAPACITY
        });

        let stream = self.stream.as_mut().ok_or_else(|| Error::InvalidState {
            expected: "connected".into(),
            actual: SocketState::Disconnected.to_string(),
        })?;
        let buf = &mut self.read_buf;
        buf.reserve(read_size);

        let n = if block {
            match tokio::time::timeout(timeout, stream.read_buf(buf, read_size)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::debug!(?timeout, "read timed out");
                    return Err(Error::Timeout(timeout));
                }
            }
        } else {
            match stream.read_buf(buf, read_size).now_or_never() {
                Some(result) => result?,
                None => return Ok(None),
            }
        };

        if n == 0 && !is_udp {
            return Err(Error::ConnectionClosed);
        }

        Ok(Some(self.read_buf.split().freeze()))
    }

    /// Send data on the connection
    ///
    /// TCP writes the whole buffer; UDP sends it as one datagram. Transport
    /// errors are returned as they are, nothing is retried.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(|| Error::InvalidState {
            expected: "connected".into(),
            actual: SocketState::Disconnected.to_string(),
        })?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Close the connection
    ///
    /// Safe to call in any state and any number of times; never fails.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "error shutting down stream");
            }
            crate::metrics::counters::connection_closed(self.options.transport.as_str());
            tracing::debug!(host = ?self.host, "socket closed");
        }

        self.state = SocketState::Disconnected;
        self.host = None;
        self.read_buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, UdpSocket};

    fn fast_options(port: u16) -> SocketOptions {
        SocketOptions::default()
            .port(port)
            .timeout_connect(Duration::from_secs(2))
            .timeout_read(Duration::from_millis(200))
    }

    #[test]
    fn test_new_socket_is_disconnected() {
        let socket = Socket::new(None, SocketOptions::default());
        assert_eq!(socket.state(), SocketState::Disconnected);
        assert!(!socket.is_connected());
        assert!(!socket.is_encrypted());
        assert!(socket.host().is_none());
    }

    #[test]
    fn test_with_overrides_rejects_invalid_transport() {
        let err = Socket::with_overrides(None, json!({ "transport": "ipx" })).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("tcp,tcp6,udp,udp6"));
    }

    #[test]
    fn test_with_overrides_caller_wins() {
        let socket = Socket::with_overrides(None, json!({ "port": 3268, "use_ssl": true })).unwrap();
        assert_eq!(socket.options().port, 3268);
        assert!(socket.options().use_ssl);
        assert!(socket.options().ssl_validate_cert);
    }

    #[tokio::test]
    async fn test_close_never_connected() {
        let mut socket = Socket::new(None, SocketOptions::default());
        socket.close().await;
        socket.close().await;
        assert!(!socket.is_connected());
        assert_eq!(socket.state(), SocketState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_plain_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::new(None, fast_options(port));
        socket.connect("127.0.0.1").await.unwrap();
        let _peer = listener.accept().await.unwrap();

        assert!(socket.is_connected());
        assert!(!socket.is_encrypted());
        assert_eq!(socket.state(), SocketState::ConnectedPlain);
        assert_eq!(socket.host(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_connect_twice_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap();
        let err = socket.connect("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().starts_with("Unable to connect to 127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_non_blocking_read_without_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap();
        let _peer = listener.accept().await.unwrap();

        assert!(socket.read(false).await.unwrap().is_none());
        assert!(socket.is_connected());
    }

    #[tokio::test]
    async fn test_blocking_read_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap();
        let _peer = listener.accept().await.unwrap();

        let err = socket.read(true).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(200)));
        assert!(socket.is_connected());
    }

    #[tokio::test]
    async fn test_write_and_read_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();

        socket.write(b"hello").await.unwrap();
        let mut received = [0u8; 5];
        peer.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"hello");

        peer.write_all(b"world").await.unwrap();
        let data = socket.read(true).await.unwrap().unwrap();
        assert_eq!(&data[..], b"world");
    }

    #[tokio::test]
    async fn test_read_after_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port)).await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        let err = socket.read(true).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_io_on_disconnected_socket() {
        let mut socket = Socket::new(None, SocketOptions::default());
        assert!(matches!(
            socket.read(false).await.unwrap_err(),
            Error::InvalidState { .. }
        ));
        assert!(matches!(
            socket.write(b"x").await.unwrap_err(),
            Error::InvalidState { .. }
        ));
    }

    #[tokio::test]
    async fn test_encrypt_requires_connection() {
        let mut socket = Socket::new(None, SocketOptions::default());
        let err = socket.encrypt(true).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert!(socket.encrypt(false).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_handshake_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = Socket::tcp("127.0.0.1", fast_options(port).ssl_validate_cert(false))
            .await
            .unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        // the peer hangs up instead of answering the ClientHello
        drop(peer);

        let err = socket.encrypt(true).await.unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
        assert_eq!(socket.state(), SocketState::Disconnected);
        assert!(!socket.is_encrypted());
    }

    #[tokio::test]
    async fn test_implicit_tls_handshake_times_out_on_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // accepts the connection and never answers the ClientHello
        let server = tokio::spawn(async move {
            let (peer, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(peer);
        });

        let options = SocketOptions::default()
            .port(port)
            .use_ssl(true)
            .ssl_validate_cert(false)
            .timeout_connect(Duration::from_millis(300))
            .timeout_read(Duration::from_millis(300));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Socket::create("127.0.0.1", options),
        )
        .await
        .expect("handshake must be bounded by timeout_connect");

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Tls(_)), "got {:?}", err);
        assert!(err.to_string().contains("timed out"));
        assert!(err.is_transient());
        server.abort();
    }

    #[tokio::test]
    async fn test_encrypt_times_out_on_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let options = fast_options(port)
            .ssl_validate_cert(false)
            .timeout_connect(Duration::from_millis(300));
        let mut socket = Socket::tcp("127.0.0.1", options).await.unwrap();
        let (_peer, _) = listener.accept().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), socket.encrypt(true))
            .await
            .expect("handshake must be bounded by timeout_connect");

        assert!(matches!(result, Err(Error::Tls(_))));
        assert_eq!(socket.state(), SocketState::Disconnected);
        assert!(!socket.is_connected());
        assert!(socket.host().is_none());
    }

    #[tokio::test]
    async fn test_udp_with_use_ssl_fails_without_connecting() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let options = SocketOptions::default()
            .port(port)
            .transport(TransportKind::Udp4)
            .use_ssl(true);
        let mut socket = Socket::new(None, options);

        let err = socket.connect("127.0.0.1").await.unwrap_err();
        assert!(err.is_config());
        assert!(!socket.is_connected());
        assert_eq!(socket.state(), SocketState::Disconnected);
        assert!(socket.host().is_none());
    }

    #[tokio::test]
    async fn test_invalid_ca_file_fails_without_connecting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let options = fast_options(port)
            .use_ssl(true)
            .ssl_ca_file("/nonexistent/ldap-session-ca.pem");
        let mut socket = Socket::new(None, options);

        let err = socket.connect("127.0.0.1").await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(socket.state(), SocketState::Disconnected);

        // nothing was dialled
        let accepted =
            tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err());
    }

    /// Remembers the name and labels of every counter touched
    #[derive(Default)]
    struct CounterLog(std::sync::Mutex<Vec<(String, Vec<String>)>>);

    impl CounterLog {
        fn touched(&self, name: &str) -> Vec<Vec<String>> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, labels)| labels.clone())
                .collect()
        }
    }

    impl ::metrics::Recorder for CounterLog {
        fn describe_counter(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }
        fn describe_gauge(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }
        fn describe_histogram(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn register_counter(
            &self,
            key: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Counter {
            let labels = key
                .labels()
                .map(|l| format!("{}={}", l.key(), l.value()))
                .collect();
            self.0.lock().unwrap().push((key.name().to_string(), labels));
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    #[test]
    fn test_failed_implicit_tls_is_not_counted_as_opened() {
        use crate::metrics::labels;

        let log = CounterLog::default();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let err = ::metrics::with_local_recorder(&log, || {
            runtime.block_on(async {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = listener.local_addr().unwrap().port();
                let server = tokio::spawn(async move {
                    // hang up instead of answering the ClientHello
                    let (peer, _) = listener.accept().await.unwrap();
                    drop(peer);
                });

                let options = fast_options(port).use_ssl(true).ssl_validate_cert(false);
                let err = Socket::create("127.0.0.1", options).await.unwrap_err();
                server.await.unwrap();
                err
            })
        });

        assert!(matches!(err, Error::Tls(_)), "got {:?}", err);
        assert!(log.touched(labels::CONNECTIONS_OPENED).is_empty());
        assert!(log.touched(labels::CONNECTIONS_CLOSED).is_empty());
        let failed = log.touched(labels::CONNECTIONS_FAILED);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].contains(&format!("reason={}", labels::REASON_TLS)));
    }

    #[tokio::test]
    async fn test_udp_factory_options() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let socket = Socket::udp("127.0.0.1", SocketOptions::default().port(port))
            .await
            .unwrap();
        assert_eq!(socket.options().buffer_size, Some(65507));
        assert_eq!(socket.options().transport, TransportKind::Udp4);
        assert!(socket.is_connected());
    }

    #[tokio::test]
    async fn test_udp_encrypt_rejected() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let mut socket = Socket::udp("127.0.0.1", SocketOptions::default().port(port))
            .await
            .unwrap();
        let err = socket.encrypt(true).await.unwrap_err();
        assert!(err.is_config());
        // rejected before the stream was touched
        assert!(socket.is_connected());
    }

    #[tokio::test]
    async fn test_pre_bound_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();

        let mut socket = Socket::new(Some(stream.into()), SocketOptions::default());
        assert_eq!(socket.state(), SocketState::ConnectedPlain);
        assert!(socket.is_connected());

        socket.close().await;
        assert!(!socket.is_connected());
    }
}
