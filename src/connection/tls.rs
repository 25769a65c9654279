//! TLS configuration for implicit (LDAPS) and upgraded (StartTLS) connections.
//!
//! The certificate policy comes from two socket options:
//!
//! * `ssl_validate_cert = false`: any server certificate is accepted
//! * `ssl_validate_cert = true` and `ssl_allow_self_signed = Some(true)`: normal
//!   WebPKI validation, except that an unknown issuer is tolerated
//! * otherwise: normal WebPKI validation against the configured roots

use super::options::SocketOptions;
use crate::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pemfile::Item;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::fs;
use std::net::IpAddr;
use std::sync::Arc;

/// TLS configuration for directory connections.
///
/// # Examples
///
/// ```ignore
/// use ldap_session::connection::TlsConfig;
///
/// // System roots, full validation
/// let tls = TlsConfig::builder().build()?;
///
/// // Private CA
/// let tls = TlsConfig::builder()
///     .ca_cert_path("/etc/ldap/ca.pem")
///     .build()?;
///
/// // Lab servers with self-signed certificates
/// let tls = TlsConfig::builder()
///     .allow_self_signed(true)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    /// Path to CA certificate file (None = use system roots)
    ca_cert_path: Option<String>,
    /// Whether the certificate chain is validated at all
    validate_cert: bool,
    /// Whether an unknown issuer is tolerated during validation
    allow_self_signed: bool,
    /// Compiled rustls ClientConfig
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Build the TLS configuration matching a socket's `ssl_*` options.
    pub fn from_options(options: &SocketOptions) -> Result<Self> {
        let mut builder = Self::builder()
            .validate_cert(options.ssl_validate_cert)
            .allow_self_signed(options.ssl_allow_self_signed.unwrap_or(false));
        if let Some(path) = &options.ssl_ca_file {
            builder = builder.ca_cert_path(path);
        }
        builder.build()
    }

    /// Get the rustls ClientConfig for this TLS configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// Check if certificate validation is enabled.
    pub fn validate_cert(&self) -> bool {
        self.validate_cert
    }

    /// Check if self-signed certificates are tolerated.
    pub fn allow_self_signed(&self) -> bool {
        self.allow_self_signed
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_cert_path", &self.ca_cert_path)
            .field("validate_cert", &self.validate_cert)
            .field("allow_self_signed", &self.allow_self_signed)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for TLS configuration.
pub struct TlsConfigBuilder {
    ca_cert_path: Option<String>,
    validate_cert: bool,
    allow_self_signed: bool,
}

impl Default for TlsConfigBuilder {
    fn default() -> Self {
        Self {
            ca_cert_path: None,
            validate_cert: true,
            allow_self_signed: false,
        }
    }
}

impl TlsConfigBuilder {
    /// Set the path to a custom CA certificate file (PEM format).
    ///
    /// If not set, system root certificates will be used.
    pub fn ca_cert_path(mut self, path: impl Into<String>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    /// Enable or disable certificate validation (default: enabled).
    ///
    /// Disabling it accepts any certificate the server presents, which leaves
    /// the connection open to interception. Handshake signatures are still
    /// checked.
    pub fn validate_cert(mut self, validate: bool) -> Self {
        self.validate_cert = validate;
        self
    }

    /// Tolerate certificates whose issuer is unknown (default: disabled).
    pub fn allow_self_signed(mut self, allow: bool) -> Self {
        self.allow_self_signed = allow;
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - CA certificate file cannot be read
    /// - CA certificate is invalid PEM
    /// - no root certificates could be loaded while validation is enabled
    pub fn build(self) -> Result<TlsConfig> {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Config(format!("unable to configure TLS: {}", e)))?;

        let client_config = if !self.validate_cert {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert { provider }))
                .with_no_client_auth()
        } else {
            let root_store = Arc::new(self.load_roots()?);
            let webpki = WebPkiServerVerifier::builder_with_provider(root_store, provider)
                .build()
                .map_err(|e| Error::Config(format!("unable to build certificate verifier: {}", e)))?;

            if self.allow_self_signed {
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(TolerateUnknownIssuer {
                        inner: webpki,
                    }))
                    .with_no_client_auth()
            } else {
                builder
                    .with_webpki_verifier(webpki)
                    .with_no_client_auth()
            }
        };

        Ok(TlsConfig {
            ca_cert_path: self.ca_cert_path,
            validate_cert: self.validate_cert,
            allow_self_signed: self.allow_self_signed,
            client_config: Arc::new(client_config),
        })
    }

    fn load_roots(&self) -> Result<RootCertStore> {
        if let Some(ca_path) = &self.ca_cert_path {
            return load_custom_ca(ca_path);
        }

        let result = rustls_native_certs::load_native_certs();
        let mut store = RootCertStore::empty();
        for cert in result.certs {
            let _ = store.add_parsable_certificates(std::iter::once(cert));
        }

        if store.is_empty() {
            tracing::debug!(
                errors = result.errors.len(),
                "no system root certificates found, using bundled webpki roots"
            );
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        Ok(store)
    }
}

/// Load a custom CA certificate bundle from a PEM file.
fn load_custom_ca(ca_path: &str) -> Result<RootCertStore> {
    let ca_cert_data = fs::read(ca_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read CA certificate file '{}': {}",
            ca_path, e
        ))
    })?;

    let mut reader = std::io::Cursor::new(&ca_cert_data);
    let mut root_store = RootCertStore::empty();
    let mut found_certs = 0;

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(cert))) => {
                let _ = root_store.add_parsable_certificates(std::iter::once(cert));
                found_certs += 1;
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => {
                return Err(Error::Config(format!(
                    "Failed to parse CA certificate from '{}'",
                    ca_path
                )));
            }
        }
    }

    if found_certs == 0 {
        return Err(Error::Config(format!(
            "No valid certificates found in '{}'",
            ca_path
        )));
    }

    Ok(root_store)
}

/// Accepts any server certificate; handshake signatures are still verified.
#[derive(Debug)]
struct AcceptAnyCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// WebPKI validation that lets an unknown issuer through.
#[derive(Debug)]
struct TolerateUnknownIssuer {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for TolerateUnknownIssuer {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Err(rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer)) => {
                tracing::debug!(server = ?server_name, "accepting certificate from unknown issuer");
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Parse server name from host for TLS SNI (Server Name Indication).
///
/// Accepts DNS names (a trailing dot is removed) and IPv4/IPv6 literals
/// (IPv6 brackets are removed).
///
/// # Errors
///
/// Returns an error if the host is empty, too long, or contains characters
/// not valid in a host name.
pub fn parse_server_name(host: &str) -> Result<String> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }

    let hostname = host.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.' || c == '_')
    {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    Ok(hostname.to_string())
}
