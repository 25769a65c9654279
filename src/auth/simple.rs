//! Simple bind over LDAPv3

use crate::client::{BindCredential, Binder, ResolvedConfig};
use crate::connection::Socket;
use crate::protocol::constants::LDAP_VERSION;
use crate::protocol::{decode_message, encode_message, Request, Response, ResponseMessage};
use crate::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::time::Instant;
use tracing::Instrument;

/// [`Binder`] performing an LDAPv3 simple bind
///
/// When the configuration carries `starttls=true` and the socket is still
/// plaintext, the StartTLS extended operation runs first and the socket is
/// encrypted before any credential is sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBinder;

impl SimpleBinder {
    /// Create a simple binder
    pub fn new() -> Self {
        Self
    }
}

impl Binder for SimpleBinder {
    type Session = LdapSession;

    async fn bind(
        &self,
        socket: Socket,
        credential: &BindCredential,
        config: &ResolvedConfig,
    ) -> Result<LdapSession> {
        let starttls = config.starttls()?;
        let mut session = LdapSession::new(socket, config.base_dn().unwrap_or_default());

        let span = tracing::info_span!("bind", user = %credential.user);
        async {
            if starttls && !session.socket.is_encrypted() {
                session.start_tls().await?;
            }
            session.simple_bind(credential).await
        }
        .instrument(span)
        .await?;

        Ok(session)
    }
}

/// An authenticated LDAP connection
#[derive(Debug)]
pub struct LdapSession {
    socket: Socket,
    base_dn: String,
    next_message_id: i32,
    read_buf: BytesMut,
}

impl LdapSession {
    fn new(socket: Socket, base_dn: &str) -> Self {
        Self {
            socket,
            base_dn: base_dn.to_string(),
            next_message_id: 1,
            read_buf: BytesMut::new(),
        }
    }

    /// Underlying socket
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Underlying socket, for the protocol client that takes over
    pub fn socket_mut(&mut self) -> &mut Socket {
        &mut self.socket
    }

    /// Search base from the resolved configuration
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Message ID the next request will use
    pub fn next_message_id(&self) -> i32 {
        self.next_message_id
    }

    /// Hand the socket over, ending the session without unbinding
    ///
    /// Returns the socket together with any bytes already read off the wire
    /// but not yet decoded; the next protocol client must consume them first.
    pub fn into_parts(self) -> (Socket, Bytes) {
        (self.socket, self.read_buf.freeze())
    }

    /// Send an UnbindRequest and close the socket
    ///
    /// A failed send is logged; the socket is closed either way.
    pub async fn unbind(mut self) -> Result<()> {
        let message_id = self.allocate_message_id();
        if let Err(e) = self.send_message(message_id, &Request::Unbind).await {
            tracing::debug!(error = %e, "unbind request not sent");
        }
        self.socket.close().await;
        Ok(())
    }

    async fn start_tls(&mut self) -> Result<()> {
        tracing::debug!("requesting StartTLS");
        let response = self.request(&Request::StartTls).await?;

        match response.response {
            Response::Extended { result, .. } if result.is_success() => {
                if !self.read_buf.is_empty() {
                    return Err(Error::Protocol(
                        "unexpected data after StartTLS response".into(),
                    ));
                }
                self.socket.encrypt(true).await
            }
            Response::Extended { result, .. } => Err(Error::Protocol(format!(
                "StartTLS refused with result code {}: {}",
                result.code, result.message
            ))),
            other => Err(Error::Protocol(format!(
                "unexpected response to StartTLS: {:?}",
                other
            ))),
        }
    }

    async fn simple_bind(&mut self, credential: &BindCredential) -> Result<()> {
        let started = Instant::now();
        crate::metrics::counters::bind_attempted();

        let request = Request::Bind {
            version: LDAP_VERSION,
            name: credential.user.clone(),
            password: credential.password.clone(),
        };
        let response = self.request(&request).await;
        crate::metrics::histograms::bind_duration(started.elapsed().as_millis() as u64);

        let outcome = match response {
            Ok(ResponseMessage {
                response: Response::Bind(result),
                ..
            }) if result.is_success() => Ok(()),
            Ok(ResponseMessage {
                response: Response::Bind(result),
                ..
            }) => Err(Error::Bind {
                code: result.code,
                message: result.message,
            }),
            Ok(other) => Err(Error::Protocol(format!(
                "unexpected response to bind: {:?}",
                other.response
            ))),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(()) => {
                crate::metrics::counters::bind_completed(crate::metrics::labels::OUTCOME_SUCCESS);
                tracing::info!(anonymous = credential.is_empty(), "bind successful");
            }
            Err(e) => {
                crate::metrics::counters::bind_completed(crate::metrics::labels::OUTCOME_FAILURE);
                tracing::warn!(error = %e, "bind failed");
            }
        }
        outcome
    }

    /// Send a request and wait for the response carrying its message ID
    async fn request(&mut self, request: &Request) -> Result<ResponseMessage> {
        let message_id = self.allocate_message_id();
        self.send_message(message_id, request).await?;

        loop {
            let msg = self.receive_message().await?;
            if msg.message_id == message_id {
                return Ok(msg);
            }
            if msg.message_id == 0 {
                // unsolicited notification, e.g. notice of disconnection
                let detail = match &msg.response {
                    Response::Extended { result, .. } => {
                        format!("code {}: {}", result.code, result.message)
                    }
                    other => format!("{:?}", other),
                };
                return Err(Error::Protocol(format!(
                    "server sent unsolicited notification ({})",
                    detail
                )));
            }
            tracing::debug!(
                expected = message_id,
                got = msg.message_id,
                "skipping response for another message"
            );
        }
    }

    fn allocate_message_id(&mut self) -> i32 {
        let id = self.next_message_id;
        self.next_message_id = match id.checked_add(1) {
            Some(next) => next,
            None => 1,
        };
        id
    }

    async fn send_message(&mut self, message_id: i32, request: &Request) -> Result<()> {
        let buf = encode_message(message_id, request);
        self.socket.write(&buf).await
    }

    async fn receive_message(&mut self) -> Result<ResponseMessage> {
        loop {
            match decode_message(&self.read_buf) {
                Ok((msg, consumed)) => {
                    self.read_buf.advance(consumed);
                    return Ok(msg);
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
                Err(e) => return Err(Error::Protocol(e.to_string())),
            }

            if let Some(chunk) = self.socket.read(true).await? {
                self.read_buf.extend_from_slice(&chunk);
            }
        }
    }
}
