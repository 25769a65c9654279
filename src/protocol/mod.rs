//! LDAPv3 wire protocol (the subset needed to bind)
//!
//! Requests are BER-encoded LDAPMessage envelopes carrying a simple
//! BindRequest, the StartTLS ExtendedRequest or an UnbindRequest. Responses
//! are framed by their BER length and decoded into [`ResponseMessage`].

pub mod constants;
mod decode;
mod encode;
mod message;

pub use decode::{decode_message, MAX_MESSAGE_LENGTH};
pub use encode::encode_message;
pub use message::{LdapResult, Request, Response, ResponseMessage};
