//! Protocol message encoding

use super::constants::{tags, STARTTLS_OID};
use super::message::Request;
use bytes::{BufMut, BytesMut};

/// Encode a request wrapped in an LDAPMessage envelope
pub fn encode_message(message_id: i32, request: &Request) -> BytesMut {
    let mut body = BytesMut::new();
    put_integer(&mut body, tags::INTEGER, message_id);

    match request {
        Request::Bind {
            version,
            name,
            password,
        } => encode_bind(&mut body, *version, name, password),
        Request::StartTls => encode_starttls(&mut body),
        Request::Unbind => {
            body.put_u8(tags::UNBIND_REQUEST);
            body.put_u8(0);
        }
    }

    let mut buf = BytesMut::with_capacity(body.len() + 6);
    put_tlv(&mut buf, tags::SEQUENCE, &body);
    buf
}

fn encode_bind(buf: &mut BytesMut, version: i32, name: &str, password: &str) {
    let mut op = BytesMut::new();
    put_integer(&mut op, tags::INTEGER, version);
    put_tlv(&mut op, tags::OCTET_STRING, name.as_bytes());
    put_tlv(&mut op, tags::AUTH_SIMPLE, password.as_bytes());
    put_tlv(buf, tags::BIND_REQUEST, &op);
}

fn encode_starttls(buf: &mut BytesMut) {
    let mut op = BytesMut::new();
    put_tlv(&mut op, tags::EXTENDED_REQUEST_NAME, STARTTLS_OID.as_bytes());
    put_tlv(buf, tags::EXTENDED_REQUEST, &op);
}

fn put_tlv(buf: &mut BytesMut, tag: u8, content: &[u8]) {
    buf.put_u8(tag);
    put_length(buf, content.len());
    buf.put_slice(content);
}

/// Definite-form length: short form below 128, long form otherwise
fn put_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        buf.put_u8(len as u8);
        return;
    }

    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    buf.put_u8(0x80 | (bytes.len() - skip) as u8);
    buf.put_slice(&bytes[skip..]);
}

/// Minimal two's-complement INTEGER/ENUMERATED
fn put_integer(buf: &mut BytesMut, tag: u8, value: i32) {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    put_tlv(buf, tag, &bytes[start..]);
}
