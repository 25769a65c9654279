//! Protocol message decoding

use super::constants::tags;
use super::message::{LdapResult, Response, ResponseMessage};
use std::io;

/// Maximum accepted LDAPMessage length (16 MiB)
///
/// Checked against the length header before anything is buffered, so a crafted
/// header cannot make the reader allocate without bound.
pub const MAX_MESSAGE_LENGTH: usize = 16 * 1024 * 1024;

/// Decode one LDAPMessage from the front of `data`
///
/// # Returns
/// `Ok((msg, consumed))` - Message and number of bytes consumed
/// `Err(e)` with [`io::ErrorKind::UnexpectedEof`] - more bytes are needed
/// `Err(e)` with [`io::ErrorKind::InvalidData`] - the message is malformed
pub fn decode_message(data: &[u8]) -> io::Result<(ResponseMessage, usize)> {
    let (content, consumed) = frame(data)?;
    let mut reader = Reader::new(content);

    let message_id = reader.expect(tags::INTEGER)?;
    let message_id = i32::try_from(read_integer(message_id)?)
        .map_err(|_| invalid("message ID out of range"))?;

    let (tag, op) = reader.read_tlv()?;
    let response = match tag {
        tags::BIND_RESPONSE => Response::Bind(read_result(&mut Reader::new(op))?),
        tags::EXTENDED_RESPONSE => decode_extended_response(op)?,
        _ => Response::Other { tag },
    };

    Ok((
        ResponseMessage {
            message_id,
            response,
        },
        consumed,
    ))
}

/// Split off one complete outer SEQUENCE
fn frame(data: &[u8]) -> io::Result<(&[u8], usize)> {
    if data.len() < 2 {
        return Err(incomplete("incomplete message header"));
    }
    if data[0] != tags::SEQUENCE {
        return Err(invalid(format!(
            "expected LDAPMessage sequence, got tag 0x{:02x}",
            data[0]
        )));
    }

    let (len, header) = match read_length(&data[1..])? {
        Some(parsed) => parsed,
        None => return Err(incomplete("incomplete message length")),
    };

    if len > MAX_MESSAGE_LENGTH {
        return Err(invalid(format!(
            "message length {} exceeds maximum allowed {}",
            len, MAX_MESSAGE_LENGTH
        )));
    }

    let start = 1 + header;
    let end = start + len;
    if data.len() < end {
        return Err(incomplete("incomplete message body"));
    }

    Ok((&data[start..end], end))
}

fn decode_extended_response(op: &[u8]) -> io::Result<Response> {
    let mut reader = Reader::new(op);
    let result = read_result(&mut reader)?;

    let mut name = None;
    while !reader.is_empty() {
        let (tag, value) = reader.read_tlv()?;
        if tag == tags::EXTENDED_RESPONSE_NAME {
            name = Some(String::from_utf8_lossy(value).into_owned());
        }
    }

    Ok(Response::Extended { result, name })
}

/// resultCode, matchedDN, diagnosticMessage; referral and anything after is skipped
fn read_result(reader: &mut Reader<'_>) -> io::Result<LdapResult> {
    let code = read_integer(reader.expect(tags::ENUMERATED)?)?;
    let code = u32::try_from(code).map_err(|_| invalid("negative result code"))?;
    let matched_dn = String::from_utf8_lossy(reader.expect(tags::OCTET_STRING)?).into_owned();
    let message = String::from_utf8_lossy(reader.expect(tags::OCTET_STRING)?).into_owned();

    Ok(LdapResult {
        code,
        matched_dn,
        message,
    })
}

/// Definite-form length; `Ok(None)` when the length bytes are not all there
fn read_length(data: &[u8]) -> io::Result<Option<(usize, usize)>> {
    let Some(&first) = data.first() else {
        return Ok(None);
    };

    if first & 0x80 == 0 {
        return Ok(Some((first as usize, 1)));
    }

    let count = (first & 0x7F) as usize;
    if count == 0 {
        return Err(invalid("indefinite length is not allowed"));
    }
    if count > 4 {
        return Err(invalid(format!("length field of {} bytes is too large", count)));
    }
    if data.len() < 1 + count {
        return Ok(None);
    }

    let len = data[1..=count]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok(Some((len, 1 + count)))
}

fn read_integer(bytes: &[u8]) -> io::Result<i64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(invalid(format!("integer of {} bytes", bytes.len())));
    }

    let sign = if bytes[0] & 0x80 != 0 { -1i64 } else { 0 };
    Ok(bytes.iter().fold(sign, |acc, &b| (acc << 8) | b as i64))
}

/// Cursor over the elements of one constructed value
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn read_tlv(&mut self) -> io::Result<(u8, &'a [u8])> {
        let Some(&tag) = self.data.first() else {
            return Err(invalid("unexpected end of element"));
        };
        let (len, header) =
            read_length(&self.data[1..])?.ok_or_else(|| invalid("truncated element length"))?;

        let start = 1 + header;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| invalid("truncated element"))?;

        let value = &self.data[start..end];
        self.data = &self.data[end..];
        Ok((tag, value))
    }

    fn expect(&mut self, expected: u8) -> io::Result<&'a [u8]> {
        let (tag, value) = self.read_tlv()?;
        if tag != expected {
            return Err(invalid(format!(
                "expected tag 0x{:02x}, got 0x{:02x}",
                expected, tag
            )));
        }
        Ok(value)
    }
}

fn incomplete(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, message)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}
