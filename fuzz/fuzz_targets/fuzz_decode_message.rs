#![no_main]

use bytes::{Buf, BytesMut};
use ldap_session::protocol::decode_message;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = BytesMut::from(data);

    // several messages may arrive in one segment
    while !buf.is_empty() {
        match decode_message(&buf) {
            Ok((_, consumed)) => {
                assert!(consumed > 0 && consumed <= buf.len());
                buf.advance(consumed);
            }
            Err(_) => break,
        }
    }
});
