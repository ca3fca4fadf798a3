//! Fuzz target for handshake reply decoding
//!
//! The reply line comes straight from the server. Decoding should NEVER
//! panic; anything that is not the expected JSON object is an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use minechat_core::{AuthError, protocol};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);

    match protocol::parse_auth_reply(&line) {
        Ok(_) | Err(AuthError::InvalidToken | AuthError::MalformedReply { .. }) => {},
        Err(err @ AuthError::RegistrationRejected { .. }) => {
            panic!("authorization produced a registration error: {err}")
        },
    }

    if let Ok(registration) = protocol::parse_registration_reply(&line) {
        assert!(!registration.account_hash.is_empty());
    }
});
