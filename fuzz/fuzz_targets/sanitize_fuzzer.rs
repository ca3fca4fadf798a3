//! Fuzz target for outgoing text sanitization
//!
//! # Invariants
//!
//! - A sanitized message never contains an empty line (`\n\n`)
//! - Sanitizing twice changes nothing
//! - The framed body neither starts nor ends with a newline
//! - A sanitized nickname contains no newline and no backslash

#![no_main]

use libfuzzer_sys::fuzz_target;
use minechat_core::protocol;

fuzz_target!(|text: String| {
    let message = protocol::sanitize_message(&text);
    assert!(!message.contains("\n\n"), "frame break survived: {message:?}");
    assert_eq!(protocol::sanitize_message(&message), message);

    let body = protocol::frame_body(&message);
    assert!(!body.starts_with('\n') && !body.ends_with('\n'));

    let nickname = protocol::sanitize_nickname(&text);
    assert!(!nickname.contains('\n'));
    assert!(!nickname.contains('\\'));
});
