//! Line protocol.
//!
//! Both ports speak `\n`-terminated UTF-8 lines. The write port additionally
//! runs a token handshake whose final line is a JSON object:
//!
//! ```text
//! server: greeting line
//! client: <token>\n
//! server: {"nickname": "...", "account_hash": "..."}   (or `null`)
//! ```
//!
//! Each user message is then framed as the message line followed by an empty
//! line, so a message must never carry an empty line of its own.

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::AuthError,
    event::{Identity, Registration},
};

/// Terminator of every protocol line.
pub const LINE_TERMINATOR: &str = "\n";

/// Longest line accepted from a peer, terminator excluded.
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// The sequence that would end a message frame early.
const FRAME_BREAK: &str = "\n\n";

/// Successful handshake reply body.
#[derive(Debug, Deserialize)]
struct AuthReply {
    nickname: String,
}

/// Registration reply body.
#[derive(Debug, Deserialize)]
struct RegistrationReply {
    nickname: String,
    #[serde(default)]
    account_hash: Option<String>,
}

/// Remove every `\n\n` from user text.
///
/// Pairs are removed left to right without overlap, so a run of `k` newlines
/// collapses to `k mod 2`. The result never contains two consecutive
/// newlines, and text that already satisfies that is returned borrowed.
pub fn sanitize_message(text: &str) -> Cow<'_, str> {
    if text.contains(FRAME_BREAK) {
        Cow::Owned(text.replace(FRAME_BREAK, ""))
    } else {
        Cow::Borrowed(text)
    }
}

/// The part of a sanitized message that goes on the message line.
///
/// Leading and trailing newlines are dropped: written as-is they would put an
/// empty line before the text or end the frame right after it. An empty
/// result means there is nothing to send.
pub fn frame_body(sanitized: &str) -> &str {
    sanitized.trim_matches('\n')
}

/// Clean a nickname before registration.
///
/// Drops newline characters, runs of backslashes, and a backslash run
/// followed by `n` (a literal `\n` escape typed by the user).
pub fn sanitize_nickname(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {},
            '\\' => {
                while chars.next_if_eq(&'\\').is_some() {}
                if chars.peek() == Some(&'n') {
                    chars.next();
                }
            },
            _ => cleaned.push(c),
        }
    }

    cleaned
}

/// Strip one trailing `\n` (and a preceding `\r`, if any).
pub fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Decode the final handshake line into an [`Identity`].
///
/// # Errors
///
/// - `AuthError::InvalidToken` if the reply is `null` or an empty object (the
///   server's answer to an unknown token)
/// - `AuthError::MalformedReply` if the reply is not JSON, not an object, or
///   lacks a `nickname`
pub fn parse_auth_reply(line: &str) -> Result<Identity, AuthError> {
    let raw = strip_line_terminator(line);
    let value = decode_object(raw)?;
    let reply: AuthReply = serde_json::from_value(value).map_err(|_| malformed(raw))?;

    Ok(Identity { nickname: reply.nickname })
}

/// Decode the final registration line into a [`Registration`].
///
/// # Errors
///
/// - `AuthError::RegistrationRejected` if the reply is `null`, empty, or has no
///   `account_hash`
/// - `AuthError::MalformedReply` if the reply is not a JSON object
pub fn parse_registration_reply(line: &str) -> Result<Registration, AuthError> {
    let raw = strip_line_terminator(line);
    let rejected = || AuthError::RegistrationRejected { reply: raw.to_string() };

    let value = decode_object(raw).map_err(|err| match err {
        AuthError::InvalidToken => rejected(),
        other => other,
    })?;
    let reply: RegistrationReply = serde_json::from_value(value).map_err(|_| malformed(raw))?;

    match reply.account_hash {
        Some(account_hash) if !account_hash.is_empty() => {
            Ok(Registration { nickname: reply.nickname, account_hash })
        },
        _ => Err(rejected()),
    }
}

/// Parse `raw` as a non-empty JSON object.
fn decode_object(raw: &str) -> Result<Value, AuthError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| malformed(raw))?;

    match &value {
        Value::Null => Err(AuthError::InvalidToken),
        Value::Object(fields) if fields.is_empty() => Err(AuthError::InvalidToken),
        Value::Object(_) => Ok(value),
        _ => Err(malformed(raw)),
    }
}

fn malformed(raw: &str) -> AuthError {
    AuthError::MalformedReply { reply: raw.to_string() }
}
