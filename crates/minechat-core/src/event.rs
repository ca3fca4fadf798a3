//! Data model shared between the connection core and its collaborators.
//!
//! The core publishes three outbound streams (incoming message text, history
//! text, [`StatusEvent`]s), one user-facing [`Alert`] stream, and consumes one
//! inbound stream of [`OutgoingMessage`]s. [`LivenessTick`]s never leave the
//! core; only the watchdog reads them.

use std::{borrow::Cow, fmt};

use crate::protocol;

/// One direction of the protocol, each bound to its own TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Incoming chat messages.
    Read,
    /// Outgoing chat messages and authentication.
    Write,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Connection state of one channel within one cycle.
///
/// Transitions are `Initiated → Established → Closed` (or `Initiated →
/// Closed` when the connection never came up). See
/// [`crate::lifecycle::ChannelLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Connecting.
    Initiated,
    /// Socket open (and, for the write side, authenticated).
    Established,
    /// Terminated by error or cancellation.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiated => f.write_str("establishing connection"),
            Self::Established => f.write_str("connection established"),
            Self::Closed => f.write_str("connection closed"),
        }
    }
}

/// User identity produced by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Nickname the server associates with the token.
    pub nickname: String,
}

/// Account created by the registration handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Nickname as accepted by the server.
    pub nickname: String,
    /// Token to authenticate with from now on.
    pub account_hash: String,
}

/// Connection status update for presentation.
///
/// Ordering across variants is irrelevant; within one channel the state
/// sequence is strictly ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A channel changed state.
    ConnectionStateChanged {
        /// Which channel.
        channel: Channel,
        /// New state.
        state: ConnectionState,
    },
    /// The write channel authenticated.
    IdentityResolved {
        /// Nickname reported by the server.
        nickname: String,
    },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionStateChanged { channel, state } => write!(f, "{channel}: {state}"),
            Self::IdentityResolved { nickname } => write!(f, "nickname: {nickname}"),
        }
    }
}

/// What kind of activity produced a [`LivenessTick`].
///
/// Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessSource {
    /// The read channel received a message.
    MessageReceived,
    /// The write channel transmitted a message.
    MessageSent,
    /// The write channel authenticated.
    Authorized,
    /// A keepalive ping completed a round trip.
    Keepalive,
}

impl fmt::Display for LivenessSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageReceived => f.write_str("new message in chat"),
            Self::MessageSent => f.write_str("message sent"),
            Self::Authorized => f.write_str("authorization done"),
            Self::Keepalive => f.write_str("keepalive"),
        }
    }
}

/// Signal that some successful protocol activity occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessTick {
    /// What produced the tick.
    pub source: LivenessSource,
}

impl LivenessTick {
    /// Create a tick from `source`.
    pub fn new(source: LivenessSource) -> Self {
        Self { source }
    }
}

/// One line of user-authored text waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage(String);

impl OutgoingMessage {
    /// Wrap user text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The text as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text with embedded frame terminators removed.
    pub fn sanitized(&self) -> Cow<'_, str> {
        protocol::sanitize_message(&self.0)
    }

    /// The message line to transmit, or `None` when nothing is left to send.
    pub fn wire_text(&self) -> Option<String> {
        let sanitized = self.sanitized();
        let body = protocol::frame_body(&sanitized);
        (!body.is_empty()).then(|| body.to_string())
    }
}

impl From<String> for OutgoingMessage {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for OutgoingMessage {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// User-facing error that needs intervention.
///
/// Distinct from a `Closed` status: the remedy is fixing configuration, not
/// waiting for a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// The server did not recognize the token.
    InvalidToken,
    /// The server answered the handshake with something that is not JSON.
    MalformedHandshake {
        /// The raw reply line.
        reply: String,
    },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => {
                f.write_str("invalid token: the server did not recognize it, check the token")
            },
            Self::MalformedHandshake { reply } => {
                write!(f, "unexpected handshake reply from server: {reply:?}")
            },
        }
    }
}
