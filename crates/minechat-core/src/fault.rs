//! Cycle termination.
//!
//! Every member of a cycle runs forever; when one stops it yields a [`Fault`]
//! explaining why. The supervisor branches on the variant instead of
//! inferring intent from error types: a watchdog timeout, a stop request and a
//! fatal protocol condition are three different things.

use std::{fmt, time::Duration};

use crate::{error::AuthError, event::Channel};

/// Why a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// No liveness tick arrived within the window.
    TimedOut {
        /// Time since the last tick (or since the watchdog started).
        silent_for: Duration,
    },

    /// The cycle was asked to stop.
    Cancelled,

    /// A member hit a condition that ends the cycle.
    Fatal(FatalReason),
}

/// Detail of a [`Fault::Fatal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// Opening the channel's socket failed.
    Connect {
        /// Channel that failed to connect.
        channel: Channel,
        /// Underlying error.
        message: String,
    },

    /// Reading or writing the socket failed.
    Io {
        /// Channel whose socket failed.
        channel: Channel,
        /// Underlying error.
        message: String,
    },

    /// The server closed the connection.
    EndOfStream {
        /// Channel that saw end-of-stream.
        channel: Channel,
    },

    /// The server rejected the token.
    InvalidToken,

    /// The server's handshake reply was not the expected JSON.
    MalformedHandshake {
        /// The raw reply line.
        reply: String,
    },
}

impl Fault {
    /// Returns true if a fresh cycle may succeed.
    ///
    /// Connectivity problems and watchdog timeouts are transient.
    /// Authentication and decode faults are not: reconnecting with the same
    /// token produces the same answer. Cancellation is a stop request, not a
    /// failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TimedOut { .. } => true,
            Self::Cancelled => false,
            Self::Fatal(reason) => !reason.is_auth_failure(),
        }
    }

    /// Returns true if the fault came from the token handshake.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Fatal(reason) if reason.is_auth_failure())
    }
}

impl FatalReason {
    /// Returns true for token rejection and undecodable handshake replies.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidToken | Self::MalformedHandshake { .. })
    }
}

impl From<AuthError> for FatalReason {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => Self::InvalidToken,
            AuthError::MalformedReply { reply } | AuthError::RegistrationRejected { reply } => {
                Self::MalformedHandshake { reply }
            },
        }
    }
}

impl From<FatalReason> for Fault {
    fn from(reason: FatalReason) -> Self {
        Self::Fatal(reason)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut { silent_for } => write!(f, "no activity for {silent_for:?}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Fatal(reason) => write!(f, "{reason}"),
        }
    }
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { channel, message } => write!(f, "{channel} connect failed: {message}"),
            Self::Io { channel, message } => write!(f, "{channel} socket error: {message}"),
            Self::EndOfStream { channel } => write!(f, "{channel} connection closed by server"),
            Self::InvalidToken => f.write_str("invalid token"),
            Self::MalformedHandshake { reply } => write!(f, "malformed handshake reply {reply:?}"),
        }
    }
}
