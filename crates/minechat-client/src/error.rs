//! Client error types.
//!
//! [`ConnectError`] separates name resolution from everything else because
//! only resolution failures are retried by the line connection.
//! [`ChannelError`] is what a channel loop stops with; it becomes a
//! [`Fault`] once tagged with its channel. [`RunError`] is the supervisor's
//! terminal outcome.

use std::io;

use minechat_core::{AuthError, Channel, FatalReason, Fault, SupervisorError};
use thiserror::Error;

/// Failure to open a TCP connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The host name could not be resolved.
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        /// Host being resolved.
        host: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// The host resolved but the connection could not be opened.
    #[error("cannot connect to {host}:{port}: {source}")]
    Connect {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Socket error.
        #[source]
        source: io::Error,
    },
}

impl ConnectError {
    /// Returns true if the line connection should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Resolve { .. })
    }
}

/// Why a channel loop stopped.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The socket could not be opened.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Reading or writing the socket failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// The handshake failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ChannelError {
    /// Tag the error with the channel it happened on.
    pub fn into_fault(self, channel: Channel) -> Fault {
        let reason = match self {
            Self::Connect(err) => FatalReason::Connect { channel, message: err.to_string() },
            Self::Io(err) => FatalReason::Io { channel, message: err.to_string() },
            Self::Closed => FatalReason::EndOfStream { channel },
            Self::Auth(err) => FatalReason::from(err),
        };
        Fault::Fatal(reason)
    }
}

/// Terminal outcome of [`crate::ConnectionSupervisor::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The server rejected the token.
    #[error("invalid token: the server did not recognize it")]
    InvalidToken,

    /// The server's handshake reply could not be decoded.
    #[error("malformed handshake reply: {reply:?}")]
    MalformedHandshake {
        /// The raw reply line.
        reply: String,
    },

    /// The supervisor state machine was driven out of order.
    #[error("internal error: {0}")]
    Internal(#[from] SupervisorError),
}
