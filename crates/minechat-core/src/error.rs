//! Error types for the connection core.
//!
//! Strongly-typed errors per concern: handshake decoding ([`AuthError`]),
//! channel state bookkeeping ([`LifecycleError`]) and the supervisor state
//! machine ([`SupervisorError`]). Socket errors never appear here; they are
//! classified by `minechat-client` and arrive as a [`crate::Fault`].

use thiserror::Error;

use crate::{
    event::{Channel, ConnectionState},
    supervisor::SupervisorState,
};

/// Handshake failures. None of them heal by reconnecting with the same input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Server answered `null` or `{}`: it does not know the token.
    #[error("invalid token: server did not recognize it")]
    InvalidToken,

    /// Server reply could not be decoded as the expected JSON object.
    #[error("malformed handshake reply: {reply:?}")]
    MalformedReply {
        /// The raw reply line.
        reply: String,
    },

    /// Server refused to create the account.
    #[error("registration rejected: {reply:?}")]
    RegistrationRejected {
        /// The raw reply line.
        reply: String,
    },
}

/// Invalid channel state transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The transition would break `Initiated → Established → Closed`.
    #[error("invalid {channel} transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Channel whose lifecycle was advanced.
        channel: Channel,
        /// State before the attempt (`None` before `Initiated`).
        from: Option<ConnectionState>,
        /// Requested state.
        to: ConnectionState,
    },
}

/// Out-of-order call into the supervisor state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// Operation not valid in the current state.
    #[error("invalid supervisor state: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the call was made.
        state: SupervisorState,
        /// Operation that was attempted.
        operation: &'static str,
    },
}
