//! Per-channel connection state.
//!
//! ```text
//! (none) ──> Initiated ──> Established ──> Closed
//!                │                           ▲
//!                └───────────────────────────┘
//! ```
//!
//! One [`ChannelLifecycle`] exists per channel per cycle. It only moves
//! forward, so every [`StatusEvent`] it produces is part of a strictly ordered
//! sequence with no repeated states. A new cycle starts from a fresh value.

use crate::{
    error::LifecycleError,
    event::{Channel, ConnectionState, StatusEvent},
};

/// Monotonic state tracker for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLifecycle {
    channel: Channel,
    state: Option<ConnectionState>,
}

impl ChannelLifecycle {
    /// Fresh tracker, before `Initiated`.
    pub fn new(channel: Channel) -> Self {
        Self { channel, state: None }
    }

    /// Channel being tracked.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Current state, `None` before the first transition.
    pub fn state(&self) -> Option<ConnectionState> {
        self.state
    }

    /// Move to `next` and return the status event to publish.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::InvalidTransition` if `next` is not a forward step
    ///   from the current state
    pub fn advance(&mut self, next: ConnectionState) -> Result<StatusEvent, LifecycleError> {
        let allowed = matches!(
            (self.state, next),
            (None, ConnectionState::Initiated)
                | (Some(ConnectionState::Initiated), ConnectionState::Established)
                | (
                    Some(ConnectionState::Initiated | ConnectionState::Established),
                    ConnectionState::Closed
                )
        );

        if !allowed {
            return Err(LifecycleError::InvalidTransition {
                channel: self.channel,
                from: self.state,
                to: next,
            });
        }

        self.state = Some(next);
        Ok(StatusEvent::ConnectionStateChanged { channel: self.channel, state: next })
    }

    /// Close the channel if it was ever initiated and is not closed yet.
    ///
    /// Returns the `Closed` event to publish, or `None` when there is nothing
    /// to report. Safe to call from every exit path.
    pub fn close(&mut self) -> Option<StatusEvent> {
        match self.state {
            Some(ConnectionState::Initiated | ConnectionState::Established) => {
                self.advance(ConnectionState::Closed).ok()
            },
            None | Some(ConnectionState::Closed) => None,
        }
    }
}
