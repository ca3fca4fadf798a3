//! Outgoing message queue.
//!
//! Producers push [`OutgoingMessage`]s into an unbounded queue; the write
//! channel is its only consumer. The [`Outbox`] outlives cycles and remembers
//! the message currently being transmitted, so a teardown in the middle of a
//! send is resolved by [`UndeliveredPolicy`] instead of by accident.

use minechat_core::{OutgoingMessage, UndeliveredPolicy};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Producer handle for the outgoing queue.
pub type OutboxSender = UnboundedSender<OutgoingMessage>;

/// Create an outgoing queue.
pub fn outbox(policy: UndeliveredPolicy) -> (OutboxSender, Outbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Outbox { queue: rx, in_flight: None, policy })
}

/// Consumer side of the outgoing queue.
#[derive(Debug)]
pub struct Outbox {
    queue: UnboundedReceiver<OutgoingMessage>,
    in_flight: Option<OutgoingMessage>,
    policy: UndeliveredPolicy,
}

impl Outbox {
    /// Next message to transmit.
    ///
    /// A message left in flight by the previous cycle comes first. Returns
    /// `None` once every producer is gone and nothing is left. Cancel safe.
    pub async fn next(&mut self) -> Option<OutgoingMessage> {
        if let Some(message) = &self.in_flight {
            return Some(message.clone());
        }

        let message = self.queue.recv().await?;
        self.in_flight = Some(message.clone());
        Some(message)
    }

    /// The in-flight message has been fully written.
    pub fn delivered(&mut self) {
        self.in_flight = None;
    }

    /// Message taken from the queue but not confirmed delivered.
    pub fn in_flight(&self) -> Option<&OutgoingMessage> {
        self.in_flight.as_ref()
    }

    /// Apply the undelivered policy at the end of a cycle.
    pub fn end_cycle(&mut self) {
        let Some(message) = &self.in_flight else {
            return;
        };

        match self.policy {
            UndeliveredPolicy::Redeliver => {
                tracing::info!(text = message.as_str(), "message will be resent after reconnect");
            },
            UndeliveredPolicy::Drop => {
                tracing::warn!(text = message.as_str(), "message dropped by connection loss");
                self.in_flight = None;
            },
        }
    }
}
