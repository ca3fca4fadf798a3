//! Outbound event streams.
//!
//! The connection core talks to presentation through four unbounded queues,
//! each with one consumer: display text, history text, status events and
//! alerts. Producers never block. A consumer that went away is not an error
//! for the core; its events are discarded.

use minechat_core::{Alert, Channel, ChannelLifecycle, ConnectionState, StatusEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Producer side of the outbound streams. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSinks {
    display: UnboundedSender<String>,
    history: UnboundedSender<String>,
    status: UnboundedSender<StatusEvent>,
    alerts: UnboundedSender<Alert>,
}

/// Consumer side of the outbound streams.
#[derive(Debug)]
pub struct EventStreams {
    /// Incoming messages for display.
    pub display: UnboundedReceiver<String>,
    /// Incoming messages for the history file.
    pub history: UnboundedReceiver<String>,
    /// Connection status updates.
    pub status: UnboundedReceiver<StatusEvent>,
    /// Errors that need the user's attention.
    pub alerts: UnboundedReceiver<Alert>,
}

/// Create a connected sink/stream pair.
pub fn event_channels() -> (EventSinks, EventStreams) {
    let (display_tx, display_rx) = mpsc::unbounded_channel();
    let (history_tx, history_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (alerts_tx, alerts_rx) = mpsc::unbounded_channel();

    let sinks = EventSinks {
        display: display_tx,
        history: history_tx,
        status: status_tx,
        alerts: alerts_tx,
    };
    let streams = EventStreams {
        display: display_rx,
        history: history_rx,
        status: status_rx,
        alerts: alerts_rx,
    };

    (sinks, streams)
}

impl EventSinks {
    /// Fan an incoming message out to display and history, in that order.
    pub fn message(&self, text: String) {
        if self.display.send(text.clone()).is_err() {
            tracing::trace!("display stream closed, message not shown");
        }
        if self.history.send(text).is_err() {
            tracing::trace!("history stream closed, message not saved");
        }
    }

    /// Publish a status update.
    pub fn status(&self, event: StatusEvent) {
        tracing::debug!(%event, "status");
        if self.status.send(event).is_err() {
            tracing::trace!("status stream closed");
        }
    }

    /// Publish a user-facing alert.
    pub fn alert(&self, alert: Alert) {
        tracing::error!(%alert, "alert");
        if self.alerts.send(alert).is_err() {
            tracing::trace!("alert stream closed");
        }
    }
}

/// Publishes one channel's state changes and its `Closed` on drop.
///
/// Dropping the reporter is how a cancelled channel loop still reports
/// `Closed`: cancellation drops the loop's future, and with it the reporter.
#[derive(Debug)]
pub(crate) struct StatusReporter {
    lifecycle: ChannelLifecycle,
    sinks: EventSinks,
}

impl StatusReporter {
    pub(crate) fn new(channel: Channel, sinks: &EventSinks) -> Self {
        Self { lifecycle: ChannelLifecycle::new(channel), sinks: sinks.clone() }
    }

    pub(crate) fn advance(&mut self, state: ConnectionState) {
        match self.lifecycle.advance(state) {
            Ok(event) => self.sinks.status(event),
            Err(err) => tracing::error!(error = %err, "status transition rejected"),
        }
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        if let Some(event) = self.lifecycle.close() {
            self.sinks.status(event);
        }
    }
}
