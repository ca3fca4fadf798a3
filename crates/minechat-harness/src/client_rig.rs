//! Client side of a simulation.
//!
//! [`ClientRig`] wires a [`ConnectionSupervisor`] to a [`SimNetwork`], runs it
//! for a simulated duration, and collects every event it published into a
//! [`RigOutcome`] for assertions.

use std::time::Duration;

use minechat_client::{
    ConnectionSupervisor, EventStreams, OutboxSender, RunError, SystemEnv, event_channels, outbox,
};
use minechat_core::{Alert, Channel, ClientConfig, ConnectionState, StatusEvent, SupervisorConfig};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::SimNetwork;

/// Supervisor under test plus the far ends of its queues.
pub struct ClientRig {
    supervisor: ConnectionSupervisor<SimNetwork, SystemEnv>,
    messages: OutboxSender,
    streams: EventStreams,
}

/// Everything a finished rig observed.
#[derive(Debug)]
pub struct RigOutcome {
    /// What `run` returned.
    pub result: Result<(), RunError>,
    /// Display stream contents.
    pub display: Vec<String>,
    /// History stream contents.
    pub history: Vec<String>,
    /// Status stream contents.
    pub statuses: Vec<StatusEvent>,
    /// Alert stream contents.
    pub alerts: Vec<Alert>,
}

impl ClientRig {
    /// Build a rig.
    pub fn new(network: SimNetwork, client: ClientConfig, config: SupervisorConfig) -> Self {
        let (sinks, streams) = event_channels();
        let (messages, outbox) = outbox(config.undelivered);
        let supervisor =
            ConnectionSupervisor::new(network, SystemEnv::new(), client, config, sinks, outbox);
        Self { supervisor, messages, streams }
    }

    /// Queue an outgoing message.
    pub fn send(&self, text: &str) {
        // The outbox lives inside the supervisor, so the queue is open.
        let _ = self.messages.send(text.into());
    }

    /// Run until `duration` of simulated time passes or the supervisor stops.
    pub async fn run_for(self, duration: Duration) -> RigOutcome {
        let Self { supervisor, messages, mut streams } = self;

        let result = supervisor.run(tokio::time::sleep(duration)).await;
        drop(messages);

        RigOutcome {
            result,
            display: drain(&mut streams.display),
            history: drain(&mut streams.history),
            statuses: drain(&mut streams.status),
            alerts: drain(&mut streams.alerts),
        }
    }
}

impl RigOutcome {
    /// State sequence of `channel` across all cycles.
    pub fn states(&self, channel: Channel) -> Vec<ConnectionState> {
        self.statuses
            .iter()
            .filter_map(|event| match event {
                StatusEvent::ConnectionStateChanged { channel: c, state } if *c == channel => {
                    Some(*state)
                },
                _ => None,
            })
            .collect()
    }

    /// Nicknames announced by successful handshakes.
    pub fn nicknames(&self) -> Vec<String> {
        self.statuses
            .iter()
            .filter_map(|event| match event {
                StatusEvent::IdentityResolved { nickname } => Some(nickname.clone()),
                StatusEvent::ConnectionStateChanged { .. } => None,
            })
            .collect()
    }

    /// Number of cycles `channel` took part in.
    pub fn cycles(&self, channel: Channel) -> usize {
        self.states(channel).iter().filter(|state| **state == ConnectionState::Initiated).count()
    }
}

/// Check that `states` is a sequence of complete cycles, each
/// `Initiated, [Established,] Closed`.
pub fn check_state_order(states: &[ConnectionState]) -> Result<(), String> {
    let mut rest = states;

    while let Some((first, tail)) = rest.split_first() {
        if *first != ConnectionState::Initiated {
            return Err(format!("cycle starts with {first:?}: {states:?}"));
        }
        rest = match tail {
            [ConnectionState::Established, ConnectionState::Closed, tail @ ..]
            | [ConnectionState::Closed, tail @ ..] => tail,
            _ => return Err(format!("incomplete or repeated states: {states:?}")),
        };
    }

    Ok(())
}

fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
