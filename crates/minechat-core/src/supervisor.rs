//! Supervisor state machine.
//!
//! Decides what happens around a connection cycle. Uses the action pattern:
//! methods consume events (cycle started, member faulted, members drained) and
//! return [`SupervisorAction`]s for the runtime to execute. The runtime owns
//! the sockets and tasks; this type owns the policy.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ begin_cycle ┌────────────┐ members_started ┌─────────┐
//! │ Idle │────────────>│ Connecting │────────────────>│ Running │
//! └──────┘             └────────────┘                 └─────────┘
//!     ▲                      │ handle_fault                │ handle_fault
//!     │ drained              ↓                             ↓
//!     │                 ┌──────────┐                       │
//!     └─────────────────│ Draining │<──────────────────────┘
//!                       └──────────┘
//! ```

use std::time::Duration;

use crate::{
    config::{AuthFailurePolicy, SupervisorConfig},
    error::SupervisorError,
    event::Alert,
    fault::{FatalReason, Fault},
};

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Between cycles.
    Idle,
    /// Cycle members are being started.
    Connecting,
    /// All members are running.
    Running,
    /// A member stopped; the rest are being cancelled.
    Draining,
}

/// Why the supervisor stopped cycling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was requested.
    Shutdown,
    /// The server rejected the token and the policy is to stop.
    InvalidToken,
    /// The server's handshake reply was undecodable and the policy is to stop.
    MalformedHandshake {
        /// The raw reply line.
        reply: String,
    },
}

/// Actions returned by the supervisor state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Start read channel, write channel and watchdog as one group.
    StartCycle {
        /// 1-based cycle number.
        cycle: u64,
    },
    /// Cancel every member still running and wait for them to unwind.
    CancelMembers,
    /// Publish a user-facing alert.
    Alert(Alert),
    /// Wait, then begin the next cycle.
    Backoff(Duration),
    /// Do not begin another cycle.
    Stop(StopReason),
}

/// Cycle supervisor.
///
/// Pure state machine: no I/O, no clock. See the module docs for the
/// transitions.
#[derive(Debug, Clone)]
pub struct Supervisor {
    state: SupervisorState,
    cycle: u64,
    reconnect_delay: Duration,
    auth_failure: AuthFailurePolicy,
    last_fault: Option<Fault>,
    pending_stop: Option<StopReason>,
}

impl Supervisor {
    /// Create an idle supervisor.
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            state: SupervisorState::Idle,
            cycle: 0,
            reconnect_delay: config.reconnect_delay,
            auth_failure: config.auth_failure,
            last_fault: None,
            pending_stop: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Number of cycles begun so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Fault that ended the most recent cycle.
    pub fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    /// Begin a new cycle.
    ///
    /// # Errors
    ///
    /// - `SupervisorError::InvalidState` if not `Idle`
    pub fn begin_cycle(&mut self) -> Result<SupervisorAction, SupervisorError> {
        self.require(SupervisorState::Idle, "begin_cycle")?;

        self.cycle += 1;
        self.state = SupervisorState::Connecting;

        Ok(SupervisorAction::StartCycle { cycle: self.cycle })
    }

    /// Every member of the cycle has been started.
    ///
    /// # Errors
    ///
    /// - `SupervisorError::InvalidState` if not `Connecting`
    pub fn members_started(&mut self) -> Result<(), SupervisorError> {
        self.require(SupervisorState::Connecting, "members_started")?;
        self.state = SupervisorState::Running;
        Ok(())
    }

    /// A member stopped with `fault`; the others must be cancelled.
    ///
    /// Authentication faults produce an alert. Whether the supervisor stops
    /// afterwards is decided by [`AuthFailurePolicy`] and reported by
    /// [`Supervisor::drained`].
    ///
    /// # Errors
    ///
    /// - `SupervisorError::InvalidState` if not `Connecting` or `Running`
    pub fn handle_fault(&mut self, fault: Fault) -> Result<Vec<SupervisorAction>, SupervisorError> {
        if !matches!(self.state, SupervisorState::Connecting | SupervisorState::Running) {
            return Err(SupervisorError::InvalidState {
                state: self.state,
                operation: "handle_fault",
            });
        }

        self.state = SupervisorState::Draining;

        let mut actions = vec![SupervisorAction::CancelMembers];

        match &fault {
            Fault::Cancelled => self.pending_stop = Some(StopReason::Shutdown),
            Fault::Fatal(FatalReason::InvalidToken) => {
                actions.push(SupervisorAction::Alert(Alert::InvalidToken));
                if self.auth_failure == AuthFailurePolicy::Stop {
                    self.pending_stop = Some(StopReason::InvalidToken);
                }
            },
            Fault::Fatal(FatalReason::MalformedHandshake { reply }) => {
                actions.push(SupervisorAction::Alert(Alert::MalformedHandshake {
                    reply: reply.clone(),
                }));
                if self.auth_failure == AuthFailurePolicy::Stop {
                    self.pending_stop =
                        Some(StopReason::MalformedHandshake { reply: reply.clone() });
                }
            },
            Fault::TimedOut { .. } | Fault::Fatal(_) => {},
        }

        self.last_fault = Some(fault);
        Ok(actions)
    }

    /// All members have unwound.
    ///
    /// Returns `Backoff` to schedule the next cycle, or `Stop`.
    ///
    /// # Errors
    ///
    /// - `SupervisorError::InvalidState` if not `Draining`
    pub fn drained(&mut self) -> Result<SupervisorAction, SupervisorError> {
        self.require(SupervisorState::Draining, "drained")?;
        self.state = SupervisorState::Idle;

        Ok(match self.pending_stop.take() {
            Some(reason) => SupervisorAction::Stop(reason),
            None => SupervisorAction::Backoff(self.reconnect_delay),
        })
    }

    fn require(
        &self,
        state: SupervisorState,
        operation: &'static str,
    ) -> Result<(), SupervisorError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SupervisorError::InvalidState { state: self.state, operation })
        }
    }
}
