//! Property-based tests for channel lifecycles and the supervisor state machine
//!
//! Drives both machines with arbitrary call sequences and checks that the
//! observable output never violates ordering, whatever the caller does.

use std::time::Duration;

use minechat_core::{
    AuthFailurePolicy, Channel, ChannelLifecycle, ConnectionState, FatalReason, Fault,
    StatusEvent, Supervisor, SupervisorAction, SupervisorConfig,
};
use proptest::prelude::*;

fn arbitrary_state() -> impl Strategy<Value = ConnectionState> {
    prop_oneof![
        Just(ConnectionState::Initiated),
        Just(ConnectionState::Established),
        Just(ConnectionState::Closed),
    ]
}

fn arbitrary_fault() -> impl Strategy<Value = Fault> {
    prop_oneof![
        (0u64..5_000).prop_map(|ms| Fault::TimedOut { silent_for: Duration::from_millis(ms) }),
        Just(Fault::Fatal(FatalReason::EndOfStream { channel: Channel::Read })),
        Just(Fault::Fatal(FatalReason::Io {
            channel: Channel::Write,
            message: "reset".to_string()
        })),
        Just(Fault::Fatal(FatalReason::InvalidToken)),
        Just(Fault::Cancelled),
    ]
}

fn rank(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Initiated => 0,
        ConnectionState::Established => 1,
        ConnectionState::Closed => 2,
    }
}

proptest! {
    #[test]
    fn lifecycle_events_strictly_increase(
        attempts in prop::collection::vec((arbitrary_state(), any::<bool>()), 0..32)
    ) {
        let mut lifecycle = ChannelLifecycle::new(Channel::Read);
        let mut emitted = Vec::new();

        for (state, via_close) in attempts {
            let event = if via_close {
                lifecycle.close()
            } else {
                lifecycle.advance(state).ok()
            };
            if let Some(StatusEvent::ConnectionStateChanged { channel, state }) = event {
                prop_assert_eq!(channel, Channel::Read);
                emitted.push(state);
            }
        }

        for pair in emitted.windows(2) {
            prop_assert!(rank(pair[0]) < rank(pair[1]));
        }
        if let Some(first) = emitted.first() {
            prop_assert_eq!(*first, ConnectionState::Initiated);
        }
    }

    #[test]
    fn supervisor_stops_only_on_cancel_or_auth_failure(
        faults in prop::collection::vec(arbitrary_fault(), 1..16),
        retry_auth in any::<bool>(),
    ) {
        let auth_failure =
            if retry_auth { AuthFailurePolicy::Retry } else { AuthFailurePolicy::Stop };
        let config = SupervisorConfig { auth_failure, ..Default::default() };
        let mut supervisor = Supervisor::new(&config);

        for (index, fault) in faults.into_iter().enumerate() {
            let start = supervisor.begin_cycle().unwrap();
            prop_assert_eq!(start, SupervisorAction::StartCycle { cycle: index as u64 + 1 });
            supervisor.members_started().unwrap();

            let actions = supervisor.handle_fault(fault.clone()).unwrap();
            prop_assert_eq!(actions.first(), Some(&SupervisorAction::CancelMembers));
            prop_assert_eq!(actions.len() > 1, fault.is_auth_failure());

            let should_stop = matches!(fault, Fault::Cancelled)
                || (fault.is_auth_failure() && auth_failure == AuthFailurePolicy::Stop);

            match supervisor.drained().unwrap() {
                SupervisorAction::Stop(_) => {
                    prop_assert!(should_stop);
                    break;
                },
                SupervisorAction::Backoff(delay) => {
                    prop_assert!(!should_stop);
                    prop_assert_eq!(delay, config.reconnect_delay);
                },
                other => prop_assert!(false, "unexpected action {:?}", other),
            }
        }
    }
}
