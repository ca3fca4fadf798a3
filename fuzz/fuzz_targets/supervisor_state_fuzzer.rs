//! Fuzz target for the supervisor state machine
//!
//! # Strategy
//!
//! Drive the supervisor with arbitrary calls, in and out of order, under both
//! auth-failure policies.
//!
//! # Invariants
//!
//! - Out-of-order calls return an error and leave the state unchanged
//! - Cycle numbers only grow, by one per `begin_cycle`
//! - `Stop` is only returned after cancellation or a stopping auth failure

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use minechat_core::{
    AuthFailurePolicy, Channel, FatalReason, Fault, StopReason, Supervisor, SupervisorAction,
    SupervisorConfig,
};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Begin,
    Started,
    Fault(FaultChoice),
    Drained,
}

#[derive(Debug, Clone, Arbitrary)]
enum FaultChoice {
    TimedOut(u16),
    Cancelled,
    EndOfStream,
    InvalidToken,
    Malformed(String),
}

impl FaultChoice {
    fn into_fault(self) -> Fault {
        match self {
            Self::TimedOut(ms) => Fault::TimedOut { silent_for: Duration::from_millis(ms.into()) },
            Self::Cancelled => Fault::Cancelled,
            Self::EndOfStream => Fault::Fatal(FatalReason::EndOfStream { channel: Channel::Read }),
            Self::InvalidToken => Fault::Fatal(FatalReason::InvalidToken),
            Self::Malformed(reply) => Fault::Fatal(FatalReason::MalformedHandshake { reply }),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    retry_auth: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let auth_failure =
        if input.retry_auth { AuthFailurePolicy::Retry } else { AuthFailurePolicy::Stop };
    let config = SupervisorConfig { auth_failure, ..Default::default() };
    let mut supervisor = Supervisor::new(&config);
    let mut last_fault: Option<Fault> = None;

    for op in input.ops {
        let before = supervisor.state();
        let cycle = supervisor.cycle();

        let accepted = match op {
            Op::Begin => match supervisor.begin_cycle() {
                Ok(SupervisorAction::StartCycle { cycle: next }) => {
                    assert_eq!(next, cycle + 1);
                    true
                },
                Ok(other) => panic!("begin_cycle returned {other:?}"),
                Err(_) => false,
            },
            Op::Started => supervisor.members_started().is_ok(),
            Op::Fault(choice) => {
                let fault = choice.into_fault();
                let accepted = supervisor.handle_fault(fault.clone()).is_ok();
                if accepted {
                    last_fault = Some(fault);
                }
                accepted
            },
            Op::Drained => match supervisor.drained() {
                Ok(SupervisorAction::Stop(reason)) => {
                    let expected = match (&reason, &last_fault) {
                        (StopReason::Shutdown, Some(Fault::Cancelled)) => true,
                        (StopReason::InvalidToken | StopReason::MalformedHandshake { .. }, _) => {
                            auth_failure == AuthFailurePolicy::Stop
                        },
                        _ => false,
                    };
                    assert!(expected, "unexpected stop {reason:?} after {last_fault:?}");
                    true
                },
                Ok(SupervisorAction::Backoff(delay)) => {
                    assert_eq!(delay, config.reconnect_delay);
                    true
                },
                Ok(other) => panic!("drained returned {other:?}"),
                Err(_) => false,
            },
        };

        if !accepted {
            assert_eq!(supervisor.state(), before);
            assert_eq!(supervisor.cycle(), cycle);
        }
    }
});
