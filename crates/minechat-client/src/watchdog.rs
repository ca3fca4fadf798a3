//! Liveness watchdog.
//!
//! The protocol has no ping of its own, so silence is the only failure signal.
//! Every successful read, write and authorization sends a [`LivenessTick`];
//! the watchdog waits for the next one with a bounded timeout and returns
//! [`Fault::TimedOut`] the first time the window elapses without one.

use std::time::Duration;

use minechat_core::{Environment, Fault, LivenessSource, LivenessTick};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Producer side of a cycle's liveness stream.
#[derive(Debug, Clone)]
pub struct LivenessSender(UnboundedSender<LivenessTick>);

/// Consumer side of a cycle's liveness stream.
pub type LivenessReceiver = UnboundedReceiver<LivenessTick>;

/// Create a liveness stream. One per cycle.
pub fn liveness_channel() -> (LivenessSender, LivenessReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LivenessSender(tx), rx)
}

impl LivenessSender {
    /// Record activity from `source`.
    pub fn tick(&self, source: LivenessSource) {
        // Watchdog gone means the cycle is ending.
        let _ = self.0.send(LivenessTick::new(source));
    }
}

/// Watch `ticks` until `window` passes without one.
///
/// Never returns anything but [`Fault::TimedOut`]. A closed stream counts as
/// silence.
pub async fn run<E>(env: &E, ticks: &mut LivenessReceiver, window: Duration) -> Fault
where
    E: Environment,
{
    let mut last_activity = env.now();

    loop {
        tokio::select! {
            tick = ticks.recv() => {
                let Some(tick) = tick else {
                    let elapsed = env.now() - last_activity;
                    env.sleep(window.saturating_sub(elapsed)).await;
                    return timed_out(env.now() - last_activity);
                };
                last_activity = env.now();
                tracing::debug!(source = %tick.source, "liveness tick");
            },
            () = env.sleep(window) => return timed_out(env.now() - last_activity),
        }
    }
}

fn timed_out(silent_for: Duration) -> Fault {
    tracing::warn!(?silent_for, "no activity, connection considered lost");
    Fault::TimedOut { silent_for }
}
