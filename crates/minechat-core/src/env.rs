//! Environment abstraction for deterministic testing.
//!
//! Decouples the connection core from the system clock. Production uses the
//! tokio clock; tests run the same code under paused tokio time or inside a
//! turmoil simulation, where time is virtual.

use std::time::Duration;

/// Abstract environment providing time and sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - `sleep()` resolves no earlier than `now() + duration`
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Used by driver code for backoff, retry delays and the liveness window.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
