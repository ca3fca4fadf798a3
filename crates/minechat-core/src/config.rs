//! Client and supervisor configuration.

use std::time::Duration;

/// Chat server used when none is configured.
pub const DEFAULT_HOST: &str = "minechat.dvmn.org";

/// Port that streams incoming messages.
pub const DEFAULT_READ_PORT: u16 = 5000;

/// Port that accepts outgoing messages and runs the token handshake.
pub const DEFAULT_WRITE_PORT: u16 = 5050;

/// Pause between a torn-down cycle and the next one.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Maximum silence before the watchdog declares the connection lost.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Consecutive name-resolution failures retried without delay.
pub const DEFAULT_IMMEDIATE_ATTEMPTS: u32 = 2;

/// Delay before each resolution retry past the immediate ones.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where to connect and who to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Chat server host name.
    pub host: String,
    /// Port for the read channel.
    pub read_port: u16,
    /// Port for the write channel.
    pub write_port: u16,
    /// Account token sent during the handshake.
    pub token: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            read_port: DEFAULT_READ_PORT,
            write_port: DEFAULT_WRITE_PORT,
            token: String::new(),
        }
    }
}

/// Name-resolution retry behavior of a line connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures retried immediately.
    pub immediate_attempts: u32,
    /// Delay before each later retry.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the `failures`-th consecutive failure (1-based).
    pub fn delay_after(&self, failures: u32) -> Option<Duration> {
        (failures > self.immediate_attempts).then_some(self.delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { immediate_attempts: DEFAULT_IMMEDIATE_ATTEMPTS, delay: DEFAULT_RETRY_DELAY }
    }
}

/// What the supervisor does after the server rejects the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Drain the cycle, alert, and stop.
    #[default]
    Stop,
    /// Drain the cycle, alert, and start another cycle after the usual delay.
    Retry,
}

/// What happens to a message taken from the outgoing queue but not fully
/// transmitted when its cycle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndeliveredPolicy {
    /// Send it first in the next cycle (at-least-once).
    #[default]
    Redeliver,
    /// Discard it (at-most-once).
    Drop,
}

/// Supervisor tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Pause between cycles.
    pub reconnect_delay: Duration,
    /// Watchdog silence window.
    pub liveness_timeout: Duration,
    /// Name-resolution retry for every line connection.
    pub retry: RetryPolicy,
    /// Keepalive ping interval; `None` disables the ping.
    pub keepalive_interval: Option<Duration>,
    /// Reaction to a rejected token.
    pub auth_failure: AuthFailurePolicy,
    /// Fate of a message interrupted by a teardown.
    pub undelivered: UndeliveredPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            retry: RetryPolicy::default(),
            keepalive_interval: None,
            auth_failure: AuthFailurePolicy::default(),
            undelivered: UndeliveredPolicy::default(),
        }
    }
}
