//! Production environment backed by the tokio clock.
//!
//! Uses `tokio::time::Instant` rather than `std::time::Instant` so the same
//! environment follows a paused test clock and a turmoil simulation clock.

use std::time::Duration;

use minechat_core::Environment;

/// Environment using tokio time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_advances_now() {
        let env = SystemEnv::new();
        let start = env.now();

        env.sleep(Duration::from_millis(250)).await;

        assert!(env.now() - start >= Duration::from_millis(250));
    }
}
