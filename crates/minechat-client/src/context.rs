//! Shared borrows of one cycle member.

use minechat_core::{Environment, RetryPolicy};

use crate::{
    error::ConnectError,
    events::EventSinks,
    line::{self, LineConnection},
    net::Network,
    watchdog::LivenessSender,
};

/// What every cycle member borrows from the supervisor.
#[derive(Debug)]
pub struct MemberContext<'a, N, E> {
    /// Socket factory.
    pub network: &'a N,
    /// Clock.
    pub env: &'a E,
    /// Name-resolution retry for every connection the member opens.
    pub retry: RetryPolicy,
    /// Outbound event streams.
    pub sinks: &'a EventSinks,
    /// This cycle's liveness stream.
    pub liveness: &'a LivenessSender,
}

impl<N, E> MemberContext<'_, N, E>
where
    N: Network,
    E: Environment,
{
    /// Open a line connection with the member's retry policy.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<LineConnection<N::Stream>, ConnectError> {
        line::acquire(self.network, self.env, host, port, &self.retry).await
    }
}
