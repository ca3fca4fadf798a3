//! Read channel.
//!
//! Connects to the read port and republishes every line it receives to the
//! display and history streams. Runs until the socket fails or the future is
//! dropped; either way `Closed` is reported for the read channel.

use std::convert::Infallible;

use minechat_core::{Channel, ConnectionState, Environment, Fault, LivenessSource};

use crate::{
    context::MemberContext, error::ChannelError, events::StatusReporter, net::Network,
};

/// Run the read channel against `host:port`.
pub async fn run<N, E>(ctx: &MemberContext<'_, N, E>, host: &str, port: u16) -> Fault
where
    N: Network,
    E: Environment,
{
    let mut status = StatusReporter::new(Channel::Read, ctx.sinks);
    status.advance(ConnectionState::Initiated);

    let Err(err) = read_loop(ctx, &mut status, host, port).await;
    tracing::warn!(error = %err, "read channel stopped");
    err.into_fault(Channel::Read)
}

async fn read_loop<N, E>(
    ctx: &MemberContext<'_, N, E>,
    status: &mut StatusReporter,
    host: &str,
    port: u16,
) -> Result<Infallible, ChannelError>
where
    N: Network,
    E: Environment,
{
    let mut connection = ctx.connect(host, port).await?;
    status.advance(ConnectionState::Established);

    loop {
        let line = connection.read_line().await?.ok_or(ChannelError::Closed)?;
        tracing::debug!(?line, "message received");

        ctx.sinks.message(line);
        ctx.liveness.tick(LivenessSource::MessageReceived);
    }
}
