//! Keepalive ping.
//!
//! Optional cycle member for quiet chats. It opens its own write-port
//! connection, authorizes, then keeps sending an empty line and reading the
//! reply so the watchdog sees activity even when nobody talks.

use std::{convert::Infallible, time::Duration};

use minechat_core::{Channel, Environment, Fault, LivenessSource};

use crate::{auth, context::MemberContext, error::ChannelError, net::Network};

/// Ping `host:port` every `interval`.
pub async fn run<N, E>(
    ctx: &MemberContext<'_, N, E>,
    host: &str,
    port: u16,
    token: &str,
    interval: Duration,
) -> Fault
where
    N: Network,
    E: Environment,
{
    let Err(err) = ping_loop(ctx, host, port, token, interval).await;
    tracing::warn!(error = %err, "keepalive stopped");
    err.into_fault(Channel::Write)
}

async fn ping_loop<N, E>(
    ctx: &MemberContext<'_, N, E>,
    host: &str,
    port: u16,
    token: &str,
    interval: Duration,
) -> Result<Infallible, ChannelError>
where
    N: Network,
    E: Environment,
{
    let mut connection = ctx.connect(host, port).await?;
    auth::authorize(&mut connection, token).await?;

    loop {
        connection.write_line("").await?;
        let reply = connection.read_line().await?.ok_or(ChannelError::Closed)?;
        tracing::trace!(?reply, "keepalive reply");

        ctx.liveness.tick(LivenessSource::Keepalive);
        ctx.env.sleep(interval).await;
    }
}
