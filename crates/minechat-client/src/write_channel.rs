//! Write channel.
//!
//! Connects to the write port, authenticates once, then drains the outbox.
//! Each message is sent as:
//!
//! ```text
//! server: <acknowledgment line, discarded>
//! client: <sanitized message>\n
//! client: \n
//! ```
//!
//! A message counts as delivered only after both lines are flushed. A message
//! that is nothing but newlines is dropped without touching the socket.

use std::convert::Infallible;

use minechat_core::{Channel, ConnectionState, Environment, Fault, LivenessSource, StatusEvent};

use crate::{
    auth, context::MemberContext, error::ChannelError, events::StatusReporter, net::Network,
    outbox::Outbox,
};

/// Run the write channel against `host:port` with `token`.
pub async fn run<N, E>(
    ctx: &MemberContext<'_, N, E>,
    host: &str,
    port: u16,
    token: &str,
    outbox: &mut Outbox,
) -> Fault
where
    N: Network,
    E: Environment,
{
    let mut status = StatusReporter::new(Channel::Write, ctx.sinks);
    status.advance(ConnectionState::Initiated);

    let Err(err) = write_loop(ctx, &mut status, host, port, token, outbox).await;
    tracing::warn!(error = %err, "write channel stopped");
    err.into_fault(Channel::Write)
}

async fn write_loop<N, E>(
    ctx: &MemberContext<'_, N, E>,
    status: &mut StatusReporter,
    host: &str,
    port: u16,
    token: &str,
    outbox: &mut Outbox,
) -> Result<Infallible, ChannelError>
where
    N: Network,
    E: Environment,
{
    let mut connection = ctx.connect(host, port).await?;
    status.advance(ConnectionState::Established);

    let identity = auth::authorize(&mut connection, token).await?;
    ctx.sinks.status(StatusEvent::IdentityResolved { nickname: identity.nickname });
    ctx.liveness.tick(LivenessSource::Authorized);

    loop {
        let Some(message) = outbox.next().await else {
            tracing::info!("outgoing queue closed, nothing more to send");
            return std::future::pending().await;
        };

        let Some(text) = message.wire_text() else {
            tracing::debug!(text = message.as_str(), "message is empty after sanitizing, skipped");
            outbox.delivered();
            continue;
        };

        let ack = connection.read_line().await?.ok_or(ChannelError::Closed)?;
        tracing::debug!(?ack, "server ready for message");

        connection.write_line(&text).await?;
        connection.write_line("").await?;
        outbox.delivered();

        tracing::debug!(text = message.as_str(), "message sent");
        ctx.liveness.tick(LivenessSource::MessageSent);
    }
}

#[cfg(test)]
mod tests {
    use minechat_core::{AuthError, FatalReason, RetryPolicy, UndeliveredPolicy};

    use super::*;
    use crate::{
        events::event_channels,
        outbox::outbox,
        system_env::SystemEnv,
        testing::DuplexNetwork,
        watchdog::liveness_channel,
    };

    #[tokio::test]
    async fn authorizes_then_sends_framed_messages() {
        let network = DuplexNetwork::default();
        let (sinks, mut streams) = event_channels();
        let (liveness, mut ticks) = liveness_channel();
        let (tx, mut outbox) = outbox(UndeliveredPolicy::Redeliver);
        let ctx = MemberContext {
            network: &network,
            env: &SystemEnv,
            retry: RetryPolicy::default(),
            sinks: &sinks,
            liveness: &liveness,
        };

        tx.send("first\n\nline".into()).unwrap();
        tx.send("second".into()).unwrap();

        let mut server = network.accept(2);
        let script = async {
            let token = server.accept_token("Steve").await;
            let mut received = Vec::new();
            for _ in 0..2 {
                server.send("Enter message:\n").await;
                received.push(server.recv().await.unwrap());
                received.push(server.recv().await.unwrap());
            }
            (token, received)
        };

        let ((token, received), ()) = tokio::join!(script, async {
            tokio::select! {
                fault = run(&ctx, "test", 2, "abc", &mut outbox) => {
                    panic!("writer stopped: {fault}")
                },
                () = wait_for_ticks(&mut ticks, 3) => {},
            }
        });

        assert_eq!(token, "abc\n");
        assert_eq!(received, vec!["firstline\n", "\n", "second\n", "\n"]);
        assert_eq!(outbox.in_flight(), None);

        let statuses: Vec<_> = std::iter::from_fn(|| streams.status.try_recv().ok()).collect();
        let resolved = StatusEvent::IdentityResolved { nickname: "Steve".to_string() };
        assert!(statuses.contains(&resolved));
        assert_eq!(
            statuses.last(),
            Some(&StatusEvent::ConnectionStateChanged {
                channel: Channel::Write,
                state: ConnectionState::Closed,
            })
        );
    }

    #[tokio::test]
    async fn edge_newlines_never_reach_the_wire() {
        let network = DuplexNetwork::default();
        let (sinks, _streams) = event_channels();
        let (liveness, mut ticks) = liveness_channel();
        let (tx, mut outbox) = outbox(UndeliveredPolicy::Redeliver);
        let ctx = MemberContext {
            network: &network,
            env: &SystemEnv,
            retry: RetryPolicy::default(),
            sinks: &sinks,
            liveness: &liveness,
        };

        tx.send("hi\n".into()).unwrap();
        tx.send("\n".into()).unwrap();
        tx.send("\nthere".into()).unwrap();

        let mut server = network.accept(2);
        let script = async {
            server.accept_token("Steve").await;
            let mut received = Vec::new();
            for _ in 0..2 {
                server.send("Enter message:\n").await;
                received.push(server.recv().await.unwrap());
                received.push(server.recv().await.unwrap());
            }
            received
        };

        let (received, ()) = tokio::join!(script, async {
            tokio::select! {
                fault = run(&ctx, "test", 2, "abc", &mut outbox) => {
                    panic!("writer stopped: {fault}")
                },
                () = wait_for_ticks(&mut ticks, 3) => {},
            }
        });

        assert_eq!(received, vec!["hi\n", "\n", "there\n", "\n"]);
        assert_eq!(outbox.in_flight(), None);
    }

    #[tokio::test]
    async fn invalid_token_is_fatal() {
        let network = DuplexNetwork::default();
        let (sinks, _streams) = event_channels();
        let (liveness, mut ticks) = liveness_channel();
        let (_tx, mut outbox) = outbox(UndeliveredPolicy::Redeliver);
        let ctx = MemberContext {
            network: &network,
            env: &SystemEnv,
            retry: RetryPolicy::default(),
            sinks: &sinks,
            liveness: &liveness,
        };

        let mut server = network.accept(2);
        tokio::spawn(async move {
            server.send("greeting\n").await;
            server.recv().await;
            server.send("null\n").await;
            server.recv().await;
        });

        let fault = run(&ctx, "test", 2, "wrong", &mut outbox).await;

        assert_eq!(fault, Fault::Fatal(FatalReason::from(AuthError::InvalidToken)));
        assert!(ticks.try_recv().is_err());
    }

    #[tokio::test]
    async fn interrupted_message_stays_in_flight() {
        let network = DuplexNetwork::default();
        let (sinks, _streams) = event_channels();
        let (liveness, _ticks) = liveness_channel();
        let (tx, mut outbox) = outbox(UndeliveredPolicy::Redeliver);
        let ctx = MemberContext {
            network: &network,
            env: &SystemEnv,
            retry: RetryPolicy::default(),
            sinks: &sinks,
            liveness: &liveness,
        };
        tx.send("pending".into()).unwrap();

        let mut server = network.accept(2);
        tokio::spawn(async move {
            server.accept_token("Steve").await;
        });

        let fault = run(&ctx, "test", 2, "abc", &mut outbox).await;

        assert!(matches!(
            fault,
            Fault::Fatal(FatalReason::EndOfStream { channel: Channel::Write })
        ));
        assert_eq!(outbox.in_flight(), Some(&"pending".into()));
    }

    async fn wait_for_ticks(ticks: &mut crate::watchdog::LivenessReceiver, count: usize) {
        for _ in 0..count {
            ticks.recv().await.unwrap();
        }
    }
}
