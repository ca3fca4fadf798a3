//! Connection supervisor runtime.
//!
//! Executes the actions of [`minechat_core::Supervisor`]. A cycle is one
//! `tokio::select!` over its members (read channel, write channel, watchdog,
//! optional keepalive) plus the shutdown signal, all in the caller's task.
//! The first member to finish decides the cycle's [`Fault`]; leaving the
//! `select!` drops the others, which closes their sockets and reports their
//! `Closed` status.

use std::{future::Future, pin::Pin};

use minechat_core::{
    ClientConfig, Environment, Fault, StopReason, Supervisor, SupervisorAction, SupervisorConfig,
};
use tracing::Instrument;

use crate::{
    context::MemberContext,
    error::RunError,
    events::EventSinks,
    keepalive,
    net::Network,
    outbox::Outbox,
    read_channel,
    watchdog::{self, liveness_channel},
    write_channel,
};

/// Keeps both channels connected until shutdown or a fatal handshake error.
#[derive(Debug)]
pub struct ConnectionSupervisor<N, E> {
    cycle: CycleRunner<N, E>,
    outbox: Outbox,
}

/// The parts of the supervisor a cycle borrows immutably.
#[derive(Debug)]
struct CycleRunner<N, E> {
    network: N,
    env: E,
    client: ClientConfig,
    config: SupervisorConfig,
    sinks: EventSinks,
}

impl<N, E> ConnectionSupervisor<N, E>
where
    N: Network,
    E: Environment,
{
    /// Create a supervisor.
    pub fn new(
        network: N,
        env: E,
        client: ClientConfig,
        config: SupervisorConfig,
        sinks: EventSinks,
        outbox: Outbox,
    ) -> Self {
        Self { cycle: CycleRunner { network, env, client, config, sinks }, outbox }
    }

    /// Run cycles until `shutdown` resolves or the state machine stops.
    ///
    /// Returns `Ok(())` on shutdown.
    ///
    /// # Errors
    ///
    /// - `RunError::InvalidToken` / `RunError::MalformedHandshake` when the
    ///   handshake failed and the auth-failure policy is to stop
    pub async fn run<F>(self, shutdown: F) -> Result<(), RunError>
    where
        F: Future<Output = ()>,
    {
        let Self { cycle: runner, mut outbox } = self;
        let mut machine = Supervisor::new(&runner.config);
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            let start = machine.begin_cycle()?;
            if let Some(done) = runner.execute(start, shutdown.as_mut()).await {
                return done;
            }

            let cycle = machine.cycle();
            let members = runner.run_cycle(cycle, &mut outbox, shutdown.as_mut());
            machine.members_started()?;
            let fault = members.await;

            if fault.is_transient() {
                tracing::warn!(cycle, %fault, "connection cycle failed");
            } else {
                tracing::info!(cycle, %fault, "connection cycle ended");
            }

            for action in machine.handle_fault(fault)? {
                if let Some(done) = runner.execute(action, shutdown.as_mut()).await {
                    return done;
                }
            }

            outbox.end_cycle();

            let next = machine.drained()?;
            if let Some(done) = runner.execute(next, shutdown.as_mut()).await {
                return done;
            }
        }
    }
}

impl<N, E> CycleRunner<N, E>
where
    N: Network,
    E: Environment,
{
    /// Carry out one action. Returns the final result once there is one.
    async fn execute<F>(
        &self,
        action: SupervisorAction,
        shutdown: Pin<&mut F>,
    ) -> Option<Result<(), RunError>>
    where
        F: Future<Output = ()>,
    {
        match action {
            SupervisorAction::StartCycle { cycle } => {
                tracing::info!(cycle, host = %self.client.host, "starting connection cycle");
                None
            },
            // Leaving the cycle's select! already dropped every member.
            SupervisorAction::CancelMembers => {
                tracing::debug!("cycle members cancelled");
                None
            },
            SupervisorAction::Alert(alert) => {
                self.sinks.alert(alert);
                None
            },
            SupervisorAction::Backoff(delay) => {
                tracing::info!(?delay, "reconnecting after delay");
                tokio::select! {
                    () = self.env.sleep(delay) => None,
                    () = shutdown => {
                        tracing::info!("shutdown requested during backoff");
                        Some(Ok(()))
                    },
                }
            },
            SupervisorAction::Stop(reason) => {
                tracing::info!(?reason, "supervisor stopped");
                Some(match reason {
                    StopReason::Shutdown => Ok(()),
                    StopReason::InvalidToken => Err(RunError::InvalidToken),
                    StopReason::MalformedHandshake { reply } => {
                        Err(RunError::MalformedHandshake { reply })
                    },
                })
            },
        }
    }

    /// Run every member of cycle `cycle` until the first one finishes.
    async fn run_cycle<F>(&self, cycle: u64, outbox: &mut Outbox, shutdown: Pin<&mut F>) -> Fault
    where
        F: Future<Output = ()>,
    {
        let (liveness, mut ticks) = liveness_channel();
        let ctx = MemberContext {
            network: &self.network,
            env: &self.env,
            retry: self.config.retry,
            sinks: &self.sinks,
            liveness: &liveness,
        };
        let client = &self.client;

        let reader = read_channel::run(&ctx, &client.host, client.read_port)
            .instrument(tracing::info_span!("read", cycle));
        let writer =
            write_channel::run(&ctx, &client.host, client.write_port, &client.token, outbox)
                .instrument(tracing::info_span!("write", cycle));
        let watchdog = watchdog::run(&self.env, &mut ticks, self.config.liveness_timeout)
            .instrument(tracing::info_span!("watchdog", cycle));
        let keepalive = async {
            match self.config.keepalive_interval {
                Some(interval) => {
                    keepalive::run(&ctx, &client.host, client.write_port, &client.token, interval)
                        .await
                },
                None => std::future::pending().await,
            }
        }
        .instrument(tracing::info_span!("keepalive", cycle));

        tokio::select! {
            fault = reader => fault,
            fault = writer => fault,
            fault = watchdog => fault,
            fault = keepalive => fault,
            () = shutdown => {
                tracing::info!(cycle, "shutdown requested");
                Fault::Cancelled
            },
        }
    }
}
