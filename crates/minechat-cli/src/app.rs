//! The `chat` and `register` commands.

use std::{future::Future, path::PathBuf};

use minechat_client::{
    ConnectionSupervisor, EventStreams, Network, OutboxSender, auth, event_channels, line, outbox,
};
use minechat_core::{ClientConfig, Environment, OutgoingMessage, Registration, SupervisorConfig};
use tokio::{io::AsyncWrite, sync::mpsc::UnboundedReceiver};

use crate::{
    console::Console,
    error::CliError,
    history::{self, HistoryWriter},
};

/// Everything the `chat` command needs besides I/O.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Server and token. An empty token registers `user_name` first.
    pub client: ClientConfig,
    /// Reconnect tuning.
    pub supervisor: SupervisorConfig,
    /// Nickname to register when there is no token.
    pub user_name: String,
    /// History file to replay and append to.
    pub history: PathBuf,
}

/// Create an account on the write port.
///
/// # Errors
///
/// - `CliError::Connect` if the write port is unreachable
/// - `CliError::Registration` if the handshake failed
pub async fn register<N, E>(
    network: &N,
    env: &E,
    client: &ClientConfig,
    supervisor: &SupervisorConfig,
    nickname: &str,
) -> Result<Registration, CliError>
where
    N: Network,
    E: Environment,
{
    let mut connection =
        line::acquire(network, env, &client.host, client.write_port, &supervisor.retry).await?;
    let registration = auth::register(&mut connection, nickname).await?;

    if let Err(err) = connection.close().await {
        tracing::debug!(error = %err, "registration connection did not close cleanly");
    }

    Ok(registration)
}

/// Run the chat until `interrupt` resolves or `input` closes.
///
/// Replays the history to `output`, registers an account when no token is
/// configured, then keeps both channels connected. Each non-empty line from
/// `input` (see [`crate::input`]) is one outgoing message; incoming messages,
/// status changes and alerts go to `output` and incoming messages also to the
/// history file.
///
/// # Errors
///
/// - `CliError::History` if the history file exists but cannot be read
/// - `CliError::Connect` / `CliError::Registration` if registration failed
/// - `CliError::Run` if the server rejected the token
pub async fn chat<N, E, W, F>(
    network: N,
    env: E,
    options: ChatOptions,
    input: UnboundedReceiver<String>,
    output: W,
    interrupt: F,
) -> Result<(), CliError>
where
    N: Network,
    E: Environment,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let ChatOptions { mut client, supervisor: config, user_name, history: history_path } = options;
    let mut console = Console::new(output);

    for line in history::load(&history_path).await? {
        console.message(&line).await;
    }

    if client.token.is_empty() {
        let registration = register(&network, &env, &client, &config, &user_name).await?;
        console
            .notice(&format!(
                "registered as {}, reuse this account with --token {}",
                registration.nickname, registration.account_hash
            ))
            .await;
        client.token = registration.account_hash;
    }

    let (sinks, streams) = event_channels();
    let (messages, outbox) = outbox(config.undelivered);
    let supervisor = ConnectionSupervisor::new(network, env, client, config, sinks, outbox);

    let quit = async move {
        tokio::select! {
            () = interrupt => tracing::info!("interrupted"),
            () = forward_input(input, &messages) => tracing::info!("end of input"),
        }
    };

    let writer = HistoryWriter::new(history_path);
    let (result, ()) = tokio::join!(supervisor.run(quit), present(streams, console, writer));

    result.map_err(CliError::from)
}

async fn forward_input(mut input: UnboundedReceiver<String>, messages: &OutboxSender) {
    while let Some(line) = input.recv().await {
        if line.is_empty() {
            continue;
        }
        if messages.send(OutgoingMessage::new(line)).is_err() {
            return;
        }
    }
}

/// Drain the outbound streams until the supervisor drops its sinks.
async fn present<W>(mut streams: EventStreams, mut console: Console<W>, mut writer: HistoryWriter)
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            Some(text) = streams.display.recv() => console.message(&text).await,
            Some(text) = streams.history.recv() => {
                if let Some(err) = writer.append(&text).await {
                    let notice =
                        format!("chat history is not saved to {}: {err}", writer.path().display());
                    console.notice(&notice).await;
                }
            },
            Some(event) = streams.status.recv() => console.status(&event).await,
            Some(alert) = streams.alerts.recv() => console.alert(&alert).await,
            else => return,
        }
    }
}
