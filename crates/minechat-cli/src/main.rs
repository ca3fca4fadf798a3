//! Minechat console client binary.
//!
//! # Usage
//!
//! ```bash
//! # Chat with an existing account
//! USER_TOKEN=... minechat --host minechat.dvmn.org
//!
//! # Create an account and print its token
//! minechat register --user-name Steve
//! ```

use clap::Parser;
use minechat_cli::{Args, ChatOptions, Command, app, input};
use minechat_client::{SystemEnv, TcpNetwork};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries the chat
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let client = args.client_config();
    let supervisor = args.supervisor_config();

    match args.command() {
        Command::Chat => {
            tracing::info!(
                host = %client.host,
                read_port = client.read_port,
                write_port = client.write_port,
                "minechat starting"
            );

            let options = ChatOptions {
                client,
                supervisor,
                user_name: args.user_name,
                history: args.history,
            };
            let interrupt = async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %err, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };

            app::chat(
                TcpNetwork,
                SystemEnv::new(),
                options,
                input::stdin_lines()?,
                tokio::io::stdout(),
                interrupt,
            )
            .await?;
        },
        Command::Register => {
            let registration = app::register(
                &TcpNetwork,
                &SystemEnv::new(),
                &client,
                &supervisor,
                &args.user_name,
            )
            .await?;

            let report = format!(
                "nickname: {}\ntoken: {}\n",
                registration.nickname, registration.account_hash
            );
            let mut stdout = tokio::io::stdout();
            stdout.write_all(report.as_bytes()).await?;
            stdout.flush().await?;
        },
    }

    Ok(())
}
