//! Command-line arguments.
//!
//! Every option falls back to an environment variable, then to the public
//! server defaults.

use std::{num::ParseIntError, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use minechat_core::{
    AuthFailurePolicy, ClientConfig, RetryPolicy, SupervisorConfig, UndeliveredPolicy,
    config::{DEFAULT_HOST, DEFAULT_READ_PORT, DEFAULT_WRITE_PORT},
};

/// Nickname registered when no token is configured.
pub const DEFAULT_USER_NAME: &str = "Script Bot";

/// History file used when none is configured.
pub const DEFAULT_HISTORY_PATH: &str = "chat_history.txt";

/// Minechat console client
#[derive(Parser, Debug)]
#[command(name = "minechat")]
#[command(about = "Console client for the minechat two-socket chat")]
#[command(version)]
pub struct Args {
    /// What to do (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Chat server host
    #[arg(long, env = "CHAT_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    /// Port streaming incoming messages
    #[arg(long, env = "READING_PORT", default_value_t = DEFAULT_READ_PORT, global = true)]
    pub read_port: u16,

    /// Port accepting outgoing messages
    #[arg(long, env = "WRITING_PORT", default_value_t = DEFAULT_WRITE_PORT, global = true)]
    pub write_port: u16,

    /// Account token; an account is registered when empty
    #[arg(long, env = "USER_TOKEN", default_value = "", hide_env_values = true, global = true)]
    pub token: String,

    /// Nickname to register when no token is given
    #[arg(long, env = "USER_NAME", default_value = DEFAULT_USER_NAME, global = true)]
    pub user_name: String,

    /// File the chat history is replayed from and appended to
    #[arg(long, env = "HISTORY_FILEPATH", default_value = DEFAULT_HISTORY_PATH, global = true)]
    pub history: PathBuf,

    /// Pause between reconnect attempts, in milliseconds
    #[arg(long, value_parser = parse_millis, default_value = "1000", global = true)]
    pub reconnect_delay_ms: Duration,

    /// Silence tolerated before reconnecting, in milliseconds
    #[arg(long, value_parser = parse_millis, default_value = "1000", global = true)]
    pub liveness_timeout_ms: Duration,

    /// Ping the write port at this interval (milliseconds) to keep quiet
    /// chats alive
    #[arg(long, value_parser = parse_millis, global = true)]
    pub keepalive_ms: Option<Duration>,

    /// Keep reconnecting after the server rejects the token
    #[arg(long, global = true)]
    pub retry_invalid_token: bool,

    /// Discard a message interrupted by a reconnect instead of resending it
    #[arg(long, global = true)]
    pub drop_undelivered: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read and write the chat until Ctrl-C or end of input
    Chat,
    /// Create an account for `--user-name` and print its token
    Register,
}

impl Args {
    /// Selected subcommand, `chat` when none was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Chat)
    }

    /// Server address and token.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            read_port: self.read_port,
            write_port: self.write_port,
            token: self.token.clone(),
        }
    }

    /// Reconnect tuning.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            reconnect_delay: self.reconnect_delay_ms,
            liveness_timeout: self.liveness_timeout_ms,
            retry: RetryPolicy::default(),
            keepalive_interval: self.keepalive_ms,
            auth_failure: if self.retry_invalid_token {
                AuthFailurePolicy::Retry
            } else {
                AuthFailurePolicy::Stop
            },
            undelivered: if self.drop_undelivered {
                UndeliveredPolicy::Drop
            } else {
                UndeliveredPolicy::Redeliver
            },
        }
    }
}

fn parse_millis(value: &str) -> Result<Duration, ParseIntError> {
    value.parse().map(Duration::from_millis)
}
