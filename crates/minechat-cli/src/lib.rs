//! Minechat console client
//!
//! Presentation around the connection runtime: replays and appends the chat
//! history file, prints incoming messages, status changes and alerts, and
//! turns input lines into outgoing messages.
//!
//! # Components
//!
//! - [`args`]: command line and environment configuration
//! - [`app`]: the `chat` and `register` commands
//! - [`console`]: line-oriented output
//! - [`history`]: history file replay and append
//! - [`input`]: keyboard lines read off the runtime

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod args;
pub mod console;
pub mod error;
pub mod history;
pub mod input;

pub use app::{ChatOptions, chat, register};
pub use args::{Args, Command};
pub use error::CliError;
