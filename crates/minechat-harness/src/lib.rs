//! Deterministic simulation harness for the minechat connection core.
//!
//! Runs the real `minechat-client` supervisor against a scripted
//! [`ChatServer`] inside a turmoil simulation. Time and TCP are simulated, so
//! reconnect delays, watchdog timeouts and server hang-ups are reproducible.
//!
//! # Layout
//!
//! - [`SimNetwork`]: turmoil implementation of `minechat_client::Network`,
//!   with injectable resolution failures
//! - [`ChatServer`]: read/write port server with a shared [`ServerLog`]
//! - [`ClientRig`]: supervisor plus event collection into a [`RigOutcome`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat_server;
pub mod client_rig;
pub mod sim_network;

pub use chat_server::{ChatServer, ReceivedMessage, ServerLog};
pub use client_rig::{ClientRig, RigOutcome, check_state_order};
pub use sim_network::SimNetwork;
