//! Connection runtime
//!
//! Runs the minechat connection core on tokio: two independent line
//! connections (read port, write port), the token handshake, a liveness
//! watchdog, and the supervisor that tears all of them down together and
//! reconnects.
//!
//! # Components
//!
//! - [`net`]: the [`Network`] seam and its TCP implementation
//! - [`line`]: line connection with name-resolution retry
//! - [`auth`]: token handshake and registration
//! - [`read_channel`], [`write_channel`], [`watchdog`], [`keepalive`]: cycle
//!   members
//! - [`supervisor`]: the cycle loop
//! - [`events`], [`outbox`]: queues to and from presentation
//!
//! # Example
//!
//! ```no_run
//! use minechat_client::{ConnectionSupervisor, SystemEnv, TcpNetwork, event_channels, outbox};
//! use minechat_core::{ClientConfig, SupervisorConfig};
//!
//! # async fn example() -> Result<(), minechat_client::RunError> {
//! let config = SupervisorConfig::default();
//! let (sinks, _streams) = event_channels();
//! let (messages, outbox) = outbox(config.undelivered);
//!
//! let client = ClientConfig { token: "my-token".to_string(), ..Default::default() };
//! let supervisor =
//!     ConnectionSupervisor::new(TcpNetwork, SystemEnv::new(), client, config, sinks, outbox);
//!
//! messages.send("hello".into()).ok();
//! supervisor.run(std::future::pending()).await
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod context;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod line;
pub mod net;
pub mod outbox;
pub mod read_channel;
pub mod supervisor;
pub mod system_env;
pub mod watchdog;
pub mod write_channel;

#[cfg(test)]
mod testing;

pub use context::MemberContext;
pub use error::{ChannelError, ConnectError, RunError};
pub use events::{EventSinks, EventStreams, event_channels};
pub use line::LineConnection;
pub use net::{Network, TcpNetwork};
pub use outbox::{Outbox, OutboxSender, outbox};
pub use supervisor::ConnectionSupervisor;
pub use system_env::SystemEnv;
pub use watchdog::{LivenessReceiver, LivenessSender, liveness_channel};
