//! Connection core
//!
//! I/O-free building blocks for the minechat two-socket chat protocol. Every
//! piece here is pure: no sockets, no runtime, no clocks. Time enters through
//! the [`env::Environment`] trait and I/O lives in `minechat-client`.
//!
//! # Components
//!
//! - [`protocol`]: line framing, message/nickname sanitization, handshake
//!   reply decoding
//! - [`lifecycle`]: per-channel [`ConnectionState`] tracker enforcing
//!   monotonic transitions
//! - [`supervisor`]: cycle state machine (`Idle → Connecting → Running →
//!   Draining → Idle`) returning actions for the runtime to execute
//! - [`fault`]: the explicit cycle-termination result
//! - [`event`]: status events, identities, liveness ticks, user alerts
//! - [`config`]: client and supervisor configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod fault;
pub mod lifecycle;
pub mod protocol;
pub mod supervisor;

pub use config::{AuthFailurePolicy, ClientConfig, RetryPolicy, SupervisorConfig, UndeliveredPolicy};
pub use env::Environment;
pub use error::{AuthError, LifecycleError, SupervisorError};
pub use event::{
    Alert, Channel, ConnectionState, Identity, LivenessSource, LivenessTick, OutgoingMessage,
    Registration, StatusEvent,
};
pub use fault::{FatalReason, Fault};
pub use lifecycle::ChannelLifecycle;
pub use supervisor::{StopReason, Supervisor, SupervisorAction, SupervisorState};
