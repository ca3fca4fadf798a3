//! Console client errors.

use std::{io, path::PathBuf};

use minechat_client::{ChannelError, ConnectError, RunError};
use thiserror::Error;

/// Why the client exited unsuccessfully.
#[derive(Error, Debug)]
pub enum CliError {
    /// The history file exists but could not be read.
    #[error("cannot read history file {path}: {source}")]
    History {
        /// Configured history path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The write port could not be reached for registration.
    #[error("cannot reach the server: {0}")]
    Connect(#[from] ConnectError),

    /// Registration failed.
    #[error("registration failed: {0}")]
    Registration(#[from] ChannelError),

    /// The supervisor stopped on a handshake failure.
    #[error(transparent)]
    Run(#[from] RunError),
}
