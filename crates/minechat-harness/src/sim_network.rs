//! Turmoil implementation of the client's network seam.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use minechat_client::{ConnectError, Network};
use turmoil::net::TcpStream;

/// Opens simulated TCP connections inside a turmoil simulation.
///
/// Host names must belong to simulated hosts. Resolution failures can be
/// injected with [`SimNetwork::failing_resolution`], since turmoil itself
/// treats an unknown host as a bug in the test.
#[derive(Debug, Clone, Default)]
pub struct SimNetwork {
    resolution_failures: Arc<AtomicU32>,
}

impl SimNetwork {
    /// Network with working name resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network whose next `failures` connects fail to resolve.
    pub fn failing_resolution(failures: u32) -> Self {
        Self { resolution_failures: Arc::new(AtomicU32::new(failures)) }
    }

    /// Injected resolution failures not yet consumed.
    pub fn pending_resolution_failures(&self) -> u32 {
        self.resolution_failures.load(Ordering::SeqCst)
    }
}

impl Network for SimNetwork {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, ConnectError> {
        let injected = self
            .resolution_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ConnectError::Resolve {
                host: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "simulated resolution failure"),
            });
        }

        let addr = format!("{host}:{port}");
        TcpStream::connect(addr.as_str()).await.map_err(|source| ConnectError::Connect {
            host: host.to_string(),
            port,
            source,
        })
    }
}
