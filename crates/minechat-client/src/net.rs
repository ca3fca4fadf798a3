//! Network seam.
//!
//! Channel loops open sockets through [`Network`] so the same code runs over
//! real TCP in production and over turmoil's simulated TCP in the harness.

use std::{future::Future, io};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, lookup_host},
};

use crate::error::ConnectError;

/// Something that can open a byte stream to `host:port`.
pub trait Network: Clone + Send + Sync + 'static {
    /// Bidirectional byte stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Resolve `host` and open a stream to it.
    ///
    /// Resolution failures must be reported as [`ConnectError::Resolve`] so
    /// the caller can retry them.
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<Self::Stream, ConnectError>> + Send;
}

/// Production network using tokio's resolver and TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpNetwork;

impl Network for TcpNetwork {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, ConnectError> {
        let resolve_error = |source| ConnectError::Resolve { host: host.to_string(), source };

        let addrs: Vec<_> = lookup_host((host, port)).await.map_err(resolve_error)?.collect();
        if addrs.is_empty() {
            return Err(resolve_error(io::Error::new(
                io::ErrorKind::NotFound,
                "no addresses found",
            )));
        }

        let stream = TcpStream::connect(&addrs[..]).await.map_err(|source| ConnectError::Connect {
            host: host.to_string(),
            port,
            source,
        })?;
        stream.set_nodelay(true).map_err(|source| ConnectError::Connect {
            host: host.to_string(),
            port,
            source,
        })?;

        Ok(stream)
    }
}
