//! Line connection.
//!
//! A [`LineConnection`] owns one socket and speaks `\n`-terminated lines over
//! it. The socket is closed when the value is dropped, so every exit path of
//! a channel loop (return, `?`, cancellation by drop) releases it. Writes are
//! flushed before `write_line` returns, so nothing is left buffered on drop.

use std::io;

use minechat_core::{Environment, RetryPolicy, protocol};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::{error::ConnectError, net::Network};

/// Line-oriented wrapper around a byte stream.
#[derive(Debug)]
pub struct LineConnection<S> {
    stream: BufReader<S>,
}

/// Open a line connection to `host:port`.
///
/// Name-resolution failures are retried forever: the first
/// `retry.immediate_attempts` consecutive failures immediately, each later one
/// after `retry.delay`. Any other connect error is returned at once.
pub async fn acquire<N, E>(
    network: &N,
    env: &E,
    host: &str,
    port: u16,
    retry: &RetryPolicy,
) -> Result<LineConnection<N::Stream>, ConnectError>
where
    N: Network,
    E: Environment,
{
    let mut failures: u32 = 0;

    loop {
        match network.connect(host, port).await {
            Ok(stream) => {
                tracing::debug!(host, port, "connection established");
                return Ok(LineConnection::new(stream));
            },
            Err(err) if err.is_transient() => {
                failures += 1;
                tracing::warn!(host, port, failures, error = %err, "cannot resolve host");
                if let Some(delay) = retry.delay_after(failures) {
                    env.sleep(delay).await;
                }
            },
            Err(err) => {
                tracing::warn!(host, port, error = %err, "connect failed");
                return Err(err);
            },
        }
    }
}

impl<S> LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already open stream.
    pub fn new(stream: S) -> Self {
        Self { stream: BufReader::new(stream) }
    }

    /// Read one line, decoded lossily, without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// - `io::ErrorKind::InvalidData` if the line is longer than
    ///   [`protocol::MAX_LINE_SIZE`]
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let limit = (protocol::MAX_LINE_SIZE + 1) as u64;
        let mut raw = Vec::new();
        if (&mut self.stream).take(limit).read_until(b'\n', &mut raw).await? == 0 {
            return Ok(None);
        }
        if raw.len() > protocol::MAX_LINE_SIZE && raw.last() != Some(&b'\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line longer than {} bytes", protocol::MAX_LINE_SIZE),
            ));
        }

        let text = String::from_utf8_lossy(&raw);
        Ok(Some(protocol::strip_line_terminator(&text).to_string()))
    }

    /// Write `line` followed by the terminator and flush.
    pub async fn write_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self.stream.get_mut();
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(protocol::LINE_TERMINATOR.as_bytes()).await?;
        writer.flush().await
    }

    /// Shut the write half down, then drop the socket.
    pub async fn close(mut self) -> io::Result<()> {
        self.stream.get_mut().shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    };

    use tokio::io::{AsyncReadExt, DuplexStream, duplex};

    use super::*;
    use crate::system_env::SystemEnv;

    /// Fails resolution a fixed number of times, then hands out one duplex end.
    #[derive(Clone)]
    struct FlakyResolver {
        failures_left: Arc<AtomicU32>,
        attempts: Arc<AtomicU32>,
        refuse: bool,
        stream: Arc<Mutex<Option<DuplexStream>>>,
    }

    impl FlakyResolver {
        fn new(failures: u32, stream: DuplexStream) -> Self {
            Self {
                failures_left: Arc::new(AtomicU32::new(failures)),
                attempts: Arc::new(AtomicU32::new(0)),
                refuse: false,
                stream: Arc::new(Mutex::new(Some(stream))),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl Network for FlakyResolver {
        type Stream = DuplexStream;

        async fn connect(&self, host: &str, port: u16) -> Result<DuplexStream, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);

            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(ConnectError::Resolve {
                    host: host.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such host"),
                });
            }
            if self.refuse {
                return Err(ConnectError::Connect {
                    host: host.to_string(),
                    port,
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                });
            }

            Ok(self.stream.lock().unwrap().take().unwrap())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_resolution_failures_retry_immediately() {
        let (client, _server) = duplex(64);
        let network = FlakyResolver::new(2, client);
        let env = SystemEnv::new();
        let start = env.now();

        acquire(&network, &env, "test", 1, &RetryPolicy::default()).await.unwrap();

        assert_eq!(network.attempts(), 3);
        assert_eq!(env.now() - start, std::time::Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn later_resolution_failures_wait() {
        let (client, _server) = duplex(64);
        let network = FlakyResolver::new(4, client);
        let env = SystemEnv::new();
        let retry = RetryPolicy::default();
        let start = env.now();

        acquire(&network, &env, "test", 1, &retry).await.unwrap();

        assert_eq!(network.attempts(), 5);
        let elapsed = env.now() - start;
        assert!(elapsed >= retry.delay * 2);
        assert!(elapsed < retry.delay * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connection_is_not_retried() {
        let (client, _server) = duplex(64);
        let mut network = FlakyResolver::new(0, client);
        network.refuse = true;

        let result = acquire(&network, &SystemEnv::new(), "test", 1, &RetryPolicy::default()).await;

        assert!(matches!(result, Err(ConnectError::Connect { port: 1, .. })));
        assert_eq!(network.attempts(), 1);
    }

    #[tokio::test]
    async fn lines_round_trip_without_terminators() {
        let (client, mut server) = duplex(256);
        let mut connection = LineConnection::new(client);

        server.write_all(b"hello\r\nworld\npartial").await.unwrap();
        server.shutdown().await.unwrap();

        assert_eq!(connection.read_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(connection.read_line().await.unwrap().as_deref(), Some("world"));
        assert_eq!(connection.read_line().await.unwrap().as_deref(), Some("partial"));
        assert_eq!(connection.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let (client, mut server) = duplex(64);
        let mut connection = LineConnection::new(client);

        server.write_all(b"caf\xff\n").await.unwrap();

        assert_eq!(connection.read_line().await.unwrap().as_deref(), Some("caf\u{FFFD}"));
    }

    #[tokio::test]
    async fn line_at_size_limit_is_accepted() {
        let (client, mut server) = duplex(1024);
        let mut connection = LineConnection::new(client);
        let line = "a".repeat(protocol::MAX_LINE_SIZE);

        let sent = line.clone();
        tokio::spawn(async move {
            server.write_all(sent.as_bytes()).await.unwrap();
            server.write_all(b"\n").await.unwrap();
            server.write_all(b"next\n").await.unwrap();
        });

        assert_eq!(connection.read_line().await.unwrap(), Some(line));
        assert_eq!(connection.read_line().await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn unterminated_flood_is_rejected() {
        let (client, mut server) = duplex(1024);
        let mut connection = LineConnection::new(client);

        tokio::spawn(async move {
            let flood = vec![b'a'; protocol::MAX_LINE_SIZE * 2];
            // Stops once the client gives up and drops its end.
            let _ = server.write_all(&flood).await;
        });

        let err = connection.read_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn write_line_appends_terminator() {
        let (client, mut server) = duplex(64);
        let mut connection = LineConnection::new(client);

        connection.write_line("abc").await.unwrap();
        connection.write_line("").await.unwrap();
        connection.close().await.unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "abc\n\n");
    }

    #[tokio::test]
    async fn drop_closes_socket() {
        let (client, mut server) = duplex(64);
        let connection = LineConnection::new(client);

        drop(connection);

        let mut buf = [0u8; 8];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
    }
}
