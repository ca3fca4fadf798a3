//! Scripted minechat server for simulations.
//!
//! Listens on a read port and a write port of one turmoil host and speaks the
//! same line protocol as the public server:
//!
//! - read port: pushes chat lines (scripted greeting on the first connection,
//!   optional periodic chatter)
//! - write port: token handshake or registration, then one prompt line per
//!   message; a message is every non-empty line up to the next empty line
//!
//! Everything the server observes is recorded in a shared [`ServerLog`].

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use turmoil::net::{TcpListener, TcpStream};

const GREETING: &str = concat!(
    "Hello %username%! Enter your personal hash or leave it empty to create new account.",
    "\n"
);
const NICKNAME_PROMPT: &str = "Enter preferred nickname below:\n";
const MESSAGE_PROMPT: &str = "Message send. Write more, end message with an empty line.\n";

/// A message accepted on the write port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Nickname of the sender.
    pub nickname: String,
    /// Message body.
    pub text: String,
}

/// What the server has seen so far. Shared between host restarts and tests.
#[derive(Debug, Clone, Default)]
pub struct ServerLog {
    inner: Arc<Mutex<LogState>>,
}

#[derive(Debug, Default)]
struct LogState {
    accounts: HashMap<String, String>,
    messages: Vec<ReceivedMessage>,
    read_connections: usize,
    write_connections: usize,
    rejected_tokens: usize,
    registrations: usize,
}

impl ServerLog {
    /// Messages accepted so far, in arrival order.
    pub fn messages(&self) -> Vec<ReceivedMessage> {
        self.lock().messages.clone()
    }

    /// Connections accepted on the read port.
    pub fn read_connections(&self) -> usize {
        self.lock().read_connections
    }

    /// Connections accepted on the write port.
    pub fn write_connections(&self) -> usize {
        self.lock().write_connections
    }

    /// Handshakes answered with `null`.
    pub fn rejected_tokens(&self) -> usize {
        self.lock().rejected_tokens
    }

    /// Accounts created through registration.
    pub fn registrations(&self) -> usize {
        self.lock().registrations
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        // A poisoned log only means another simulated task panicked.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Scripted chat server. Cheap to clone; clones share one [`ServerLog`].
#[derive(Debug, Clone)]
pub struct ChatServer {
    read_port: u16,
    write_port: u16,
    first_reader_lines: Vec<String>,
    hang_up_first_reader: bool,
    chatter: Option<Duration>,
    first_ack_delay: Option<Duration>,
    log: ServerLog,
}

impl ChatServer {
    /// Server on `read_port` and `write_port` with no accounts.
    pub fn new(read_port: u16, write_port: u16) -> Self {
        Self {
            read_port,
            write_port,
            first_reader_lines: Vec::new(),
            hang_up_first_reader: false,
            chatter: None,
            first_ack_delay: None,
            log: ServerLog::default(),
        }
    }

    /// Accept `token` as the account of `nickname`.
    #[must_use]
    pub fn with_account(self, token: &str, nickname: &str) -> Self {
        self.log.lock().accounts.insert(token.to_string(), nickname.to_string());
        self
    }

    /// Send `lines` to the first read connection only.
    #[must_use]
    pub fn greet_first_reader(mut self, lines: &[&str]) -> Self {
        self.first_reader_lines = lines.iter().map(|line| (*line).to_string()).collect();
        self
    }

    /// Close the first read connection right after accepting it.
    #[must_use]
    pub fn hang_up_first_reader(mut self) -> Self {
        self.hang_up_first_reader = true;
        self
    }

    /// Push a chat line to every read connection every `interval`.
    #[must_use]
    pub fn with_chatter(mut self, interval: Duration) -> Self {
        self.chatter = Some(interval);
        self
    }

    /// Hold back the first message prompt of the first write connection.
    #[must_use]
    pub fn delay_first_ack(mut self, delay: Duration) -> Self {
        self.first_ack_delay = Some(delay);
        self
    }

    /// Shared record of what the server saw.
    pub fn log(&self) -> ServerLog {
        self.log.clone()
    }

    /// Accept connections on both ports until the simulation ends.
    pub async fn serve(self) -> turmoil::Result {
        let readers = TcpListener::bind(format!("0.0.0.0:{}", self.read_port).as_str()).await?;
        let writers = TcpListener::bind(format!("0.0.0.0:{}", self.write_port).as_str()).await?;

        tokio::try_join!(self.clone().accept_readers(readers), self.accept_writers(writers))?;
        Ok(())
    }

    async fn accept_readers(self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let first = {
                let mut log = self.log.lock();
                log.read_connections += 1;
                log.read_connections == 1
            };
            tracing::debug!(%peer, first, "read connection accepted");
            tokio::spawn(self.clone().serve_reader(stream, first));
        }
    }

    async fn accept_writers(self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let first = {
                let mut log = self.log.lock();
                log.write_connections += 1;
                log.write_connections == 1
            };
            tracing::debug!(%peer, first, "write connection accepted");

            let server = self.clone();
            tokio::spawn(async move {
                if let Err(err) = server.serve_writer(stream, first).await {
                    tracing::debug!(error = %err, "write connection ended");
                }
            });
        }
    }

    async fn serve_reader(self, mut stream: TcpStream, first: bool) {
        if first && self.hang_up_first_reader {
            return;
        }

        if first {
            for line in &self.first_reader_lines {
                if stream.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                    return;
                }
            }
        }

        match self.chatter {
            Some(interval) => loop {
                tokio::time::sleep(interval).await;
                if stream.write_all(b"[server] chatter\n").await.is_err() {
                    return;
                }
            },
            None => {
                // Hold the connection until the client leaves.
                let mut buf = [0u8; 64];
                while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
            },
        }
    }

    async fn serve_writer(self, stream: TcpStream, first: bool) -> io::Result<()> {
        let mut stream = BufReader::new(stream);
        send(&mut stream, GREETING).await?;

        let Some(token) = recv(&mut stream).await? else {
            return Ok(());
        };

        let nickname = if token.is_empty() {
            let Some(nickname) = self.register(&mut stream).await? else {
                return Ok(());
            };
            nickname
        } else {
            let known = self.log.lock().accounts.get(&token).cloned();
            let Some(nickname) = known else {
                self.log.lock().rejected_tokens += 1;
                send(&mut stream, "null\n").await?;
                return Ok(());
            };
            let reply = serde_json::json!({ "nickname": nickname, "account_hash": token });
            send(&mut stream, &format!("{reply}\n")).await?;
            nickname
        };

        if first && let Some(delay) = self.first_ack_delay {
            tokio::time::sleep(delay).await;
        }

        loop {
            send(&mut stream, MESSAGE_PROMPT).await?;

            let mut body = Vec::new();
            loop {
                match recv(&mut stream).await? {
                    None => return Ok(()),
                    Some(line) if line.is_empty() => break,
                    Some(line) => body.push(line),
                }
            }

            if !body.is_empty() {
                let text = body.join("\n");
                tracing::debug!(%nickname, %text, "message accepted");
                self.log.lock().messages.push(ReceivedMessage { nickname: nickname.clone(), text });
            }
        }
    }

    async fn register(&self, stream: &mut BufReader<TcpStream>) -> io::Result<Option<String>> {
        send(stream, NICKNAME_PROMPT).await?;
        let Some(nickname) = recv(stream).await? else {
            return Ok(None);
        };

        let account_hash = {
            let mut log = self.log.lock();
            log.registrations += 1;
            let hash = format!("account-{}", log.registrations);
            log.accounts.insert(hash.clone(), nickname.clone());
            hash
        };

        let reply = serde_json::json!({ "nickname": nickname, "account_hash": account_hash });
        send(stream, &format!("{reply}\n")).await?;
        Ok(Some(nickname))
    }
}

async fn send(stream: &mut BufReader<TcpStream>, line: &str) -> io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await
}

async fn recv(stream: &mut BufReader<TcpStream>) -> io::Result<Option<String>> {
    let mut line = String::new();
    if stream.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
