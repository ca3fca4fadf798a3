//! In-memory network used by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::{Arc, Mutex},
};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

use crate::{error::ConnectError, net::Network};

/// Hands out pre-arranged duplex ends per port; refuses when none is queued.
#[derive(Debug, Clone, Default)]
pub(crate) struct DuplexNetwork {
    pending: Arc<Mutex<HashMap<u16, VecDeque<DuplexStream>>>>,
}

impl DuplexNetwork {
    /// Queue one connection on `port` and return the server side.
    pub(crate) fn accept(&self, port: u16) -> Peer {
        let (client, server) = duplex(4096);
        self.pending.lock().unwrap().entry(port).or_default().push_back(client);
        Peer { stream: BufReader::new(server) }
    }
}

impl Network for DuplexNetwork {
    type Stream = DuplexStream;

    async fn connect(&self, host: &str, port: u16) -> Result<DuplexStream, ConnectError> {
        let next = self.pending.lock().unwrap().get_mut(&port).and_then(VecDeque::pop_front);
        next.ok_or_else(|| ConnectError::Connect {
            host: host.to_string(),
            port,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        })
    }
}

/// Scripted server end of a [`DuplexNetwork`] connection.
#[derive(Debug)]
pub(crate) struct Peer {
    stream: BufReader<DuplexStream>,
}

impl Peer {
    pub(crate) async fn send(&mut self, line: &str) {
        self.stream.get_mut().write_all(line.as_bytes()).await.unwrap();
    }

    /// Send `line` every `interval` until the client hangs up.
    pub(crate) async fn chatter(mut self, line: &str, interval: std::time::Duration) {
        while self.stream.get_mut().write_all(line.as_bytes()).await.is_ok() {
            tokio::time::sleep(interval).await;
        }
    }

    /// Next line including its terminator; `None` once the client hung up.
    pub(crate) async fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.stream.read_line(&mut line).await.unwrap() {
            0 => None,
            _ => Some(line),
        }
    }

    /// Play the server side of a successful token handshake.
    pub(crate) async fn accept_token(&mut self, nickname: &str) -> String {
        self.send("Hello %username%! Enter your personal hash or leave it empty.\n").await;
        let token = self.recv().await.unwrap();
        self.send(&format!("{{\"nickname\": \"{nickname}\", \"account_hash\": \"abc\"}}\n")).await;
        token
    }
}
