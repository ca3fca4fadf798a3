//! Line-oriented console output.
//!
//! Chat messages are printed as they arrive. Status changes and alerts are
//! interleaved with them, marked so they stand out from chat text.

use std::io;

use minechat_core::{Alert, StatusEvent};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Prefix of connection status lines.
pub const STATUS_MARK: &str = "* ";

/// Prefix of alert lines.
pub const ALERT_MARK: &str = "! ";

/// Console writer over any async byte sink.
#[derive(Debug)]
pub struct Console<W> {
    out: W,
    broken: bool,
}

impl<W> Console<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap `out`.
    pub fn new(out: W) -> Self {
        Self { out, broken: false }
    }

    /// Print a chat message.
    pub async fn message(&mut self, text: &str) {
        self.line("", text).await;
    }

    /// Print a connection status change.
    pub async fn status(&mut self, event: &StatusEvent) {
        self.line(STATUS_MARK, &event.to_string()).await;
    }

    /// Print an alert.
    pub async fn alert(&mut self, alert: &Alert) {
        self.line(ALERT_MARK, &alert.to_string()).await;
    }

    /// Print a client notice.
    pub async fn notice(&mut self, text: &str) {
        self.line(STATUS_MARK, text).await;
    }

    /// Give back the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    async fn line(&mut self, mark: &str, text: &str) {
        if self.broken {
            return;
        }

        let mut line = String::with_capacity(mark.len() + text.len() + 1);
        line.push_str(mark);
        line.push_str(text);
        line.push('\n');

        if let Err(err) = self.write(line.as_bytes()).await {
            // stdout is gone (closed pipe); the chat itself can go on
            self.broken = true;
            tracing::warn!(error = %err, "console output closed");
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes).await?;
        self.out.flush().await
    }
}

#[cfg(test)]
mod tests {
    use minechat_core::{Channel, ConnectionState};

    use super::*;

    #[tokio::test]
    async fn separates_chat_from_status() {
        let mut console = Console::new(Vec::new());

        console.message("hello").await;
        console
            .status(&StatusEvent::ConnectionStateChanged {
                channel: Channel::Read,
                state: ConnectionState::Established,
            })
            .await;
        console.alert(&Alert::InvalidToken).await;

        let text = String::from_utf8(console.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "hello");
        assert_eq!(lines[1], "* read: connection established");
        assert!(lines[2].starts_with("! invalid token"));
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn closed_output_is_tolerated() {
        let (out, screen) = tokio::io::duplex(16);
        drop(screen);

        let mut console = Console::new(out);
        console.message("nobody is listening").await;
        console.message("still nobody").await;

        assert!(console.broken);
    }
}
