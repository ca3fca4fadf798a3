//! Write-port handshakes.
//!
//! ```text
//! authorize                      register
//! server: greeting               server: greeting
//! client: <token>                client: <empty line>
//! server: {"nickname": ..}       server: nickname prompt
//!                                client: <nickname>
//!                                server: {"nickname": .., "account_hash": ..}
//! ```
//!
//! Only I/O lives here; reply decoding is in [`minechat_core::protocol`].

use minechat_core::{Identity, Registration, protocol};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{error::ChannelError, line::LineConnection};

/// Authenticate with `token`.
///
/// # Errors
///
/// - `ChannelError::Auth` if the server rejected the token or answered with
///   something other than a JSON object
/// - `ChannelError::Io` / `ChannelError::Closed` on socket failure
pub async fn authorize<S>(
    connection: &mut LineConnection<S>,
    token: &str,
) -> Result<Identity, ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = next_line(connection).await?;
    tracing::debug!(?greeting, "server greeting");

    connection.write_line(token).await?;

    let reply = next_line(connection).await?;
    tracing::debug!(?reply, "authorization reply");

    let identity = protocol::parse_auth_reply(&reply).inspect_err(|err| {
        tracing::error!(error = %err, "authorization failed, check the token");
    })?;
    tracing::info!(nickname = %identity.nickname, "authorized");

    Ok(identity)
}

/// Create a new account for `nickname`.
///
/// The nickname is sanitized before it is sent.
///
/// # Errors
///
/// - `ChannelError::Auth` if the server refused the registration
/// - `ChannelError::Io` / `ChannelError::Closed` on socket failure
pub async fn register<S>(
    connection: &mut LineConnection<S>,
    nickname: &str,
) -> Result<Registration, ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = next_line(connection).await?;
    tracing::debug!(?greeting, "server greeting");

    connection.write_line("").await?;

    let prompt = next_line(connection).await?;
    tracing::debug!(?prompt, "nickname prompt");

    let nickname = protocol::sanitize_nickname(nickname);
    connection.write_line(&nickname).await?;

    let reply = next_line(connection).await?;
    tracing::debug!(?reply, "registration reply");

    let registration = protocol::parse_registration_reply(&reply)?;
    tracing::info!(nickname = %registration.nickname, "registered");

    Ok(registration)
}

async fn next_line<S>(connection: &mut LineConnection<S>) -> Result<String, ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    connection.read_line().await?.ok_or(ChannelError::Closed)
}

#[cfg(test)]
mod tests {
    use minechat_core::AuthError;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

    use super::*;

    /// Scripted server side of a duplex pair.
    struct FakeServer {
        stream: BufReader<DuplexStream>,
    }

    impl FakeServer {
        fn pair() -> (LineConnection<DuplexStream>, Self) {
            let (client, server) = duplex(1024);
            (LineConnection::new(client), Self { stream: BufReader::new(server) })
        }

        async fn send(&mut self, line: &str) {
            self.stream.get_mut().write_all(line.as_bytes()).await.unwrap();
        }

        async fn recv(&mut self) -> String {
            let mut line = String::new();
            self.stream.read_line(&mut line).await.unwrap();
            line
        }
    }

    #[tokio::test]
    async fn authorize_returns_nickname() {
        let (mut connection, mut server) = FakeServer::pair();

        let server = tokio::spawn(async move {
            server.send("Hello %username%! Enter your personal hash.\n").await;
            let token = server.recv().await;
            server.send("{\"nickname\": \"X\", \"account_hash\": \"abc\"}\n").await;
            token
        });

        let identity = authorize(&mut connection, "abc").await.unwrap();
        assert_eq!(identity, Identity { nickname: "X".to_string() });
        assert_eq!(server.await.unwrap(), "abc\n");
    }

    #[tokio::test]
    async fn authorize_null_reply_is_invalid_token() {
        let (mut connection, mut server) = FakeServer::pair();

        tokio::spawn(async move {
            server.send("greeting\n").await;
            server.recv().await;
            server.send("null\n").await;
        });

        let err = authorize(&mut connection, "wrong").await.unwrap_err();
        assert!(matches!(err, ChannelError::Auth(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn authorize_non_json_reply_is_malformed() {
        let (mut connection, mut server) = FakeServer::pair();

        tokio::spawn(async move {
            server.send("greeting\n").await;
            server.recv().await;
            server.send("Welcome to chat!\n").await;
        });

        let err = authorize(&mut connection, "abc").await.unwrap_err();
        assert!(matches!(err, ChannelError::Auth(AuthError::MalformedReply { .. })));
    }

    #[tokio::test]
    async fn authorize_eof_is_closed() {
        let (mut connection, mut server) = FakeServer::pair();

        tokio::spawn(async move {
            server.send("greeting\n").await;
            server.recv().await;
        });

        let err = authorize(&mut connection, "abc").await.unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
    }

    #[tokio::test]
    async fn register_sends_empty_line_then_clean_nickname() {
        let (mut connection, mut server) = FakeServer::pair();

        let server = tokio::spawn(async move {
            server.send("Hello %username%! Enter your personal hash.\n").await;
            let skip = server.recv().await;
            server.send("Enter preferred nickname below:\n").await;
            let nickname = server.recv().await;
            server.send("{\"nickname\": \"Steve\", \"account_hash\": \"f00d\"}\n").await;
            (skip, nickname)
        });

        let registration = register(&mut connection, "Ste\\nve").await.unwrap();
        assert_eq!(registration, Registration {
            nickname: "Steve".to_string(),
            account_hash: "f00d".to_string(),
        });
        assert_eq!(server.await.unwrap(), ("\n".to_string(), "Steve\n".to_string()));
    }

    #[tokio::test]
    async fn register_null_reply_is_rejected() {
        let (mut connection, mut server) = FakeServer::pair();

        tokio::spawn(async move {
            server.send("greeting\n").await;
            server.recv().await;
            server.send("prompt\n").await;
            server.recv().await;
            server.send("null\n").await;
        });

        let err = register(&mut connection, "Steve").await.unwrap_err();
        assert!(matches!(err, ChannelError::Auth(AuthError::RegistrationRejected { .. })));
    }
}
