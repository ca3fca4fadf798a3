//! Keyboard input.
//!
//! Lines are read on a dedicated OS thread and handed to the runtime over a
//! channel. A pending read never delays runtime shutdown.

use std::{
    io::{self, BufRead},
    thread,
};

use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Read lines from stdin.
///
/// # Errors
///
/// - the reader thread could not be spawned
pub fn stdin_lines() -> io::Result<UnboundedReceiver<String>> {
    spawn_reader(|| io::stdin().lock())
}

/// Read lines from the reader built by `open` on a detached thread.
///
/// The channel closes at end of input or on the first read error. The thread
/// exits once the receiver is gone and the next line arrives; until then it is
/// left behind, which does not keep the process alive.
///
/// # Errors
///
/// - the reader thread could not be spawned
pub fn spawn_reader<R, F>(open: F) -> io::Result<UnboundedReceiver<String>>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    thread::Builder::new().name("minechat-input".to_string()).spawn(move || {
        for line in open().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "cannot read input");
                    return;
                },
            }
        }
        tracing::debug!("end of input");
    })?;

    Ok(rx)
}
