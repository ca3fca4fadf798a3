//! Chat history file.
//!
//! One incoming message per line, appended in arrival order. The file is
//! replayed to the console at startup.

use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};

use crate::error::CliError;

/// Read every line of the history at `path`.
///
/// A missing file is an empty history.
///
/// # Errors
///
/// - `CliError::History` if the file exists but cannot be read
pub async fn load(path: &Path) -> Result<Vec<String>, CliError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).lines().map(str::to_owned).collect()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no chat history yet");
            Ok(Vec::new())
        },
        Err(source) => Err(CliError::History { path: path.to_path_buf(), source }),
    }
}

/// Append-only history writer.
///
/// The file is opened on the first append. Failures are logged once; later
/// appends keep trying so a transient problem does not lose the rest of the
/// chat.
#[derive(Debug)]
pub struct HistoryWriter {
    path: PathBuf,
    file: Option<File>,
    failing: bool,
}

impl HistoryWriter {
    /// Writer appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), file: None, failing: false }
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` as one line.
    ///
    /// Returns the error only the first time appending fails after a success
    /// (or after startup), so the caller can report it once.
    pub async fn append(&mut self, message: &str) -> Option<io::Error> {
        match self.try_append(message).await {
            Ok(()) => {
                self.failing = false;
                None
            },
            Err(err) => {
                self.file = None;
                if self.failing {
                    tracing::debug!(
                        path = %self.path.display(),
                        error = %err,
                        "history append failed again"
                    );
                    return None;
                }
                self.failing = true;
                tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    "cannot write chat history"
                );
                Some(err)
            },
        }
    }

    async fn try_append(&mut self, message: &str) -> io::Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new().create(true).append(true).open(&self.path).await?,
        };
        let file = self.file.insert(file);

        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
