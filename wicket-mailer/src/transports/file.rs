use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lettre::Transport;

use crate::{Email, Mailer, MailerError};

/// Drops every message into a directory as an `.eml` file, for local
/// development.
#[derive(Debug, Clone)]
pub struct FileTransport {
    inner: lettre::FileTransport,
    dir: PathBuf,
}

impl FileTransport {
    /// Create the transport, making `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, MailerError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            inner: lettre::FileTransport::new(&dir),
            dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Mailer for FileTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let message = email.into_message()?;
        let inner = self.inner.clone();

        let id = tokio::task::spawn_blocking(move || inner.send(&message))
            .await
            .map_err(|e| MailerError::Task(e.to_string()))??;

        tracing::debug!(%id, dir = %self.dir.display(), "Wrote email file");
        Ok(())
    }
}
