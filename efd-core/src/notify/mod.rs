mod email;
mod message;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use email::{EmailNotifier, SmtpCredentials};
pub use message::Notification;

pub type NotifyResult<T> = Result<T, NotifierError>;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("notifier configuration error: {0}")]
    Configuration(String),
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("notifier task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for NotifierError {
    fn from(err: tokio::task::JoinError) -> Self {
        NotifierError::Task(err.to_string())
    }
}

/// Best-effort delivery of a run summary to a fixed destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, attachments: &[PathBuf]) -> NotifyResult<()>;
}

pub(crate) fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}
