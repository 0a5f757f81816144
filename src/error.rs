//! Top-level error for the daemon and CLI flows.

use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("signal: {0}")]
    Signal(#[from] nix::Error),
    #[error("hotbind is already running (pid {0})")]
    AlreadyRunning(i32),
    #[error("'{0}' is already bound; pass --force to overwrite")]
    AlreadyBound(String),
    #[error("'{0}' is not bound")]
    NotBound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("failed to save shortcuts")]
    SaveFailed,
    #[error("recording cancelled")]
    Cancelled,
}
