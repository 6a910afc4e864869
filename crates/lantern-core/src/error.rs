//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] lantern_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] lantern_session::SessionError),

    #[error("Extension error: {0}")]
    Extension(#[from] lantern_extensions::ExtensionError),

    #[error("Push error: {0}")]
    Push(#[from] lantern_push::PushError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Crash reporter already installed")]
    CrashReporterInstalled,

    #[error("Application not initialized")]
    NotInitialized,
}
