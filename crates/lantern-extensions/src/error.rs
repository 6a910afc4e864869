//! Extension error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Add-on already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Add-on not installed: {0}")]
    NotInstalled(String),

    #[error("Add-on dependency provider already initialized")]
    ProviderAlreadyInitialized,
}
