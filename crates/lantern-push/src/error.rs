//! Push error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Push processor already installed")]
    AlreadyInstalled,

    #[error("No async runtime available")]
    NoRuntime,

    #[error("Invalid push configuration: {0}")]
    InvalidConfig(String),
}
