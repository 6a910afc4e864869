//! Logging setup

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::CoreError;
use crate::Result;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))
}
