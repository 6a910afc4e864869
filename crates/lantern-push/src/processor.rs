//! Push processor registry

use std::sync::{Arc, OnceLock};

use crate::error::PushError;
use crate::feature::PushFeature;
use crate::Result;

/// Holds the one push feature installed in this process.
#[derive(Default)]
pub struct PushProcessor {
    installed: OnceLock<Arc<dyn PushFeature>>,
}

impl PushProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installing a second feature is a configuration error.
    pub fn install(&self, feature: Arc<dyn PushFeature>) -> Result<()> {
        self.installed
            .set(feature)
            .map_err(|_| PushError::AlreadyInstalled)
    }

    pub fn get(&self) -> Option<Arc<dyn PushFeature>> {
        self.installed.get().cloned()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }
}
