//! Engine and extension runtime traits

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::memory::MemoryLevel;

/// Opaque handle to an engine-side session (one per rendered tab)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineSessionHandle(u64);

impl EngineSessionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Tab overrides the extension runtime calls back into, on the UI thread.
pub trait TabDelegate: Send + Sync {
    /// An extension opened a tab. Returns the id of the created session.
    fn on_new_tab(
        &self,
        extension_id: Option<&str>,
        engine_session: EngineSessionHandle,
        url: &str,
    ) -> Option<String>;

    /// Returns `true` if a session was removed.
    fn on_close_tab(&self, extension_id: Option<&str>, session_id: &str) -> bool;

    /// Returns `true` if a session was selected.
    fn on_select_tab(&self, extension_id: Option<&str>, session_id: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePermissionRequest {
    pub addon_id: String,
    pub new_version: String,
    /// Permissions the updated add-on asks for
    pub permissions: Vec<String>,
}

pub trait UpdatePermissionHandler: Send + Sync {
    /// Returns `true` when the update may proceed with the requested permissions.
    fn on_update_permission_request(&self, request: &UpdatePermissionRequest) -> bool;
}

pub trait WebExtensionRuntime: Send + Sync {
    fn register_tab_delegate(&self, delegate: Arc<dyn TabDelegate>);

    fn register_update_permission_handler(&self, handler: Arc<dyn UpdatePermissionHandler>);
}

pub trait Engine: WebExtensionRuntime {
    /// Start engine processes ahead of the first page load
    fn warm_up(&self);

    fn create_session(&self) -> EngineSessionHandle;

    /// Drop caches (icons, decoded images) under memory pressure
    fn trim_memory(&self, level: MemoryLevel);

    fn deliver_push(&self, scope: &str, payload: Option<Vec<u8>>);

    fn deliver_subscription_change(&self, scope: &str);
}
