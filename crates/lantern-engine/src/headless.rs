//! Headless engine
//!
//! Stands in for a rendering engine: allocates session handles, records
//! push deliveries and trims, and holds the extension runtime delegates so
//! extension-originated tab requests can be replayed through them.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::engine::{
    Engine, EngineSessionHandle, TabDelegate, UpdatePermissionHandler, UpdatePermissionRequest,
    WebExtensionRuntime,
};
use crate::memory::MemoryLevel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushDelivery {
    Message {
        scope: String,
        payload: Option<Vec<u8>>,
    },
    SubscriptionChanged {
        scope: String,
    },
}

#[derive(Default)]
pub struct HeadlessEngine {
    next_session_id: AtomicU64,
    warmed_up: AtomicBool,
    tab_delegate: RwLock<Option<Arc<dyn TabDelegate>>>,
    permission_handler: RwLock<Option<Arc<dyn UpdatePermissionHandler>>>,
    deliveries: Mutex<Vec<PushDelivery>>,
    trims: Mutex<Vec<MemoryLevel>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up.load(Ordering::SeqCst)
    }

    pub fn has_tab_delegate(&self) -> bool {
        self.tab_delegate.read().is_some()
    }

    /// Simulate an extension calling `tabs.create`
    pub fn open_tab_from_extension(&self, extension_id: &str, url: &str) -> Option<String> {
        let delegate = self.tab_delegate.read().clone()?;
        let engine_session = self.create_session();
        delegate.on_new_tab(Some(extension_id), engine_session, url)
    }

    /// Simulate an extension calling `tabs.remove`
    pub fn close_tab_from_extension(&self, extension_id: &str, session_id: &str) -> bool {
        let delegate = self.tab_delegate.read().clone();
        delegate.is_some_and(|d| d.on_close_tab(Some(extension_id), session_id))
    }

    /// Simulate an extension calling `tabs.update({ active: true })`
    pub fn select_tab_from_extension(&self, extension_id: &str, session_id: &str) -> bool {
        let delegate = self.tab_delegate.read().clone();
        delegate.is_some_and(|d| d.on_select_tab(Some(extension_id), session_id))
    }

    /// Simulate an add-on update that needs new permissions.
    /// Returns `None` when no handler is registered.
    pub fn request_update_permissions(&self, request: &UpdatePermissionRequest) -> Option<bool> {
        let handler = self.permission_handler.read().clone()?;
        Some(handler.on_update_permission_request(request))
    }

    pub fn deliveries(&self) -> Vec<PushDelivery> {
        self.deliveries.lock().clone()
    }

    pub fn trims(&self) -> Vec<MemoryLevel> {
        self.trims.lock().clone()
    }
}

impl WebExtensionRuntime for HeadlessEngine {
    fn register_tab_delegate(&self, delegate: Arc<dyn TabDelegate>) {
        *self.tab_delegate.write() = Some(delegate);
    }

    fn register_update_permission_handler(&self, handler: Arc<dyn UpdatePermissionHandler>) {
        *self.permission_handler.write() = Some(handler);
    }
}

impl Engine for HeadlessEngine {
    fn warm_up(&self) {
        if !self.warmed_up.swap(true, Ordering::SeqCst) {
            tracing::debug!("Headless engine warmed up");
        }
    }

    fn create_session(&self) -> EngineSessionHandle {
        EngineSessionHandle::new(self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn trim_memory(&self, level: MemoryLevel) {
        tracing::debug!(level = %level, "Trimming engine caches");
        self.trims.lock().push(level);
    }

    fn deliver_push(&self, scope: &str, payload: Option<Vec<u8>>) {
        self.deliveries.lock().push(PushDelivery::Message {
            scope: scope.to_string(),
            payload,
        });
    }

    fn deliver_subscription_change(&self, scope: &str) {
        self.deliveries.lock().push(PushDelivery::SubscriptionChanged {
            scope: scope.to_string(),
        });
    }
}
