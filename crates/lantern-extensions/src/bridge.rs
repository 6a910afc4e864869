//! Web-extension bridge
//!
//! Tab overrides the extension runtime calls on the UI thread. Every tab
//! mutation goes through the tab use-cases so autosave sees it.

use std::sync::Arc;

use lantern_engine::{
    EngineSessionHandle, TabDelegate, UpdatePermissionHandler, UpdatePermissionRequest,
    WebExtensionRuntime,
};
use lantern_session::TabsUseCases;

use crate::addons::AddonUpdater;

pub struct WebExtensionBridge {
    use_cases: TabsUseCases,
    updater: Arc<AddonUpdater>,
}

impl WebExtensionBridge {
    pub fn new(use_cases: TabsUseCases, updater: Arc<AddonUpdater>) -> Self {
        Self { use_cases, updater }
    }
}

impl TabDelegate for WebExtensionBridge {
    fn on_new_tab(
        &self,
        extension_id: Option<&str>,
        engine_session: EngineSessionHandle,
        url: &str,
    ) -> Option<String> {
        match self.use_cases.add_tab(url, true, Some(engine_session)) {
            Ok(session_id) => {
                tracing::debug!(
                    extension_id = ?extension_id,
                    session_id = %session_id,
                    "Extension opened tab"
                );
                Some(session_id)
            }
            Err(e) => {
                tracing::warn!(extension_id = ?extension_id, "Extension tab rejected: {}", e);
                None
            }
        }
    }

    fn on_close_tab(&self, _extension_id: Option<&str>, session_id: &str) -> bool {
        self.use_cases.remove_tab(session_id)
    }

    fn on_select_tab(&self, _extension_id: Option<&str>, session_id: &str) -> bool {
        if self.use_cases.manager().find_session_by_id(session_id).is_none() {
            return false;
        }
        self.use_cases.select_tab(session_id)
    }
}

impl UpdatePermissionHandler for WebExtensionBridge {
    fn on_update_permission_request(&self, request: &UpdatePermissionRequest) -> bool {
        self.updater.on_update_permission_request(request)
    }
}

pub struct WebExtensionSupport;

impl WebExtensionSupport {
    /// Register the tab overrides and update handler with the runtime.
    pub fn initialize<R>(
        runtime: &R,
        use_cases: TabsUseCases,
        updater: Arc<AddonUpdater>,
    ) -> Arc<WebExtensionBridge>
    where
        R: WebExtensionRuntime + ?Sized,
    {
        let bridge = Arc::new(WebExtensionBridge::new(use_cases, updater));

        runtime.register_tab_delegate(Arc::clone(&bridge) as Arc<dyn TabDelegate>);
        runtime.register_update_permission_handler(
            Arc::clone(&bridge) as Arc<dyn UpdatePermissionHandler>
        );

        tracing::info!("Web extension support initialized");
        bridge
    }
}
