//! Browser activity
//!
//! Runs once the main window exists: restores the previous sessions, then
//! connects web extensions and push.

use std::sync::{Arc, OnceLock};

use lantern_extensions::WebExtensionSupport;
use lantern_push::{initialize_push, PushFeature, PushOutcome};

use crate::application::Application;
use crate::components::Components;

pub struct BrowserActivity {
    app: Arc<Application>,
    push_outcome: OnceLock<PushOutcome>,
}

impl BrowserActivity {
    pub fn new(app: Arc<Application>) -> Arc<Self> {
        Arc::new(Self {
            app,
            push_outcome: OnceLock::new(),
        })
    }

    /// Post activity setup behind anything already queued, including
    /// application startup.
    pub fn on_create(self: &Arc<Self>) {
        let activity = Arc::clone(self);
        self.app.ui().post(move || {
            let Some(components) = activity.app.components() else {
                tracing::warn!("Activity created before components, skipping setup");
                return;
            };

            restore_browser(&components);
            initialize_web_extension_support(&components);
            let outcome = initialize_push_processor(&components);
            let _ = activity.push_outcome.set(outcome);
        });
    }

    pub fn push_outcome(&self) -> Option<PushOutcome> {
        self.push_outcome.get().copied()
    }
}

fn restore_browser(components: &Arc<Components>) {
    components.engine().warm_up();

    let persistence = Arc::clone(components.persistence());
    tokio::spawn(async move {
        if let Some(outcome) = persistence.restore_and_arm().await {
            tracing::info!(restored = outcome.count(), "Browser restored");
        }
    });
}

fn initialize_web_extension_support(components: &Components) {
    WebExtensionSupport::initialize(
        components.engine().as_ref(),
        components.tabs().clone(),
        Arc::clone(components.addon_updater()),
    );
}

fn initialize_push_processor(components: &Components) -> PushOutcome {
    let feature = components
        .push_feature()
        .map(|feature| Arc::clone(feature) as Arc<dyn PushFeature>);

    initialize_push(
        feature,
        components.push_processor(),
        Arc::clone(components.engine()),
        Arc::clone(components.account_manager()),
    )
}
