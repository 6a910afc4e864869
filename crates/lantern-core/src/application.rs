//! Application lifecycle
//!
//! Owns the startup sequence and, in the main process, the components.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use lantern_engine::{Engine, MemoryLevel};
use lantern_extensions::AddonDependencyProvider;
use lantern_session::{AppLifecycle, SystemAction};

use crate::components::{Components, SharedServices};
use crate::config::Config;
use crate::logging::init_logging;
use crate::process::{ProcessGuard, ProcessIdentity};
use crate::sequencer::{StartupPhase, StartupSequencer, StartupStep};
use crate::ui::UiQueue;
use crate::Result;

pub struct Application {
    config: Config,
    guard: ProcessGuard,
    engine: Arc<dyn Engine>,
    ui: UiQueue,
    sequencer: Arc<StartupSequencer>,
    services: SharedServices,
    addon_provider: AddonDependencyProvider,
    components: OnceLock<Arc<Components>>,
}

impl Application {
    pub fn new(
        config: Config,
        identity: ProcessIdentity,
        engine: Arc<dyn Engine>,
        ui: UiQueue,
    ) -> Arc<Self> {
        let guard = ProcessGuard::new(identity);
        let services = SharedServices::new(&config);

        Arc::new(Self {
            sequencer: Arc::new(StartupSequencer::new(guard.clone())),
            config,
            guard,
            engine,
            ui,
            services,
            addon_provider: AddonDependencyProvider::new(),
            components: OnceLock::new(),
        })
    }

    /// Post the startup phases to the UI queue.
    pub fn on_create(self: &Arc<Self>) {
        let pre = Arc::clone(self);
        let post = Arc::clone(self);
        self.sequencer.start(
            &self.ui,
            move || pre.pre_main_steps(),
            move || post.post_main_steps(),
        );
    }

    fn pre_main_steps(&self) -> Vec<StartupStep> {
        let mut steps = Vec::new();

        if self.config.crash_reporting_enabled {
            let crash_reporter = Arc::clone(&self.services.crash_reporter);
            steps.push(StartupStep::new("crash-reporting", move || {
                crash_reporter.install()
            }));
        }

        let http = Arc::clone(&self.services.http);
        steps.push(StartupStep::new("http-client", move || {
            http.configure();
            Ok(())
        }));

        steps.push(StartupStep::new("logging", init_logging));

        steps
    }

    fn post_main_steps(self: &Arc<Self>) -> Vec<StartupStep> {
        let components = match self.build_components() {
            Ok(components) => components,
            Err(e) => {
                return vec![StartupStep::new("components", move || Err(e))];
            }
        };

        let app = Arc::clone(self);
        let addons = Arc::clone(&components);
        let telemetry = Arc::clone(components.telemetry());
        let upload_enabled = self.config.telemetry_enabled;

        vec![
            StartupStep::new("addon-provider", move || {
                app.addon_provider
                    .initialize(
                        Arc::clone(addons.addon_manager()),
                        Arc::clone(addons.addon_updater()),
                    )
                    .map_err(Into::into)
            }),
            StartupStep::new("telemetry", move || {
                telemetry.initialize(upload_enabled);
                Ok(())
            }),
        ]
    }

    fn build_components(&self) -> Result<Arc<Components>> {
        if let Some(components) = self.components.get() {
            return Ok(Arc::clone(components));
        }

        let components = Arc::new(Components::build(
            &self.config,
            Arc::clone(&self.engine),
            self.services.clone(),
        )?);
        Ok(Arc::clone(self.components.get_or_init(|| components)))
    }

    /// Built once post-main initialization has run in the main process
    pub fn components(&self) -> Option<Arc<Components>> {
        self.components.get().cloned()
    }

    pub fn is_main_process(&self) -> bool {
        self.guard.is_main_process()
    }

    pub fn phase(&self) -> StartupPhase {
        self.sequencer.phase()
    }

    pub fn sequencer(&self) -> &StartupSequencer {
        &self.sequencer
    }

    pub fn services(&self) -> &SharedServices {
        &self.services
    }

    pub fn addon_provider(&self) -> &AddonDependencyProvider {
        &self.addon_provider
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn ui(&self) -> &UiQueue {
        &self.ui
    }

    /// Platform memory-pressure signal. Ignored outside the main process.
    pub fn on_trim_memory(&self, level: i32) {
        self.guard.run_only_in_main_process(|| {
            let Some(level) = MemoryLevel::from_trim_level(level) else {
                tracing::debug!(level, "Ignoring unknown trim level");
                return;
            };

            if let Some(components) = self.components() {
                components
                    .session_manager()
                    .dispatch(SystemAction::LowMemory(level));
            }
            self.engine.trim_memory(level);
        });
    }

    pub fn on_foreground(&self) {
        self.set_lifecycle(AppLifecycle::Foreground);
    }

    pub fn on_background(&self) {
        self.set_lifecycle(AppLifecycle::Background);
    }

    /// Move to the background and wait up to `timeout` for the save that
    /// triggers. Returns `true` once a save has finished.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let Some(components) = self.components() else {
            return false;
        };
        let Some(autosave) = components.persistence().autosave() else {
            tracing::warn!("Exiting before session restore finished");
            return false;
        };

        let mut stats = autosave.stats();
        let before = {
            let stats = stats.borrow_and_update();
            stats.completed + stats.failed
        };

        self.on_background();

        let saved = tokio::time::timeout(
            timeout,
            stats.wait_for(|s| s.completed + s.failed > before),
        )
        .await
        .map(|result| result.is_ok());

        match saved {
            Ok(true) => {
                tracing::info!("Sessions saved");
                true
            }
            Ok(false) => {
                tracing::warn!("Autosave stopped before the final save");
                false
            }
            Err(_) => {
                tracing::warn!("Timed out waiting for the final save");
                false
            }
        }
    }

    fn set_lifecycle(&self, state: AppLifecycle) {
        let Some(components) = self.components() else {
            return;
        };
        if components.set_lifecycle(state) {
            tracing::info!(state = ?state, "Application lifecycle changed");
            components.telemetry().record_event(match state {
                AppLifecycle::Foreground => "app_foreground",
                AppLifecycle::Background => "app_background",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_engine::HeadlessEngine;
    use lantern_session::TabState;
    use std::path::PathBuf;

    fn config() -> Config {
        let mut config = Config::new(PathBuf::from("/nonexistent"));
        config.database_path = PathBuf::from("/dev/null/lantern.db");
        config.crash_reporting_enabled = false;
        config
    }

    fn app(args: &[&str], engine: Arc<HeadlessEngine>) -> Arc<Application> {
        Application::new(
            config(),
            ProcessIdentity::from_args(args.iter().copied()),
            engine,
            UiQueue::spawn(),
        )
    }

    #[tokio::test]
    async fn test_main_process_runs_both_phases() {
        let app = app(&[], Arc::new(HeadlessEngine::new()));
        app.on_create();
        app.ui().flush().await;

        assert_eq!(app.phase(), StartupPhase::PostMainDone);
        assert!(app.components().is_some());
        assert!(app.addon_provider().is_initialized());
        assert!(app.services().telemetry.is_initialized());
        assert!(app.services().http.is_configured());
        assert!(!app.services().http.is_client_built());
    }

    #[tokio::test]
    async fn test_auxiliary_process_skips_post_main() {
        let app = app(&["--process-type=renderer"], Arc::new(HeadlessEngine::new()));
        app.on_create();
        app.ui().flush().await;

        assert_eq!(app.phase(), StartupPhase::PreMainDone);
        assert!(app.components().is_none());
        assert!(!app.addon_provider().is_initialized());
        assert!(!app.services().telemetry.is_initialized());
        assert!(app.services().http.is_configured());
    }

    #[tokio::test]
    async fn test_trim_memory_freezes_background_tabs() {
        let engine = Arc::new(HeadlessEngine::new());
        let app = app(&[], Arc::clone(&engine));
        app.on_create();
        app.ui().flush().await;

        let components = app.components().unwrap();
        let first = components.tabs().add_tab("https://a.example", true, None).unwrap();
        let second = components.tabs().add_tab("https://b.example", true, None).unwrap();

        app.on_trim_memory(MemoryLevel::RunningLow.trim_level());

        let manager = components.session_manager();
        assert_eq!(manager.find_session_by_id(&first).unwrap().state, TabState::Frozen);
        assert_eq!(manager.find_session_by_id(&second).unwrap().state, TabState::Active);
        assert_eq!(engine.trims(), vec![MemoryLevel::RunningLow]);
    }

    #[tokio::test]
    async fn test_trim_memory_ignored_in_auxiliary_process() {
        let engine = Arc::new(HeadlessEngine::new());
        let app = app(&["--process-type=gpu"], Arc::clone(&engine));
        app.on_create();
        app.ui().flush().await;

        app.on_trim_memory(MemoryLevel::Complete.trim_level());
        assert!(engine.trims().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let app = app(&[], Arc::new(HeadlessEngine::new()));
        app.on_create();
        app.ui().flush().await;

        let components = app.components().unwrap();
        app.on_background();
        assert_eq!(components.lifecycle(), AppLifecycle::Background);
        app.on_foreground();
        assert_eq!(components.lifecycle(), AppLifecycle::Foreground);
    }
}
