//! Component wiring
//!
//! Everything the main process needs, built once in dependency order and
//! shared as an `Arc<Components>`.

use std::sync::Arc;
use tokio::sync::watch;

use lantern_engine::Engine;
use lantern_extensions::{AddonManager, AddonUpdater};
use lantern_push::{AccountManager, AutoPushFeature, Lazy, LocalAccountManager, PushProcessor};
use lantern_session::{AppLifecycle, SessionManager, SessionPersistence, TabsUseCases};
use lantern_storage::{Database, SessionStorage, SnapshotBackend};

use crate::analytics::Telemetry;
use crate::config::Config;
use crate::crash::CrashReporter;
use crate::http::HttpClientConfig;
use crate::Result;

/// Services that exist in every process, before components are built
#[derive(Clone)]
pub struct SharedServices {
    pub crash_reporter: Arc<CrashReporter>,
    pub telemetry: Arc<Telemetry>,
    pub http: Arc<HttpClientConfig>,
}

impl SharedServices {
    pub fn new(config: &Config) -> Self {
        Self {
            crash_reporter: Arc::new(CrashReporter::new()),
            telemetry: Arc::new(Telemetry::new()),
            http: Arc::new(HttpClientConfig::new(config.user_agent.clone())),
        }
    }
}

pub struct Components {
    engine: Arc<dyn Engine>,
    services: SharedServices,
    session_storage: SessionStorage,
    tabs: TabsUseCases,
    addon_manager: Arc<AddonManager>,
    addon_updater: Arc<AddonUpdater>,
    push_feature: Option<Arc<AutoPushFeature>>,
    push_processor: PushProcessor,
    account_manager: Arc<Lazy<dyn AccountManager>>,
    persistence: Arc<SessionPersistence>,
    lifecycle: watch::Sender<AppLifecycle>,
}

impl Components {
    pub fn build(config: &Config, engine: Arc<dyn Engine>, services: SharedServices) -> Result<Self> {
        let db = match Database::open(&config.database_path) {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(
                    path = %config.database_path.display(),
                    "Failed to open session database, sessions will not survive restart: {}",
                    e
                );
                services.crash_reporter.submit_non_fatal(&e);
                Database::open_in_memory()?
            }
        };
        let session_storage = SessionStorage::new(db);

        let tabs = TabsUseCases::new(SessionManager::with_engine(Arc::clone(&engine)));

        let addon_manager = Arc::new(AddonManager::new());
        let addon_updater = Arc::new(AddonUpdater::new(Arc::clone(&addon_manager)));

        let push_feature = config
            .push
            .clone()
            .map(|push| Arc::new(AutoPushFeature::new(push)));

        let account_manager: Arc<Lazy<dyn AccountManager>> = Arc::new(Lazy::new(|| async {
            Arc::new(LocalAccountManager::new()) as Arc<dyn AccountManager>
        }));

        let (lifecycle, lifecycle_rx) = watch::channel(AppLifecycle::Foreground);
        let backend: Arc<dyn SnapshotBackend> = Arc::new(session_storage.clone());
        let persistence = Arc::new(SessionPersistence::new(
            tabs.clone(),
            backend,
            lifecycle_rx,
            config.autosave_interval(),
        ));

        tracing::info!(
            push_enabled = push_feature.is_some(),
            "Components built"
        );

        Ok(Self {
            engine,
            services,
            session_storage,
            tabs,
            addon_manager,
            addon_updater,
            push_feature,
            push_processor: PushProcessor::new(),
            account_manager,
            persistence,
            lifecycle,
        })
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn session_manager(&self) -> &SessionManager {
        self.tabs.manager()
    }

    pub fn tabs(&self) -> &TabsUseCases {
        &self.tabs
    }

    pub fn session_storage(&self) -> &SessionStorage {
        &self.session_storage
    }

    pub fn addon_manager(&self) -> &Arc<AddonManager> {
        &self.addon_manager
    }

    pub fn addon_updater(&self) -> &Arc<AddonUpdater> {
        &self.addon_updater
    }

    pub fn push_feature(&self) -> Option<&Arc<AutoPushFeature>> {
        self.push_feature.as_ref()
    }

    pub fn push_processor(&self) -> &PushProcessor {
        &self.push_processor
    }

    pub fn account_manager(&self) -> &Arc<Lazy<dyn AccountManager>> {
        &self.account_manager
    }

    pub fn persistence(&self) -> &Arc<SessionPersistence> {
        &self.persistence
    }

    pub fn crash_reporter(&self) -> &Arc<CrashReporter> {
        &self.services.crash_reporter
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.services.telemetry
    }

    pub fn http(&self) -> &Arc<HttpClientConfig> {
        &self.services.http
    }

    pub fn lifecycle(&self) -> AppLifecycle {
        *self.lifecycle.borrow()
    }

    /// Returns `true` if the state changed
    pub fn set_lifecycle(&self, state: AppLifecycle) -> bool {
        self.lifecycle.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }
}
