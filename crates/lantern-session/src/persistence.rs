//! Session persistence
//!
//! Restores the persisted session set once, then arms autosave. Only the
//! first call does anything, so one scheduler exists per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::watch;

use lantern_storage::SnapshotBackend;

use crate::autosave::{AppLifecycle, AutoSave, AutoSaveHandle};
use crate::use_cases::{RestoreOutcome, TabsUseCases};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistencePhase {
    Idle,
    Restoring,
    Armed { restored: usize },
}

pub struct SessionPersistence {
    use_cases: TabsUseCases,
    backend: Arc<dyn SnapshotBackend>,
    lifecycle: watch::Receiver<AppLifecycle>,
    interval: Duration,
    started: AtomicBool,
    phase: watch::Sender<PersistencePhase>,
    autosave: OnceLock<AutoSaveHandle>,
}

impl SessionPersistence {
    pub fn new(
        use_cases: TabsUseCases,
        backend: Arc<dyn SnapshotBackend>,
        lifecycle: watch::Receiver<AppLifecycle>,
        interval: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(PersistencePhase::Idle);

        Self {
            use_cases,
            backend,
            lifecycle,
            interval,
            started: AtomicBool::new(false),
            phase,
            autosave: OnceLock::new(),
        }
    }

    /// Restore the previous session set, then start saving it.
    ///
    /// Returns `None` if persistence was already started.
    pub async fn restore_and_arm(&self) -> Option<RestoreOutcome> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session persistence already started, ignoring");
            return None;
        }

        self.phase.send_replace(PersistencePhase::Restoring);

        let outcome = self.use_cases.restore(self.backend.as_ref()).await;

        let handle = AutoSave::new(
            self.use_cases.manager().clone(),
            Arc::clone(&self.backend),
            self.lifecycle.clone(),
        )
        .periodically_in_foreground(self.interval)
        .when_going_to_background()
        .when_sessions_change()
        .start();

        if self.autosave.set(handle).is_err() {
            tracing::error!("Autosave armed twice");
        }

        self.phase.send_replace(PersistencePhase::Armed {
            restored: outcome.count(),
        });

        Some(outcome)
    }

    pub fn phase(&self) -> watch::Receiver<PersistencePhase> {
        self.phase.subscribe()
    }

    pub fn autosave(&self) -> Option<&AutoSaveHandle> {
        self.autosave.get()
    }
}
