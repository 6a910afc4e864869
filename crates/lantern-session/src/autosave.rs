//! Autosave scheduling
//!
//! A single driver task owns every trigger source and the coalescing state:
//! - periodic timer, ticking only while the application is in the foreground
//! - the foreground → background transition
//! - revisions published by the session manager
//!
//! At most one write is in flight. Triggers arriving meanwhile collapse into
//! one pending flag, and the trailing save only runs when the session set moved
//! past what the in-flight write captured (or that write failed).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use lantern_storage::{SnapshotBackend, StorageError};

use crate::manager::SessionManager;

pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);
pub const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    Periodic,
    Background,
    SessionsChanged,
    /// Follow-up for triggers merged into an in-flight save
    Trailing,
}

impl std::fmt::Display for SaveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SaveReason::Periodic => "periodic",
            SaveReason::Background => "background",
            SaveReason::SessionsChanged => "sessions-changed",
            SaveReason::Trailing => "trailing",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveStats {
    pub completed: u64,
    pub failed: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
}

/// Builder for the autosave driver
pub struct AutoSave {
    manager: SessionManager,
    backend: Arc<dyn SnapshotBackend>,
    lifecycle: watch::Receiver<AppLifecycle>,
    periodic: Option<Duration>,
    on_background: bool,
    on_change: bool,
}

impl AutoSave {
    pub fn new(
        manager: SessionManager,
        backend: Arc<dyn SnapshotBackend>,
        lifecycle: watch::Receiver<AppLifecycle>,
    ) -> Self {
        Self {
            manager,
            backend,
            lifecycle,
            periodic: None,
            on_background: false,
            on_change: false,
        }
    }

    /// Intervals below [`MIN_AUTOSAVE_INTERVAL`] are raised to it.
    pub fn periodically_in_foreground(mut self, interval: Duration) -> Self {
        self.periodic = Some(interval.max(MIN_AUTOSAVE_INTERVAL));
        self
    }

    pub fn when_going_to_background(mut self) -> Self {
        self.on_background = true;
        self
    }

    pub fn when_sessions_change(mut self) -> Self {
        self.on_change = true;
        self
    }

    /// Spawn the driver on the current tokio runtime
    pub fn start(self) -> AutoSaveHandle {
        let (stats_tx, stats) = watch::channel(SaveStats::default());

        tracing::info!(
            periodic_secs = self.periodic.map(|p| p.as_secs()),
            on_background = self.on_background,
            on_change = self.on_change,
            "Armed session autosave"
        );

        let task = tokio::spawn(self.run(stats_tx));

        AutoSaveHandle { stats, task }
    }

    async fn run(mut self, stats: watch::Sender<SaveStats>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SaveOutcome>();
        let mut coalescer = SaveCoalescer::default();

        // Changes made before arming (the restore itself) are not saved back
        let mut revisions = self.manager.subscribe();
        let mut captured_revision = *revisions.borrow_and_update();
        let mut revisions_open = self.on_change;

        let mut foreground = *self.lifecycle.borrow_and_update() == AppLifecycle::Foreground;
        let mut lifecycle_open = true;

        let period = self.periodic.unwrap_or(DEFAULT_AUTOSAVE_INTERVAL);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                _ = ticker.tick(), if self.periodic.is_some() && foreground => Event::Tick,
                changed = self.lifecycle.changed(), if lifecycle_open => Event::Lifecycle(changed.is_ok()),
                changed = revisions.changed(), if revisions_open => Event::Revision(changed.is_ok()),
                Some(outcome) = done_rx.recv() => Event::Completed(outcome),
            };

            let reason = match event {
                Event::Tick => Some(SaveReason::Periodic),
                Event::Lifecycle(false) => {
                    lifecycle_open = false;
                    None
                }
                Event::Lifecycle(true) => {
                    let now_foreground =
                        *self.lifecycle.borrow_and_update() == AppLifecycle::Foreground;
                    let went_background = foreground && !now_foreground;
                    if now_foreground && !foreground {
                        ticker.reset();
                    }
                    foreground = now_foreground;
                    (went_background && self.on_background).then_some(SaveReason::Background)
                }
                Event::Revision(false) => {
                    revisions_open = false;
                    None
                }
                Event::Revision(true) => {
                    let revision = *revisions.borrow_and_update();
                    (revision > captured_revision).then_some(SaveReason::SessionsChanged)
                }
                Event::Completed(outcome) => {
                    let succeeded = outcome.result.is_ok();
                    record(&stats, outcome);
                    coalescer
                        .finish(succeeded, self.manager.revision())
                        .then_some(SaveReason::Trailing)
                }
            };

            let Some(reason) = reason else {
                continue;
            };

            if !coalescer.request() {
                tracing::debug!(reason = %reason, "Save already in flight, merged request");
                continue;
            }

            let (snapshot, revision) = self.manager.snapshot();
            captured_revision = revision;
            coalescer.begin(revision);

            tracing::debug!(
                reason = %reason,
                revision,
                tab_count = snapshot.len(),
                "Saving sessions"
            );

            let backend = Arc::clone(&self.backend);
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let result = backend.write(snapshot).await;
                let _ = done_tx.send(SaveOutcome {
                    reason,
                    revision,
                    result,
                });
            });
        }
    }
}

pub struct AutoSaveHandle {
    stats: watch::Receiver<SaveStats>,
    task: JoinHandle<()>,
}

impl AutoSaveHandle {
    pub fn stats(&self) -> watch::Receiver<SaveStats> {
        self.stats.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

enum Event {
    Tick,
    Lifecycle(bool),
    Revision(bool),
    Completed(SaveOutcome),
}

struct SaveOutcome {
    reason: SaveReason,
    revision: u64,
    result: std::result::Result<(), StorageError>,
}

fn record(stats: &watch::Sender<SaveStats>, outcome: SaveOutcome) {
    match outcome.result {
        Ok(()) => {
            tracing::debug!(reason = %outcome.reason, revision = outcome.revision, "Saved sessions");
            stats.send_modify(|s| {
                s.completed += 1;
                s.last_saved_at = Some(Utc::now());
            });
        }
        Err(e) => {
            // Not retried here; the next trigger tries again
            tracing::warn!(reason = %outcome.reason, "Failed to save sessions: {}", e);
            stats.send_modify(|s| s.failed += 1);
        }
    }
}

#[derive(Debug, Default)]
struct SaveCoalescer {
    /// Revision captured by the write in flight
    in_flight: Option<u64>,
    pending: bool,
}

impl SaveCoalescer {
    /// Returns `true` when the caller should start a save now
    fn request(&mut self) -> bool {
        if self.in_flight.is_some() {
            self.pending = true;
            false
        } else {
            true
        }
    }

    fn begin(&mut self, revision: u64) {
        self.in_flight = Some(revision);
        self.pending = false;
    }

    /// Returns `true` when exactly one trailing save should follow
    fn finish(&mut self, succeeded: bool, current_revision: u64) -> bool {
        let saved = self.in_flight.take();
        let pending = std::mem::take(&mut self.pending);
        pending && (!succeeded || saved != Some(current_revision))
    }
}
