//! Tab use-cases
//!
//! The only path through which components mutate the session set.

use lantern_engine::EngineSessionHandle;
use lantern_storage::SnapshotBackend;

use crate::manager::SessionManager;
use crate::session::Session;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Sessions recovered from the snapshot
    Restored(usize),
    /// Nothing had been persisted
    Empty,
    /// Reading the snapshot failed; starting from an empty set
    Failed,
}

impl RestoreOutcome {
    pub fn count(&self) -> usize {
        match self {
            RestoreOutcome::Restored(count) => *count,
            RestoreOutcome::Empty | RestoreOutcome::Failed => 0,
        }
    }
}

#[derive(Clone)]
pub struct TabsUseCases {
    manager: SessionManager,
}

impl TabsUseCases {
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn add_tab(
        &self,
        url: &str,
        select: bool,
        engine_session: Option<EngineSessionHandle>,
    ) -> Result<String> {
        let session = Session::new(url)?;
        self.manager.add(session, select, engine_session)
    }

    /// Closing an already closed tab is a no-op.
    pub fn remove_tab(&self, session_id: &str) -> bool {
        let removed = self.manager.remove(session_id);
        if !removed {
            tracing::debug!(session_id = %session_id, "Tab already removed");
        }
        removed
    }

    /// Selecting a tab that no longer exists is a no-op.
    pub fn select_tab(&self, session_id: &str) -> bool {
        match self.manager.select(session_id) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(session_id = %session_id, "Tab not selected: {}", e);
                false
            }
        }
    }

    /// Replay the persisted snapshot into the session manager.
    /// A missing or unreadable snapshot leaves the set untouched.
    pub async fn restore(&self, backend: &dyn SnapshotBackend) -> RestoreOutcome {
        let snapshot = match backend.read().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!("No session snapshot to restore");
                return RestoreOutcome::Empty;
            }
            Err(e) => {
                tracing::warn!("Failed to read session snapshot: {}", e);
                return RestoreOutcome::Failed;
            }
        };

        let sessions: Vec<Session> = snapshot
            .tabs
            .into_iter()
            .filter_map(|tab| {
                let tab_id = tab.id.clone();
                Session::from_snapshot(tab)
                    .map_err(|e| {
                        tracing::warn!(session_id = %tab_id, "Dropping unrestorable tab: {}", e)
                    })
                    .ok()
            })
            .collect();

        let restored = self.manager.restore(sessions, snapshot.selected_id);

        tracing::info!(restored, "Restored sessions");

        RestoreOutcome::Restored(restored)
    }
}
