//! Persisted session snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted tab. Engine state is never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTab {
    pub id: String,
    pub url: String,
    pub title: String,
    pub last_accessed_at: DateTime<Utc>,
}

/// The full session set as written by autosave and read back at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Tabs in display order
    pub tabs: Vec<SnapshotTab>,
    /// Id of the selected tab, if any
    pub selected_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(tabs: Vec<SnapshotTab>, selected_id: Option<String>) -> Self {
        Self {
            tabs,
            selected_id,
            saved_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }
}
