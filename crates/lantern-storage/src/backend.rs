//! Session snapshot backend
//!
//! `SnapshotBackend` is the seam the persistence scheduler talks to.
//! `SessionStorage` is the SQLite implementation; its blocking work runs on
//! the tokio blocking pool so callers can await it from UI-affined tasks.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use rusqlite::OptionalExtension;

use crate::database::Database;
use crate::snapshot::{SessionSnapshot, SnapshotTab};
use crate::Result;

pub trait SnapshotBackend: Send + Sync + 'static {
    /// Read the last persisted snapshot. `Ok(None)` means nothing was ever saved.
    fn read(&self) -> BoxFuture<'_, Result<Option<SessionSnapshot>>>;

    /// Replace the persisted snapshot.
    fn write(&self, snapshot: SessionSnapshot) -> BoxFuture<'_, Result<()>>;
}

#[derive(Clone)]
pub struct SessionStorage {
    db: Database,
}

impl SessionStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn read_snapshot(&self) -> Result<Option<SessionSnapshot>> {
        self.db.with_connection(|conn| {
            let header = conn
                .query_row(
                    "SELECT selected_id, saved_at FROM snapshot WHERE id = 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, String>(1)?,
                        ))
                    },
                )
                .optional()?;

            let Some((selected_id, saved_at)) = header else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT id, url, title, last_accessed_at FROM snapshot_tabs ORDER BY position",
            )?;

            let tabs: Vec<SnapshotTab> = stmt
                .query_map([], |row| {
                    let accessed_str: String = row.get(3)?;
                    Ok(SnapshotTab {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        last_accessed_at: parse_timestamp(&accessed_str),
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(Some(SessionSnapshot {
                tabs,
                selected_id,
                saved_at: parse_timestamp(&saved_at),
            }))
        })
    }

    pub fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.db.transaction(|conn| {
            conn.execute("DELETE FROM snapshot_tabs", [])?;

            for (position, tab) in snapshot.tabs.iter().enumerate() {
                conn.execute(
                    "INSERT INTO snapshot_tabs (position, id, url, title, last_accessed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        position as i64,
                        tab.id,
                        tab.url,
                        tab.title,
                        tab.last_accessed_at.to_rfc3339(),
                    ],
                )?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO snapshot (id, selected_id, saved_at) VALUES (1, ?1, ?2)",
                rusqlite::params![snapshot.selected_id, snapshot.saved_at.to_rfc3339()],
            )?;

            Ok(())
        })?;

        tracing::debug!(tab_count = snapshot.len(), "Wrote session snapshot");

        Ok(())
    }

    /// Forget the persisted snapshot entirely
    pub fn clear(&self) -> Result<()> {
        self.db.transaction(|conn| {
            conn.execute("DELETE FROM snapshot_tabs", [])?;
            conn.execute("DELETE FROM snapshot", [])?;
            Ok(())
        })
    }
}

impl SnapshotBackend for SessionStorage {
    fn read(&self) -> BoxFuture<'_, Result<Option<SessionSnapshot>>> {
        let storage = self.clone();
        async move { tokio::task::spawn_blocking(move || storage.read_snapshot()).await? }.boxed()
    }

    fn write(&self, snapshot: SessionSnapshot) -> BoxFuture<'_, Result<()>> {
        let storage = self.clone();
        async move { tokio::task::spawn_blocking(move || storage.write_snapshot(&snapshot)).await? }
            .boxed()
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: &str, url: &str) -> SnapshotTab {
        SnapshotTab {
            id: id.to_string(),
            url: url.to_string(),
            title: String::new(),
            last_accessed_at: Utc::now(),
        }
    }

    #[test]
    fn test_read_without_snapshot() {
        let storage = SessionStorage::new(Database::open_in_memory().unwrap());
        assert!(storage.read_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_previous_snapshot() {
        let storage = SessionStorage::new(Database::open_in_memory().unwrap());

        let first = SessionSnapshot::new(
            vec![
                tab("tab-1", "https://example.com"),
                tab("tab-2", "https://example.org"),
            ],
            Some("tab-2".to_string()),
        );
        storage.write_snapshot(&first).unwrap();

        let second = SessionSnapshot::new(vec![tab("tab-3", "https://example.net")], None);
        storage.write_snapshot(&second).unwrap();

        let restored = storage.read_snapshot().unwrap().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.tabs[0].id, "tab-3");
        assert_eq!(restored.selected_id, None);
    }

    #[test]
    fn test_tab_order_preserved() {
        let storage = SessionStorage::new(Database::open_in_memory().unwrap());
        let snapshot = SessionSnapshot::new(
            vec![
                tab("c", "https://c.example"),
                tab("a", "https://a.example"),
                tab("b", "https://b.example"),
            ],
            Some("a".to_string()),
        );
        storage.write_snapshot(&snapshot).unwrap();

        let restored = storage.read_snapshot().unwrap().unwrap();
        let ids: Vec<&str> = restored.tabs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(restored.selected_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_clear() {
        let storage = SessionStorage::new(Database::open_in_memory().unwrap());
        storage
            .write_snapshot(&SessionSnapshot::new(vec![tab("a", "https://a.example")], None))
            .unwrap();
        storage.clear().unwrap();
        assert!(storage.read_snapshot().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_runs_off_the_caller() {
        let storage = SessionStorage::new(Database::open_in_memory().unwrap());
        let backend: &dyn SnapshotBackend = &storage;

        assert!(backend.read().await.unwrap().is_none());

        backend
            .write(SessionSnapshot::new(
                vec![tab("tab-1", "https://example.com")],
                Some("tab-1".to_string()),
            ))
            .await
            .unwrap();

        let restored = backend.read().await.unwrap().unwrap();
        assert_eq!(restored.tabs[0].url, "https://example.com");
    }
}
