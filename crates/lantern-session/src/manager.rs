//! Session Manager
//!
//! Owns the ordered set of open sessions and the current selection.
//! Every mutation of the set bumps a revision published on a watch channel;
//! the autosave scheduler listens to it.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use lantern_engine::{Engine, EngineSessionHandle, MemoryLevel};
use lantern_storage::SessionSnapshot;

use crate::error::SessionError;
use crate::session::Session;
use crate::Result;

/// Process-level actions dispatched into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    LowMemory(MemoryLevel),
}

#[derive(Default)]
struct Inner {
    sessions: Vec<Session>,
    selected_id: Option<String>,
}

impl Inner {
    fn position(&self, session_id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == session_id)
    }

    /// Select the session at `index`, attaching a fresh engine session when
    /// it has none (restored or discarded tabs).
    fn select_at(&mut self, index: usize, engine: Option<&dyn Engine>) {
        if let Some(previous_id) = self.selected_id.take() {
            if let Some(previous) = self.sessions.iter_mut().find(|s| s.id == previous_id) {
                if let Err(e) = previous.blur() {
                    tracing::warn!(session_id = %previous.id, "Failed to blur session: {}", e);
                }
            }
        }

        if let Some(session) = self.sessions.get_mut(index) {
            match session.activate() {
                Ok(()) => {
                    if let (None, Some(engine)) = (session.engine_session, engine) {
                        let handle = engine.create_session();
                        tracing::debug!(
                            session_id = %session.id,
                            engine_session = handle.id(),
                            "Attached engine session"
                        );
                        session.engine_session = Some(handle);
                    }
                }
                Err(e) => {
                    tracing::warn!(session_id = %session.id, "Failed to activate session: {}", e);
                }
            }
            self.selected_id = Some(session.id.clone());
        }
    }
}

pub struct SessionManager {
    inner: Arc<RwLock<Inner>>,
    revision: Arc<watch::Sender<u64>>,
    engine: Option<Arc<dyn Engine>>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);

        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            revision: Arc::new(revision),
            engine: None,
        }
    }

    /// Manager that asks `engine` for a session whenever a tab without one
    /// is selected.
    pub fn with_engine(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine: Some(engine),
            ..Self::new()
        }
    }

    /// Add a session. It becomes selected when `select` is set or when
    /// nothing is selected yet.
    pub fn add(
        &self,
        mut session: Session,
        select: bool,
        engine_session: Option<EngineSessionHandle>,
    ) -> Result<String> {
        let mut inner = self.inner.write();

        if inner.position(&session.id).is_some() {
            return Err(SessionError::Duplicate(session.id));
        }

        if engine_session.is_some() {
            session.engine_session = engine_session;
        }

        let id = session.id.clone();
        inner.sessions.push(session);

        if select || inner.selected_id.is_none() {
            let index = inner.sessions.len() - 1;
            inner.select_at(index, self.engine.as_deref());
        }

        self.bump(&inner);

        tracing::info!(session_id = %id, selected = select, "Added session");

        Ok(id)
    }

    /// Remove a session. Returns `false` if it was not present.
    ///
    /// Removing the selected session selects its neighbour: the one that
    /// took its place, else the previous one.
    pub fn remove(&self, session_id: &str) -> bool {
        let mut inner = self.inner.write();

        let Some(index) = inner.position(session_id) else {
            return false;
        };

        inner.sessions.remove(index);

        if inner.selected_id.as_deref() == Some(session_id) {
            inner.selected_id = None;
            if !inner.sessions.is_empty() {
                let next = index.min(inner.sessions.len() - 1);
                inner.select_at(next, self.engine.as_deref());
            }
        }

        self.bump(&inner);

        tracing::info!(session_id = %session_id, "Removed session");

        true
    }

    pub fn select(&self, session_id: &str) -> Result<Session> {
        let mut inner = self.inner.write();

        let index = inner
            .position(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if inner.selected_id.as_deref() != Some(session_id) {
            inner.select_at(index, self.engine.as_deref());
            self.bump(&inner);
        }

        Ok(inner.sessions[index].clone())
    }

    pub fn find_session_by_id(&self, session_id: &str) -> Option<Session> {
        self.inner
            .read()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    pub fn selected_session(&self) -> Option<Session> {
        let inner = self.inner.read();
        let selected_id = inner.selected_id.as_deref()?;
        inner.sessions.iter().find(|s| s.id == selected_id).cloned()
    }

    /// All sessions in display order
    pub fn sessions(&self) -> Vec<Session> {
        self.inner.read().sessions.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().sessions.is_empty()
    }

    pub fn update_url(&self, session_id: &str, url: String) -> Result<Session> {
        self.update(session_id, |session| session.navigate(url))
    }

    pub fn set_title(&self, session_id: &str, title: String) -> Result<Session> {
        self.update(session_id, |session| {
            session.set_title(title);
            Ok(())
        })
    }

    fn update<F>(&self, session_id: &str, f: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let mut inner = self.inner.write();

        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        f(session)?;
        let updated = session.clone();

        self.bump(&inner);

        Ok(updated)
    }

    /// Append restored sessions and re-apply the persisted selection.
    /// Sessions whose id is already present are skipped.
    pub fn restore(&self, sessions: Vec<Session>, selected_id: Option<String>) -> usize {
        let mut inner = self.inner.write();
        let mut restored = 0;

        for session in sessions {
            if inner.position(&session.id).is_some() {
                tracing::debug!(session_id = %session.id, "Skipping already open session");
                continue;
            }
            inner.sessions.push(session);
            restored += 1;
        }

        if inner.selected_id.is_none() {
            let index = selected_id
                .as_deref()
                .and_then(|id| inner.position(id))
                .or_else(|| (!inner.sessions.is_empty()).then_some(0));
            if let Some(index) = index {
                inner.select_at(index, self.engine.as_deref());
            }
        }

        if restored > 0 {
            self.bump(&inner);
        }

        restored
    }

    /// Capture the session set together with the revision it reflects
    pub fn snapshot(&self) -> (SessionSnapshot, u64) {
        let inner = self.inner.read();
        let snapshot = SessionSnapshot::new(
            inner.sessions.iter().map(Session::to_snapshot).collect(),
            inner.selected_id.clone(),
        );
        (snapshot, *self.revision.borrow())
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receive a notification for every change to the session set
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn dispatch(&self, action: SystemAction) {
        match action {
            SystemAction::LowMemory(level) => self.on_low_memory(level),
        }
    }

    /// Background sessions are frozen under memory pressure and discarded
    /// when it is critical. The selected session is never touched.
    fn on_low_memory(&self, level: MemoryLevel) {
        if !level.should_trim_background() {
            return;
        }

        let mut inner = self.inner.write();
        let selected_id = inner.selected_id.clone();
        let mut trimmed = 0;

        for session in inner
            .sessions
            .iter_mut()
            .filter(|s| selected_id.as_deref() != Some(s.id.as_str()))
        {
            let before = session.state;
            let result = if level.is_critical() {
                session.discard()
            } else {
                session.freeze()
            };

            match result {
                Ok(()) if session.state != before => trimmed += 1,
                Ok(()) => {}
                Err(e) => tracing::warn!(session_id = %session.id, "Failed to trim session: {}", e),
            }
        }

        tracing::info!(level = %level, trimmed, "Handled low memory");
    }

    /// Callers hold the write lock so a snapshot never pairs old data
    /// with a new revision.
    fn bump(&self, _inner: &Inner) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            revision: Arc::clone(&self.revision),
            engine: self.engine.clone(),
        }
    }
}
