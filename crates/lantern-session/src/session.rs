//! Session (browsing tab) data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lantern_engine::EngineSessionHandle;
use lantern_storage::SnapshotTab;

use crate::error::SessionError;
use crate::state::TabState;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: String,
    pub url: String,
    /// Page title, empty until the page reports one
    pub title: String,
    pub state: TabState,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// Engine-side session rendering this tab. Never persisted.
    #[serde(skip)]
    pub engine_session: Option<EngineSessionHandle>,
}

impl Session {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            url,
            title: String::new(),
            state: TabState::Background,
            created_at: now,
            last_accessed_at: now,
            engine_session: None,
        })
    }

    /// Rebuild a session from its persisted form, keeping its id
    pub fn from_snapshot(tab: SnapshotTab) -> Result<Self> {
        validate_url(&tab.url)?;

        Ok(Self {
            id: tab.id,
            url: tab.url,
            title: tab.title,
            state: TabState::Background,
            created_at: Utc::now(),
            last_accessed_at: tab.last_accessed_at,
            engine_session: None,
        })
    }

    pub fn to_snapshot(&self) -> SnapshotTab {
        SnapshotTab {
            id: self.id.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            last_accessed_at: self.last_accessed_at,
        }
    }

    pub fn transition_to(&mut self, new_state: TabState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        tracing::debug!(
            session_id = %self.id,
            from = %self.state,
            to = %new_state,
            "Session state transition"
        );

        self.state = new_state;

        if new_state == TabState::Active {
            self.last_accessed_at = Utc::now();
        }
        if !new_state.holds_engine_session() {
            self.engine_session = None;
        }

        Ok(())
    }

    pub fn activate(&mut self) -> Result<()> {
        self.transition_to(TabState::Active)
    }

    pub fn blur(&mut self) -> Result<()> {
        if self.state == TabState::Active {
            self.transition_to(TabState::Background)
        } else {
            Ok(())
        }
    }

    pub fn freeze(&mut self) -> Result<()> {
        match self.state {
            TabState::Active => {
                self.blur()?;
                self.transition_to(TabState::Frozen)
            }
            TabState::Background => self.transition_to(TabState::Frozen),
            TabState::Frozen | TabState::Discarded => Ok(()),
        }
    }

    /// Release the engine session, keeping only what a snapshot would hold
    pub fn discard(&mut self) -> Result<()> {
        if self.state != TabState::Discarded {
            self.freeze()?;
            self.transition_to(TabState::Discarded)?;
        }
        Ok(())
    }

    pub fn navigate(&mut self, url: String) -> Result<()> {
        validate_url(&url)?;
        self.url = url;
        self.title = String::new();
        Ok(())
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(SessionError::InvalidUrl("URL cannot be empty".to_string()));
    }
    url::Url::parse(url).map_err(|e| SessionError::InvalidUrl(format!("{url}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new("https://example.com").unwrap();
        assert_eq!(session.url, "https://example.com");
        assert_eq!(session.state, TabState::Background);
        assert!(session.engine_session.is_none());
        assert_eq!(session.display_title(), "https://example.com");
    }

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(Session::new("").is_err());
        assert!(Session::new("not a url").is_err());
        assert!(Session::new("about:blank").is_ok());
    }

    #[test]
    fn test_discard_releases_engine_session() {
        let mut session = Session::new("https://example.com").unwrap();
        session.engine_session = Some(EngineSessionHandle::new(7));
        session.activate().unwrap();

        session.discard().unwrap();
        assert_eq!(session.state, TabState::Discarded);
        assert!(session.engine_session.is_none());

        session.activate().unwrap();
        assert_eq!(session.state, TabState::Active);
    }

    #[test]
    fn test_snapshot_keeps_identity() {
        let mut session = Session::new("https://example.com").unwrap();
        session.set_title("Example".to_string());

        let restored = Session::from_snapshot(session.to_snapshot()).unwrap();
        assert_eq!(restored.id, session.id);
        assert_eq!(restored.title, "Example");
        assert_eq!(restored.state, TabState::Background);
    }

    #[test]
    fn test_navigate_resets_title() {
        let mut session = Session::new("https://example.com").unwrap();
        session.set_title("Example".to_string());
        session.navigate("https://example.org".to_string()).unwrap();
        assert!(session.title.is_empty());
        assert!(session.navigate(String::new()).is_err());
    }
}
