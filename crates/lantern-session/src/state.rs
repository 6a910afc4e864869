//! Tab lifecycle states
//!
//! ```text
//! Active
//!   ↓ another tab selected
//! Background
//!   ↓ memory pressure
//! Frozen
//!   ↓ critical memory pressure
//! Discarded  (engine session released)
//! ```
//! Any state returns to Active when the tab is selected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Selected tab, rendered by the engine
    Active,
    /// Loaded but not selected
    Background,
    /// Engine session kept, script execution suspended
    Frozen,
    /// Engine session released; only URL and title survive
    Discarded,
}

impl TabState {
    pub fn can_transition_to(&self, target: TabState) -> bool {
        match (self, target) {
            (_, TabState::Active) => true,
            (TabState::Active, TabState::Background) => true,
            (TabState::Background, TabState::Frozen) => true,
            (TabState::Frozen, TabState::Discarded) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    /// Whether a tab in this state keeps its engine session
    pub fn holds_engine_session(&self) -> bool {
        !matches!(self, TabState::Discarded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Active => "active",
            TabState::Background => "background",
            TabState::Frozen => "frozen",
            TabState::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
