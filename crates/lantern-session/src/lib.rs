//! Lantern Session Management
//!
//! A session is one browsing tab. The `SessionManager` is the single source
//! of truth for the open session set; everything else mutates it through
//! `TabsUseCases`. Persistence restores the set once at startup and then
//! keeps it saved through a coalescing multi-trigger `AutoSave`.

mod autosave;
mod error;
mod manager;
mod persistence;
mod session;
mod state;
mod use_cases;

#[cfg(test)]
mod test_support;

pub use autosave::{
    AppLifecycle, AutoSave, AutoSaveHandle, SaveReason, SaveStats, DEFAULT_AUTOSAVE_INTERVAL,
    MIN_AUTOSAVE_INTERVAL,
};
pub use error::SessionError;
pub use manager::{SessionManager, SystemAction};
pub use persistence::{PersistencePhase, SessionPersistence};
pub use session::Session;
pub use state::TabState;
pub use use_cases::{RestoreOutcome, TabsUseCases};

pub type Result<T> = std::result::Result<T, SessionError>;
