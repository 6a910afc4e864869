//! Lantern Core
//!
//! Application startup and component wiring for the Lantern browser shell.
//! Only the main process builds components; every process runs pre-main
//! initialization.

mod activity;
mod analytics;
mod application;
mod components;
mod config;
mod crash;
mod error;
mod http;
mod logging;
mod process;
mod sequencer;
mod ui;

pub use activity::BrowserActivity;
pub use analytics::Telemetry;
pub use application::Application;
pub use components::{Components, SharedServices};
pub use config::Config;
pub use crash::{CrashReport, CrashReporter, NON_FATAL_CRASH_BROADCAST};
pub use error::CoreError;
pub use http::HttpClientConfig;
pub use logging::init_logging;
pub use process::{ProcessGuard, ProcessIdentity};
pub use sequencer::{StartupPhase, StartupSequencer, StartupStep};
pub use ui::UiQueue;

// Re-export the component crates
pub use lantern_engine::{Engine, HeadlessEngine, MemoryLevel};
pub use lantern_extensions::{Addon, AddonManager, AddonUpdater};
pub use lantern_push::{PushConfig, PushOutcome};
pub use lantern_session::{AppLifecycle, SaveStats, Session, SessionManager, TabsUseCases};
pub use lantern_storage::{Database, SessionStorage};

pub type Result<T> = std::result::Result<T, CoreError>;
