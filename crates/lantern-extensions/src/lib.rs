//! Lantern Web Extensions
//!
//! Connects the engine's extension runtime to the session use-cases and
//! keeps the add-on manager/updater pair the runtime looks up.

mod addons;
mod bridge;
mod error;

pub use addons::{Addon, AddonDependencyProvider, AddonManager, AddonUpdater};
pub use bridge::{WebExtensionBridge, WebExtensionSupport};
pub use error::ExtensionError;

pub type Result<T> = std::result::Result<T, ExtensionError>;
