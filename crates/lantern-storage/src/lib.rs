//! Lantern Storage Layer
//!
//! SQLite-backed persistence for browser session state.
//! Snapshot writes are transactional: a reader never observes half a session set.

mod backend;
mod database;
mod error;
mod migrations;
mod snapshot;

pub use backend::{SessionStorage, SnapshotBackend};
pub use database::Database;
pub use error::StorageError;
pub use snapshot::{SessionSnapshot, SnapshotTab};

pub type Result<T> = std::result::Result<T, StorageError>;
