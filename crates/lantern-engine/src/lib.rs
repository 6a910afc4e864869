//! Lantern Engine Concept
//!
//! The content engine is an external collaborator. This crate defines the
//! surface the shell talks to and a headless implementation used when no
//! rendering engine is attached.

mod engine;
mod headless;
mod memory;

pub use engine::{
    Engine, EngineSessionHandle, TabDelegate, UpdatePermissionHandler, UpdatePermissionRequest,
    WebExtensionRuntime,
};
pub use headless::{HeadlessEngine, PushDelivery};
pub use memory::MemoryLevel;
