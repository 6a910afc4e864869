//! Lantern Push
//!
//! Push messages arrive through a `PushFeature`. Web-push scopes are handed
//! to the engine; the account scope goes to an account manager that is only
//! built when the first such message shows up.

mod account;
mod controller;
mod error;
mod feature;
mod integration;
mod lazy;
mod processor;

pub use account::{
    AccountManager, LocalAccountManager, PushAccountIntegration, ACCOUNT_PUSH_SCOPE,
};
pub use controller::{initialize_push, PushOutcome};
pub use error::PushError;
pub use feature::{AutoPushFeature, PushConfig, PushFeature, PushObserver};
pub use integration::WebPushEngineIntegration;
pub use lazy::Lazy;
pub use processor::PushProcessor;

pub type Result<T> = std::result::Result<T, PushError>;
