//! Account push integration
//!
//! Account messages are routed to the account manager, which stays unbuilt
//! until the first one arrives.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;

use crate::error::PushError;
use crate::feature::{PushFeature, PushObserver};
use crate::lazy::Lazy;
use crate::Result;

/// Scope the push service uses for account events
pub const ACCOUNT_PUSH_SCOPE: &str = "lantern-account";

pub trait AccountManager: Send + Sync {
    fn on_push_message(&self, payload: Option<&[u8]>);

    fn on_subscription_expired(&self);
}

/// Account manager for a device without a signed-in account service.
#[derive(Default)]
pub struct LocalAccountManager {
    messages: AtomicUsize,
    resubscriptions: AtomicUsize,
}

impl LocalAccountManager {
    pub fn new() -> Self {
        tracing::info!("Account manager constructed");
        Self::default()
    }

    pub fn messages_handled(&self) -> usize {
        self.messages.load(Ordering::SeqCst)
    }

    pub fn resubscriptions(&self) -> usize {
        self.resubscriptions.load(Ordering::SeqCst)
    }
}

impl AccountManager for LocalAccountManager {
    fn on_push_message(&self, payload: Option<&[u8]>) {
        self.messages.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(bytes = payload.map_or(0, <[u8]>::len), "Account push message");
    }

    fn on_subscription_expired(&self) {
        self.resubscriptions.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Account push subscription renewed");
    }
}

pub struct PushAccountIntegration {
    account_manager: Arc<Lazy<dyn AccountManager>>,
    runtime: OnceLock<Handle>,
    pending: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl PushAccountIntegration {
    pub fn new(account_manager: Arc<Lazy<dyn AccountManager>>) -> Arc<Self> {
        Arc::new(Self {
            account_manager,
            runtime: OnceLock::new(),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Start listening on `feature`. Must be called inside a tokio runtime;
    /// the account manager is built on that runtime when needed.
    pub fn launch(self: &Arc<Self>, feature: &dyn PushFeature) -> Result<()> {
        let handle = Handle::try_current().map_err(|_| PushError::NoRuntime)?;
        if self.runtime.set(handle).is_err() {
            tracing::warn!("Account push integration already launched");
            return Ok(());
        }

        feature.register_observer(Arc::clone(self) as Arc<dyn PushObserver>);
        tracing::debug!("Account push integration launched");
        Ok(())
    }

    pub fn is_account_manager_built(&self) -> bool {
        self.account_manager.is_initialized()
    }

    /// Wait until every account event handed off so far has been processed
    pub async fn settle(&self) {
        let pending: Vec<_> = std::mem::take(&mut *self.pending.lock());
        for task in pending {
            if let Err(e) = task.await {
                tracing::warn!("Account push task failed: {}", e);
            }
        }
    }

    fn dispatch<F>(&self, f: F)
    where
        F: FnOnce(Arc<dyn AccountManager>) + Send + 'static,
    {
        let Some(runtime) = self.runtime.get() else {
            return;
        };

        let account_manager = Arc::clone(&self.account_manager);
        let task = runtime.spawn(async move {
            f(account_manager.get().await);
        });

        let mut pending = self.pending.lock();
        pending.retain(|t| !t.is_finished());
        pending.push(task);
    }
}

impl PushObserver for PushAccountIntegration {
    fn on_message_received(&self, scope: &str, payload: Option<&[u8]>) {
        if scope != ACCOUNT_PUSH_SCOPE {
            return;
        }
        let payload = payload.map(<[u8]>::to_vec);
        self.dispatch(move |manager| manager.on_push_message(payload.as_deref()));
    }

    fn on_subscription_changed(&self, scope: &str) {
        if scope != ACCOUNT_PUSH_SCOPE {
            return;
        }
        self.dispatch(|manager| manager.on_subscription_expired());
    }
}
