//! Push feature and observers

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use crate::error::PushError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// Application identifier registered with the push service
    pub sender_id: String,
    pub service_url: String,
}

impl PushConfig {
    pub fn new(sender_id: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            service_url: service_url.into(),
        }
    }

    pub fn validate(&self) -> Result<Url> {
        if self.sender_id.trim().is_empty() {
            return Err(PushError::InvalidConfig("empty sender id".to_string()));
        }

        let url = Url::parse(&self.service_url)
            .map_err(|e| PushError::InvalidConfig(format!("service url: {}", e)))?;
        if url.scheme() != "https" {
            return Err(PushError::InvalidConfig(format!(
                "service url must use https, got {}",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

/// Receives inbound push events
pub trait PushObserver: Send + Sync {
    fn on_message_received(&self, scope: &str, payload: Option<&[u8]>);

    fn on_subscription_changed(&self, scope: &str);
}

pub trait PushFeature: Send + Sync {
    /// Register with the push service
    fn initialize(&self) -> Result<()>;

    fn register_observer(&self, observer: Arc<dyn PushObserver>);
}

/// Push feature that fans inbound events out to its observers.
pub struct AutoPushFeature {
    config: PushConfig,
    observers: RwLock<Vec<Arc<dyn PushObserver>>>,
    registered: AtomicBool,
}

impl AutoPushFeature {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            observers: RwLock::new(Vec::new()),
            registered: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Hand an inbound message to every observer
    pub fn deliver(&self, scope: &str, payload: Option<&[u8]>) {
        let observers = self.observers.read().clone();
        tracing::debug!(scope = %scope, observers = observers.len(), "Push message received");

        for observer in observers {
            observer.on_message_received(scope, payload);
        }
    }

    pub fn subscription_changed(&self, scope: &str) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_subscription_changed(scope);
        }
    }
}

impl PushFeature for AutoPushFeature {
    fn initialize(&self) -> Result<()> {
        let service_url = self.config.validate()?;

        if self.registered.swap(true, Ordering::SeqCst) {
            tracing::debug!("Push feature already registered");
            return Ok(());
        }

        tracing::info!(
            sender_id = %self.config.sender_id,
            service = %service_url,
            "Push feature registered"
        );
        Ok(())
    }

    fn register_observer(&self, observer: Arc<dyn PushObserver>) {
        self.observers.write().push(observer);
    }
}
