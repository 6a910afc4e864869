//! Web-push delivery into the engine

use std::sync::Arc;

use lantern_engine::Engine;

use crate::account::ACCOUNT_PUSH_SCOPE;
use crate::feature::{PushFeature, PushObserver};

/// Forwards web-push messages to the engine. The account scope is left to
/// `PushAccountIntegration`.
pub struct WebPushEngineIntegration {
    engine: Arc<dyn Engine>,
}

impl WebPushEngineIntegration {
    /// Start observing `feature` on behalf of `engine`.
    pub fn start(engine: Arc<dyn Engine>, feature: &dyn PushFeature) -> Arc<Self> {
        let integration = Arc::new(Self { engine });
        feature.register_observer(Arc::clone(&integration) as Arc<dyn PushObserver>);

        tracing::debug!("Web push engine integration started");
        integration
    }
}

impl PushObserver for WebPushEngineIntegration {
    fn on_message_received(&self, scope: &str, payload: Option<&[u8]>) {
        if scope == ACCOUNT_PUSH_SCOPE {
            return;
        }
        self.engine.deliver_push(scope, payload.map(<[u8]>::to_vec));
    }

    fn on_subscription_changed(&self, scope: &str) {
        if scope == ACCOUNT_PUSH_SCOPE {
            return;
        }
        self.engine.deliver_subscription_change(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AutoPushFeature, PushConfig};
    use lantern_engine::{HeadlessEngine, PushDelivery};

    #[test]
    fn test_forwards_web_push_only() {
        let engine = Arc::new(HeadlessEngine::new());
        let feature = AutoPushFeature::new(PushConfig::new("lantern", "https://push.example.com"));
        WebPushEngineIntegration::start(engine.clone(), &feature);

        feature.deliver("https://news.example", Some(&b"1"[..]));
        feature.deliver(ACCOUNT_PUSH_SCOPE, None);
        feature.subscription_changed("https://news.example");
        feature.subscription_changed(ACCOUNT_PUSH_SCOPE);

        assert_eq!(
            engine.deliveries(),
            vec![
                PushDelivery::Message {
                    scope: "https://news.example".to_string(),
                    payload: Some(b"1".to_vec()),
                },
                PushDelivery::SubscriptionChanged {
                    scope: "https://news.example".to_string(),
                },
            ]
        );
    }
}
