//! Push lifecycle controller

use std::sync::Arc;

use lantern_engine::Engine;

use crate::account::{AccountManager, PushAccountIntegration};
use crate::feature::PushFeature;
use crate::integration::WebPushEngineIntegration;
use crate::lazy::Lazy;
use crate::processor::PushProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// No push feature configured
    Disabled,
    Initialized,
    /// A step failed; push is unavailable for this process
    Failed,
}

/// Wire the push feature into the process: install it, start engine
/// delivery, launch the account integration and register with the service.
/// Does nothing when `feature` is `None`.
///
/// A second install is a configuration error and stops here. Past that,
/// every step runs even if an earlier one failed.
pub fn initialize_push(
    feature: Option<Arc<dyn PushFeature>>,
    processor: &PushProcessor,
    engine: Arc<dyn Engine>,
    account_manager: Arc<Lazy<dyn AccountManager>>,
) -> PushOutcome {
    let Some(feature) = feature else {
        tracing::debug!("Push feature not configured");
        return PushOutcome::Disabled;
    };

    if let Err(e) = processor.install(Arc::clone(&feature)) {
        tracing::error!("Push configuration error: {}", e);
        return PushOutcome::Failed;
    }

    WebPushEngineIntegration::start(engine, feature.as_ref());

    let mut failed = false;

    let account = PushAccountIntegration::new(account_manager);
    if let Err(e) = account.launch(feature.as_ref()) {
        tracing::warn!("Failed to launch account push integration: {}", e);
        failed = true;
    }

    if let Err(e) = feature.initialize() {
        tracing::warn!("Push registration failed: {}", e);
        failed = true;
    }

    if failed {
        return PushOutcome::Failed;
    }

    tracing::info!("Push initialized");
    PushOutcome::Initialized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{LocalAccountManager, ACCOUNT_PUSH_SCOPE};
    use crate::feature::{AutoPushFeature, PushConfig, PushObserver};
    use crate::Result;
    use lantern_engine::HeadlessEngine;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFeature {
        calls: Mutex<Vec<&'static str>>,
    }

    impl PushFeature for CountingFeature {
        fn initialize(&self) -> Result<()> {
            self.calls.lock().push("initialize");
            Ok(())
        }

        fn register_observer(&self, _observer: Arc<dyn PushObserver>) {
            self.calls.lock().push("register_observer");
        }
    }

    fn account_manager(built: &Arc<AtomicUsize>) -> Arc<Lazy<dyn AccountManager>> {
        let built = Arc::clone(built);
        Arc::new(Lazy::new(move || {
            built.fetch_add(1, Ordering::SeqCst);
            async move { Arc::new(LocalAccountManager::new()) as Arc<dyn AccountManager> }
        }))
    }

    #[tokio::test]
    async fn test_absent_feature_touches_nothing() {
        let processor = PushProcessor::new();
        let engine = Arc::new(HeadlessEngine::new());
        let built = Arc::new(AtomicUsize::new(0));

        let outcome = initialize_push(None, &processor, engine.clone(), account_manager(&built));

        assert_eq!(outcome, PushOutcome::Disabled);
        assert!(!processor.is_installed());
        assert!(engine.deliveries().is_empty());
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let processor = PushProcessor::new();
        let feature = Arc::new(CountingFeature::default());
        let built = Arc::new(AtomicUsize::new(0));

        let outcome = initialize_push(
            Some(feature.clone()),
            &processor,
            Arc::new(HeadlessEngine::new()),
            account_manager(&built),
        );

        assert_eq!(outcome, PushOutcome::Initialized);
        assert!(processor.is_installed());
        assert_eq!(
            *feature.calls.lock(),
            vec!["register_observer", "register_observer", "initialize"]
        );
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_install_is_configuration_error() {
        let processor = PushProcessor::new();
        let engine = Arc::new(HeadlessEngine::new());
        let built = Arc::new(AtomicUsize::new(0));
        let feature = Arc::new(CountingFeature::default());

        initialize_push(
            Some(feature.clone()),
            &processor,
            engine.clone(),
            account_manager(&built),
        );
        let outcome = initialize_push(
            Some(feature.clone()),
            &processor,
            engine,
            account_manager(&built),
        );

        assert_eq!(outcome, PushOutcome::Failed);
        assert_eq!(feature.calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_messages_route_after_initialize() {
        let processor = PushProcessor::new();
        let engine = Arc::new(HeadlessEngine::new());
        let built = Arc::new(AtomicUsize::new(0));
        let feature = Arc::new(AutoPushFeature::new(PushConfig::new(
            "lantern",
            "https://push.example.com",
        )));

        let outcome = initialize_push(
            Some(feature.clone()),
            &processor,
            engine.clone(),
            account_manager(&built),
        );
        assert_eq!(outcome, PushOutcome::Initialized);
        assert!(feature.is_registered());
        assert_eq!(feature.observer_count(), 2);

        feature.deliver("https://news.example", None);
        assert_eq!(engine.deliveries().len(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 0);

        feature.deliver(ACCOUNT_PUSH_SCOPE, None);
        for _ in 0..10 {
            if built.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(engine.deliveries().len(), 1);
    }

    #[test]
    fn test_account_launch_failure_still_registers() {
        let processor = PushProcessor::new();
        let engine = Arc::new(HeadlessEngine::new());
        let feature = Arc::new(CountingFeature::default());
        let built = Arc::new(AtomicUsize::new(0));

        // No tokio runtime here, so the account integration cannot launch
        let outcome = initialize_push(
            Some(feature.clone()),
            &processor,
            engine,
            account_manager(&built),
        );

        assert_eq!(outcome, PushOutcome::Failed);
        assert!(processor.is_installed());
        assert_eq!(*feature.calls.lock(), vec!["register_observer", "initialize"]);
    }

    #[tokio::test]
    async fn test_registration_failure_is_reported() {
        let processor = PushProcessor::new();
        let built = Arc::new(AtomicUsize::new(0));
        let feature = Arc::new(AutoPushFeature::new(PushConfig::new("", "https://push.example.com")));

        let outcome = initialize_push(
            Some(feature),
            &processor,
            Arc::new(HeadlessEngine::new()),
            account_manager(&built),
        );

        assert_eq!(outcome, PushOutcome::Failed);
        assert!(processor.is_installed());
    }
}
