//! Crash reporting

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::CoreError;
use crate::Result;

/// Channel non-fatal crash reports are broadcast on
pub const NON_FATAL_CRASH_BROADCAST: &str = "org.lantern.browser";

#[derive(Debug, Clone, Serialize)]
pub struct CrashReport {
    pub channel: &'static str,
    pub message: String,
    pub fatal: bool,
    pub reported_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct CrashReporter {
    installed: AtomicBool,
    panics: Arc<AtomicU64>,
    reports: Mutex<Vec<CrashReport>>,
}

impl CrashReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the panic hook. The previous hook still runs after ours.
    pub fn install(&self) -> Result<()> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(CoreError::CrashReporterInstalled);
        }

        let panics = Arc::clone(&self.panics);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            panics.fetch_add(1, Ordering::SeqCst);
            tracing::error!(location = ?info.location(), "Panic: {}", panic_message(info.payload()));
            previous(info);
        }));

        tracing::info!("Crash reporter installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    pub fn panic_count(&self) -> u64 {
        self.panics.load(Ordering::SeqCst)
    }

    /// Record an error that did not bring the process down
    pub fn submit_non_fatal(&self, error: &dyn std::error::Error) {
        if !self.is_installed() {
            tracing::debug!("Crash reporting disabled, dropping report: {}", error);
            return;
        }

        tracing::error!(channel = NON_FATAL_CRASH_BROADCAST, "Non-fatal error: {}", error);
        self.reports.lock().push(CrashReport {
            channel: NON_FATAL_CRASH_BROADCAST,
            message: error.to_string(),
            fatal: false,
            reported_at: Utc::now(),
        });
    }

    pub fn reports(&self) -> Vec<CrashReport> {
        self.reports.lock().clone()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_fatal_requires_install() {
        let reporter = CrashReporter::new();
        let error = std::io::Error::other("flaky disk");

        reporter.submit_non_fatal(&error);
        assert!(reporter.reports().is_empty());
    }

    #[test]
    fn test_install_and_report() {
        let reporter = CrashReporter::new();
        reporter.install().unwrap();
        assert!(matches!(
            reporter.install(),
            Err(CoreError::CrashReporterInstalled)
        ));

        let error = std::io::Error::other("flaky disk");
        reporter.submit_non_fatal(&error);

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].channel, NON_FATAL_CRASH_BROADCAST);
        assert_eq!(reports[0].message, "flaky disk");
        assert!(!reports[0].fatal);

        let result = std::panic::catch_unwind(|| panic!("test panic"));
        assert!(result.is_err());
        assert!(reporter.panic_count() >= 1);
    }
}
