//! Telemetry collection

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Event counters. Nothing is counted until telemetry is initialized with
/// upload enabled.
#[derive(Default)]
pub struct Telemetry {
    initialized: AtomicBool,
    upload_enabled: AtomicBool,
    counters: Mutex<HashMap<String, u64>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&self, upload_enabled: bool) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Telemetry already initialized");
            return;
        }
        self.upload_enabled.store(upload_enabled, Ordering::SeqCst);
        tracing::info!(upload_enabled, "Telemetry initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_collecting(&self) -> bool {
        self.is_initialized() && self.upload_enabled.load(Ordering::SeqCst)
    }

    pub fn record_event(&self, name: &str) {
        if !self.is_collecting() {
            return;
        }
        *self.counters.lock().entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn event_count(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }
}
