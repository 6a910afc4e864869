//! Startup sequencer
//!
//! Pre-main components initialize in every process. Post-main components
//! initialize only in the main process, strictly after pre-main. Both phases
//! are posted to the UI queue.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::watch;

use crate::process::ProcessGuard;
use crate::ui::UiQueue;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    Uninitialized,
    PreMainDone,
    PostMainDone,
}

/// One independent initialization step
pub struct StartupStep {
    name: &'static str,
    run: Box<dyn FnOnce() -> Result<()> + Send>,
}

impl StartupStep {
    pub fn new(name: &'static str, run: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub struct StartupSequencer {
    guard: ProcessGuard,
    phase: watch::Sender<StartupPhase>,
    failed_steps: Mutex<Vec<&'static str>>,
}

impl StartupSequencer {
    pub fn new(guard: ProcessGuard) -> Self {
        let (phase, _) = watch::channel(StartupPhase::Uninitialized);
        Self {
            guard,
            phase,
            failed_steps: Mutex::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> StartupPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StartupPhase> {
        self.phase.subscribe()
    }

    /// Steps that returned an error or panicked, in the order they ran
    pub fn failed_steps(&self) -> Vec<&'static str> {
        self.failed_steps.lock().clone()
    }

    /// Post both phases. Step lists are produced when their phase runs, so
    /// post-main dependencies are never touched outside the main process.
    pub fn start<Pre, Post>(self: &Arc<Self>, queue: &UiQueue, pre_main: Pre, post_main: Post)
    where
        Pre: FnOnce() -> Vec<StartupStep> + Send + 'static,
        Post: FnOnce() -> Vec<StartupStep> + Send + 'static,
    {
        let sequencer = Arc::clone(self);
        queue.post(move || {
            if sequencer.phase() != StartupPhase::Uninitialized {
                tracing::warn!("Startup already ran, ignoring");
                return;
            }
            sequencer.run_steps("pre-main", pre_main());
            sequencer.phase.send_replace(StartupPhase::PreMainDone);
        });

        let sequencer = Arc::clone(self);
        queue.post(move || {
            if sequencer.phase() != StartupPhase::PreMainDone {
                return;
            }
            if !sequencer.guard.is_main_process() {
                tracing::info!(
                    process_type = ?sequencer.guard.identity().process_type(),
                    "Not the main process, skipping post-main initialization"
                );
                return;
            }
            sequencer.run_steps("post-main", post_main());
            sequencer.phase.send_replace(StartupPhase::PostMainDone);
        });
    }

    /// A failing or panicking step never keeps the later steps from running.
    fn run_steps(&self, phase: &'static str, steps: Vec<StartupStep>) {
        for step in steps {
            let name = step.name;
            match panic::catch_unwind(AssertUnwindSafe(step.run)) {
                Ok(Ok(())) => tracing::debug!(phase, step = name, "Startup step done"),
                Ok(Err(e)) => {
                    tracing::warn!(phase, step = name, "Startup step failed: {}", e);
                    self.failed_steps.lock().push(name);
                }
                Err(_) => {
                    tracing::error!(phase, step = name, "Startup step panicked");
                    self.failed_steps.lock().push(name);
                }
            }
        }
        tracing::info!(phase, "Startup phase complete");
    }
}
