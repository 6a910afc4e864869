//! In-memory snapshot backend for tests

use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

use lantern_storage::{SessionSnapshot, SnapshotBackend, StorageError};

pub(crate) struct FakeBackend {
    stored: Mutex<Option<SessionSnapshot>>,
    writes: Mutex<Vec<SessionSnapshot>>,
    log: Mutex<Vec<&'static str>>,
    read_gate: Option<Arc<Semaphore>>,
    write_gate: Option<Arc<Semaphore>>,
    fail_reads: bool,
    failing_writes: AtomicUsize,
    writes_started: watch::Sender<usize>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        let (writes_started, _) = watch::channel(0);
        Self {
            stored: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
            read_gate: None,
            write_gate: None,
            fail_reads: false,
            failing_writes: AtomicUsize::new(0),
            writes_started,
        }
    }

    pub(crate) fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let backend = Self::new();
        *backend.stored.lock() = Some(snapshot);
        backend
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Reads block until the returned semaphore gets a permit
    pub(crate) fn gated_reads(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.read_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Each write blocks until the returned semaphore gets a permit
    pub(crate) fn gated_writes(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.write_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub(crate) fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Snapshots that were written successfully, in order
    pub(crate) fn writes(&self) -> Vec<SessionSnapshot> {
        self.writes.lock().clone()
    }

    pub(crate) fn log(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    pub(crate) fn writes_started(&self) -> watch::Receiver<usize> {
        self.writes_started.subscribe()
    }
}

async fn pass(gate: &Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

impl SnapshotBackend for FakeBackend {
    fn read(&self) -> BoxFuture<'_, lantern_storage::Result<Option<SessionSnapshot>>> {
        async move {
            self.log.lock().push("read-start");
            pass(&self.read_gate).await;
            self.log.lock().push("read-done");

            if self.fail_reads {
                return Err(StorageError::Io(std::io::Error::other("unreadable")));
            }
            Ok(self.stored.lock().clone())
        }
        .boxed()
    }

    fn write(&self, snapshot: SessionSnapshot) -> BoxFuture<'_, lantern_storage::Result<()>> {
        async move {
            self.log.lock().push("write-start");
            self.writes_started.send_modify(|n| *n += 1);
            pass(&self.write_gate).await;

            let fail = self
                .failing_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                self.log.lock().push("write-failed");
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }

            self.log.lock().push("write-done");
            self.writes.lock().push(snapshot.clone());
            *self.stored.lock() = Some(snapshot);
            Ok(())
        }
        .boxed()
    }
}
