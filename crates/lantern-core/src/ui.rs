//! UI task queue
//!
//! A single consumer drains posted tasks in FIFO order, so a task always runs
//! after everything posted before it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};

type UiTask = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone)]
pub struct UiQueue {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl UiQueue {
    /// Start the consumer on the current tokio runtime
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<UiTask>();

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!("UI task panicked");
                }
            }
            tracing::debug!("UI queue closed");
        });

        Self { tx }
    }

    /// Returns `false` if the consumer is gone
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }

    /// Wait until every task posted before this call has run
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.post(move || {
            let _ = done_tx.send(());
        }) {
            let _ = done_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = UiQueue::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            let inner_queue = queue.clone();
            queue.post(move || {
                order.lock().push(i);
                if i == 0 {
                    // Posted from a task: runs after everything already queued
                    let order = Arc::clone(&order);
                    inner_queue.post(move || order.lock().push(99));
                }
            });
        }
        queue.flush().await;
        queue.flush().await;

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4, 99]);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_queue() {
        let queue = UiQueue::spawn();
        let ran = Arc::new(Mutex::new(false));

        queue.post(|| panic!("boom"));
        let flag = Arc::clone(&ran);
        queue.post(move || *flag.lock() = true);
        queue.flush().await;

        assert!(*ran.lock());
    }
}
