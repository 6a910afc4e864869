//! Compute-once async factory

use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Factory<T> = Box<dyn Fn() -> BoxFuture<'static, Arc<T>> + Send + Sync>;

/// A value built by `factory` on first `get`. Concurrent first callers wait
/// on the same construction; the factory never runs twice.
pub struct Lazy<T: ?Sized + Send + Sync + 'static> {
    cell: OnceCell<Arc<T>>,
    factory: Factory<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Arc<T>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(move || factory().boxed()),
        }
    }

    pub async fn get(&self) -> Arc<T> {
        let value = self.cell.get_or_init(|| (self.factory)()).await;
        Arc::clone(value)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_factory_runs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let lazy = {
            let built = Arc::clone(&built);
            Arc::new(Lazy::new(move || {
                let built = Arc::clone(&built);
                async move {
                    built.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Arc::new(String::from("value"))
                }
            }))
        };

        assert!(!lazy.is_initialized());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                tokio::spawn(async move { lazy.get().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().as_str(), "value");
        }

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }
}
