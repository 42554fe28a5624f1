//! Background task registry
//!
//! Cart refreshes run detached from the tool call that triggered them.
//! The registry keeps every such task in one `JoinSet` so shutdown can
//! wait for the stragglers instead of tearing the browser down under
//! them.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

/// Registry of detached background tasks
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<JoinSet<()>>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a detached task, reaping any already-finished ones
    pub async fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.try_join_next() {
            if let Err(error) = result
                && error.is_panic()
            {
                warn!("Background task panicked: {error}");
            }
        }
        tasks.spawn(future);
    }

    /// Number of tasks not yet finished and reaped
    pub async fn outstanding(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait for every outstanding task to finish
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result
                && error.is_panic()
            {
                warn!("Background task panicked: {error}");
            }
        }
    }

    /// Wait for outstanding tasks up to `limit`, then abort the rest
    pub async fn drain_with_timeout(&self, limit: Duration) {
        if tokio::time::timeout(limit, self.drain()).await.is_err() {
            warn!("Background tasks still running after {limit:?}, aborting them");
            let mut tasks = self.tasks.lock().await;
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
    }

    /// Cancel every outstanding task without waiting
    pub async fn abort_all(&self) {
        self.tasks.lock().await.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn drain_waits_for_spawned_work() {
        let registry = TaskRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            registry
                .spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        registry.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(registry.outstanding().await, 0);
    }

    #[tokio::test]
    async fn bounded_drain_aborts_stuck_tasks() {
        let registry = TaskRegistry::new();
        registry.spawn(std::future::pending()).await;
        registry.drain_with_timeout(Duration::from_millis(50)).await;
        assert_eq!(registry.outstanding().await, 0);
    }
}
