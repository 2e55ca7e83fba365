//! Bounded worker pool shared by every fan-out stage
//!
//! Tasks run as tokio tasks gated by one semaphore, so all stages of a run
//! together never exceed the pool size. A stage hands in its items, waits
//! until every task has finished, and gets one result per item back in
//! input order. Failures never cancel sibling tasks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `task` once per item and wait for all of them.
    ///
    /// Results are returned in the order of `items`. A task that panics
    /// is reported in its own slot as an error converted from its
    /// [`JoinError`].
    pub async fn run_all<I, T, E, F, Fut>(&self, stage: &str, items: Vec<I>, task: F) -> Vec<Result<T, E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: From<JoinError> + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let total = items.len();
        debug!(stage = %stage, tasks = total, workers = self.size, "Dispatching stage");

        let task = Arc::new(task);
        let mut join_set = JoinSet::new();
        let mut indices: HashMap<Id, usize> = HashMap::with_capacity(total);
        for (idx, item) in items.into_iter().enumerate() {
            let permits = Arc::clone(&self.permits);
            let task = Arc::clone(&task);
            let handle = join_set.spawn(async move {
                // The semaphore is never closed, so acquire only fails on shutdown
                let _permit = permits.acquire_owned().await.ok();
                task(item).await
            });
            indices.insert(handle.id(), idx);
        }

        let mut slots: Vec<Option<Result<T, E>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => (e.id(), Err(E::from(e))),
            };
            if let Some(&idx) = indices.get(&id) {
                slots[idx] = Some(result);
            }
        }

        let results: Vec<Result<T, E>> = slots.into_iter().flatten().collect();

        debug!(stage = %stage, tasks = total, "Stage drained");
        results
    }
}
