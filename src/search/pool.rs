//! Bounded task pool for branch expansion.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs batches of independent jobs with at most `size` in flight.
///
/// Clones share the same permits. Results come back in submission order
/// whatever order the jobs finish in, so a batch's output never depends on
/// scheduling. A pool of size 1 runs jobs strictly one after another.
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

    /// One worker per available CPU.
    pub fn with_available_parallelism() -> Self {
        let size = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(size)
    }

    /// Pool sized from configuration; 0 means available parallelism.
    pub fn from_workers(workers: usize) -> Self {
        if workers == 0 {
            Self::with_available_parallelism()
        } else {
            Self::new(workers)
        }
    }

    /// A pool of the same size with its own permits.
    pub fn independent(&self) -> Self {
        Self::new(self.size)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every job and wait for all of them.
    ///
    /// A job that panics is logged and left out of the output.
    pub async fn run<T, F>(&self, jobs: Vec<F>) -> Vec<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let total = jobs.len();
        let mut set = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let permits = self.permits.clone();
            set.spawn(async move {
                // never closed, so acquisition only waits
                let _permit = permits.acquire_owned().await.ok();
                (index, job.await)
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => log::error!("Worker task failed: {}", e),
            }
        }

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, value)| value).collect()
    }
}
