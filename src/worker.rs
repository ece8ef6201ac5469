//! Bounded pool for CPU-heavy key generation and signing.
//!
//! Jobs run on tokio's blocking threads; a semaphore caps how many run at
//! once so a burst of signing requests cannot starve the runtime.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{PkiError, Result};

#[derive(Debug, Clone)]
pub struct CryptoPool {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl CryptoPool {
    /// A pool running at most `workers` jobs concurrently (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        CryptoPool {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` off the async runtime once a permit is free and returns
    /// its result. A panicking job surfaces as [`PkiError::Worker`].
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PkiError::Worker("crypto pool closed".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| PkiError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn returns_job_result() {
        let pool = CryptoPool::new(2);
        assert_eq!(pool.run(|| Ok(21 * 2)).await.unwrap(), 42);

        let err = pool
            .run(|| Err::<(), _>(PkiError::NoCaLoaded))
            .await
            .unwrap_err();
        assert!(matches!(err, PkiError::NoCaLoaded));
    }

    #[tokio::test]
    async fn panicking_job_is_a_worker_error() {
        let pool = CryptoPool::new(1);
        let err = pool
            .run(|| -> Result<()> { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, PkiError::Worker(_)));

        // The permit was released despite the panic.
        assert_eq!(pool.run(|| Ok(1)).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_workers() {
        let pool = CryptoPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.workers(), 2);
    }
}
