//! Bounded pool of in-flight calls.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::DispatchError;

/// Runs calls as tokio tasks, at most `capacity` at a time.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: u32,
    closed: AtomicBool,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity: capacity as u32,
            closed: AtomicBool::new(false),
        }
    }

    /// Calls currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.capacity as usize - self.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run `work` once a slot is free.
    ///
    /// The work runs on its own task, so dropping the returned future does
    /// not cancel a call that already started.
    pub async fn run<F, T>(&self, work: F) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, DispatchError>> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(DispatchError::ShuttingDown);
        }
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::ShuttingDown)?;

        let task = tokio::spawn(async move {
            let _permit = permit;
            work.await
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                Err(DispatchError::Internal("call task panicked".to_string()))
            }
            Err(e) => Err(DispatchError::Internal(e.to_string())),
        }
    }

    /// Stop accepting calls and wait up to `timeout` for in-flight ones.
    ///
    /// Returns `true` if every call finished in time. Calls still running at
    /// the deadline are left to finish on their own.
    pub async fn close(&self, timeout: Duration) -> bool {
        self.closed.store(true, Ordering::SeqCst);
        let drained = tokio::time::timeout(timeout, self.permits.acquire_many(self.capacity)).await;
        self.permits.close();

        match drained {
            Ok(Ok(_all)) => {
                info!("worker pool drained");
                true
            }
            // Already closed by an earlier call; permits may still be out.
            Ok(Err(_)) => self.in_flight() == 0,
            Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    "worker pool close timed out, abandoning calls"
                );
                false
            }
        }
    }
}
