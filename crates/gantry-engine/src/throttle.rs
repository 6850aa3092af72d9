//! Admission control for task execution

use async_trait::async_trait;
use tokio::sync::Semaphore;

use gantry_model::Task;

/// Bounds how many tasks may run their handlers concurrently
///
/// The scheduler's structural fan-out is unbounded; a worker calls
/// `acquire_capacity` after its directories are set up and releases once
/// the handler returns, so only the heavy-work phase is gated. Cache
/// probes and directory setup are never throttled.
#[async_trait]
pub trait TaskThrottle: Send + Sync {
    /// Wait until the throttle admits this task
    async fn acquire_capacity(&self, task: &Task);

    /// Return previously acquired capacity; called exactly once per acquire
    fn release_capacity(&self, task: &Task);
}

/// Counting-semaphore throttle with a fixed number of execution slots
#[derive(Debug)]
pub struct SemaphoreThrottle {
    semaphore: Semaphore,
}

impl SemaphoreThrottle {
    /// Create a throttle admitting up to `capacity` concurrent executions
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Semaphore::new(capacity),
        }
    }
}

impl Default for SemaphoreThrottle {
    /// One execution slot per available CPU
    fn default() -> Self {
        let capacity = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(capacity)
    }
}

#[async_trait]
impl TaskThrottle for SemaphoreThrottle {
    async fn acquire_capacity(&self, _task: &Task) {
        // The semaphore is never closed, so acquire cannot fail.
        let permit = self.semaphore.acquire().await.unwrap();
        permit.forget();
    }

    fn release_capacity(&self, _task: &Task) {
        self.semaphore.add_permits(1);
    }
}
