use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of scans running at once. Unbounded unless a limit is given.
#[derive(Debug, Clone, Default)]
pub struct ScanLimiter {
    sem: Option<Arc<Semaphore>>,
}

impl ScanLimiter {
    pub fn unbounded() -> Self {
        ScanLimiter { sem: None }
    }

    pub fn new(max_concurrent: Option<usize>) -> Self {
        match max_concurrent {
            Some(n) => ScanLimiter { sem: Some(Arc::new(Semaphore::new(n.max(1)))) },
            None => Self::unbounded(),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.sem.is_some()
    }

    /// Wait for a slot. The returned permit frees the slot when dropped;
    /// `None` means no limit is in force.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.sem {
            Some(sem) => sem.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}
