//! Counting permit pool bounding simultaneous browsing sessions.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::crawl_types::{CrawlError, CrawlResult};

/// Bounds how many city tasks hold a session at once.
///
/// The permit is owned so it can move into a spawned task and is released
/// when that task drops it, whether the task finishes, fails or panics.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free permit.
    ///
    /// Fails with [`CrawlError::GateClosed`] once the gate is closed; this is
    /// a run-level error.
    pub async fn acquire(&self) -> CrawlResult<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CrawlError::GateClosed)
    }

    /// Refuse all future acquisitions; outstanding permits stay valid
    pub fn close(&self) {
        self.semaphore.close();
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let gate = ConcurrencyGate::new(2);
        let a = gate.acquire().await.expect("permit");
        let _b = gate.acquire().await.expect("permit");
        assert_eq!(gate.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(blocked.is_err(), "third acquire should wait");

        drop(a);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn closed_gate_is_an_error() {
        let gate = ConcurrencyGate::new(1);
        gate.close();
        assert!(matches!(gate.acquire().await, Err(CrawlError::GateClosed)));
    }
}
