//! Page-slot accounting for the shared browser

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting semaphore with an open-page gauge and a high-water mark
///
/// A permit is held for the whole life of a page; callers beyond the limit
/// wait in `acquire` instead of failing.
#[derive(Debug)]
pub struct PageSlots {
    semaphore: Arc<Semaphore>,
    limit: usize,
    open: AtomicUsize,
    high_water: AtomicUsize,
}

impl PageSlots {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            open: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot
    ///
    /// # Errors
    ///
    /// Fails only if the semaphore was closed.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Record a page opened under an acquired permit; returns the new gauge
    pub fn opened(&self) -> usize {
        let now = self.open.fetch_add(1, Ordering::AcqRel) + 1;
        self.high_water.fetch_max(now, Ordering::AcqRel);
        now
    }

    /// Record a page closed; returns the new gauge
    pub fn closed(&self) -> usize {
        let previous = self
            .open
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    #[must_use]
    pub fn open(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_never_exceeds_limit_and_queues_excess() {
        let slots = Arc::new(PageSlots::new(4));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let slots = Arc::clone(&slots);
                tokio::spawn(async move {
                    let _permit = slots.acquire().await.expect("semaphore open");
                    let open = slots.opened();
                    assert!(open <= 4, "open pages {open} exceeded limit");
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    slots.closed();
                })
            })
            .collect();

        for task in tasks {
            task.await.expect("task completed");
        }

        assert_eq!(slots.open(), 0);
        assert!(slots.high_water() <= 4);
        assert!(slots.high_water() >= 1);
        assert_eq!(slots.available(), 4);
    }

    #[tokio::test]
    async fn test_permit_drop_frees_slot() {
        let slots = PageSlots::new(1);
        let permit = slots.acquire().await.expect("semaphore open");
        assert_eq!(slots.available(), 0);
        drop(permit);
        assert_eq!(slots.available(), 1);
    }

    #[test]
    fn test_closed_never_underflows() {
        let slots = PageSlots::new(2);
        assert_eq!(slots.closed(), 0);
        assert_eq!(slots.opened(), 1);
        assert_eq!(slots.closed(), 0);
        assert_eq!(slots.open(), 0);
    }
}
