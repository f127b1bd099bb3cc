//! Per-origin request pacing
//!
//! Enforces a minimum gap between consecutive requests to the same origin.
//! Callers for one origin queue behind its slot; different origins never wait
//! on each other. Tracked origins are bounded by an LRU so memory stays flat
//! however many sites are scraped. Only idle slots (unheld, interval elapsed)
//! are evicted; when every slot is still pacing the bound grows instead.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

type OriginSlot = Arc<Mutex<Option<Instant>>>;

pub struct OriginPacer {
    interval: Duration,
    origins: Mutex<LruCache<String, OriginSlot>>,
}

impl OriginPacer {
    #[must_use]
    pub fn new(interval: Duration, max_tracked_origins: usize) -> Self {
        let capacity = NonZeroUsize::new(max_tracked_origins).unwrap_or(NonZeroUsize::MIN);
        Self {
            interval,
            origins: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Wait until `url`'s origin may be contacted again, then claim the slot
    ///
    /// Returns how long the caller waited.
    pub async fn wait_turn(&self, url: &Url) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }

        let key = origin_key(url);
        let slot = {
            let mut origins = self.origins.lock().await;
            match origins.get(&key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    if origins.len() >= origins.cap().get() {
                        self.make_room(&mut origins);
                    }
                    let slot = Arc::new(Mutex::new(None));
                    origins.put(key.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        // Held across the sleep so same-origin callers are spaced one by one.
        let mut last = slot.lock().await;
        let started = Instant::now();
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > started {
                let wait = ready_at - started;
                tracing::debug!("Pacing {} for {:?}", key, wait);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        started.elapsed()
    }

    /// Evict the least recently used idle slot, or grow the bound by one
    ///
    /// Slots are only cloned under the `origins` lock, so a strong count of
    /// one means no caller holds or waits on it.
    fn make_room(&self, origins: &mut LruCache<String, OriginSlot>) {
        let now = Instant::now();
        let idle = origins
            .iter()
            .rev()
            .find(|(_, slot)| {
                Arc::strong_count(slot) == 1
                    && slot.try_lock().is_ok_and(|last| {
                        (*last).is_none_or(|previous| previous + self.interval <= now)
                    })
            })
            .map(|(key, _)| key.clone());

        match idle {
            Some(key) => {
                origins.pop(&key);
            }
            None => {
                let grown = origins.cap().saturating_add(1);
                tracing::debug!("All paced origins busy; tracking up to {}", grown);
                origins.resize(grown);
            }
        }
    }

    /// Number of origins currently tracked
    pub async fn tracked_origins(&self) -> usize {
        self.origins.lock().await.len()
    }
}

/// `scheme://host[:port]`, so `http` and `https` pace separately
fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
