//! Leased browser page with guaranteed slot release

use chromiumoxide::Page;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, warn};

use super::BrowserSessionManager;

/// A page checked out of the [`BrowserSessionManager`]
///
/// The slot is returned on every exit path. [`PageLease::release`] closes the
/// page and waits for it; dropping the lease (error, timeout, cancellation)
/// returns the slot immediately and closes the page in the background.
pub struct PageLease {
    page: Option<Page>,
    permit: Option<OwnedSemaphorePermit>,
    manager: Arc<BrowserSessionManager>,
}

impl PageLease {
    pub(super) fn new(
        page: Page,
        permit: OwnedSemaphorePermit,
        manager: Arc<BrowserSessionManager>,
    ) -> Self {
        Self {
            page: Some(page),
            permit: Some(permit),
            manager,
        }
    }

    /// The leased page
    ///
    /// # Panics
    ///
    /// Never in practice: the page is only taken by `release` and `Drop`,
    /// both of which consume the lease.
    #[must_use]
    pub fn page(&self) -> &Page {
        self.page
            .as_ref()
            .expect("BUG: PageLease page accessed after release")
    }

    /// Close the page and return its slot
    pub async fn release(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close failed (browser may be gone): {}", e);
            }
            self.return_slot();
        }
    }

    fn return_slot(&mut self) {
        let open = self.manager.slots().closed();
        self.manager.touch();
        self.permit.take();
        debug!("Page slot returned ({} open)", open);
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        debug!("Background page close failed: {}", e);
                    }
                });
            }
            Err(_) => warn!("PageLease dropped outside a runtime; page left to browser teardown"),
        }

        self.return_slot();
    }
}
