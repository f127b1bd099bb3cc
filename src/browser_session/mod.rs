//! Shared headless browser with a bounded page pool
//!
//! One browser process is launched on first use and shared by every request
//! that reaches the headless tiers. Pages are leased under a counting
//! semaphore, so at most `max_pages` are open at once and extra callers
//! queue. The process is torn down by [`BrowserSessionManager::close_all`] or
//! by the idle reaper once no page has been open for the idle timeout.
//!
//! # Lifecycle
//! - `new()` does not launch anything
//! - first `acquire_page()` launches the browser (~2-3s)
//! - later calls reuse it after a `version()` health check; a crashed
//!   process is replaced transparently
//! - `close_all()` closes the process and removes its profile directory

mod handle;
mod lease;
mod slots;

pub use handle::BrowserHandle;
pub use lease::PageLease;
pub use slots::PageSlots;

use anyhow::{Context, Result};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::browser_setup::launch_browser;
use crate::config::ScrapeConfig;
use crate::stealth::{self, StealthProfile};

pub struct BrowserSessionManager {
    config: ScrapeConfig,
    profile: StealthProfile,
    browser: Mutex<Option<BrowserHandle>>,
    slots: PageSlots,
    last_activity: parking_lot::Mutex<Instant>,
    reaper: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl BrowserSessionManager {
    #[must_use]
    pub fn new(config: ScrapeConfig) -> Arc<Self> {
        Arc::new(Self {
            profile: StealthProfile::from_config(&config),
            slots: PageSlots::new(config.max_pages()),
            browser: Mutex::new(None),
            last_activity: parking_lot::Mutex::new(Instant::now()),
            reaper: parking_lot::Mutex::new(None),
            config,
        })
    }

    #[must_use]
    pub fn slots(&self) -> &PageSlots {
        &self.slots
    }

    /// Whether a browser process is currently held
    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    pub(crate) fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Lease a stealth-prepared blank page, waiting for a free slot
    ///
    /// # Errors
    ///
    /// Fails if the browser cannot be launched or the page cannot be created
    /// and prepared. The slot is returned before the error propagates.
    pub async fn acquire_page(self: &Arc<Self>) -> Result<PageLease> {
        let permit = self
            .slots
            .acquire()
            .await
            .context("Browser page pool is closed")?;
        self.touch();

        let page = {
            let mut guard = self.browser.lock().await;

            let healthy = match guard.as_ref() {
                Some(handle) => handle.is_healthy().await,
                None => true,
            };
            if !healthy {
                info!("Replacing crashed browser");
                if let Some(crashed) = guard.take() {
                    crashed.shutdown().await;
                }
            }

            if guard.is_none() {
                let (browser, handler, user_data_dir) = launch_browser(&self.config).await?;
                *guard = Some(BrowserHandle::new(browser, handler, user_data_dir));
                self.ensure_reaper();
            }

            let handle = guard
                .as_ref()
                .context("Browser missing after launch")?;
            handle
                .browser()
                .new_page("about:blank")
                .await
                .context("Failed to create blank page")?
        };

        if let Err(e) = stealth::inject(&page, &self.profile).await {
            if let Err(close_err) = page.close().await {
                debug!("Page close after failed stealth injection: {}", close_err);
            }
            return Err(e.context("Failed to prepare page"));
        }

        let open = self.slots.opened();
        debug!("Leased page ({}/{} open)", open, self.slots.limit());
        Ok(PageLease::new(page, permit, Arc::clone(self)))
    }

    /// Close the browser process and clear the pool
    ///
    /// Outstanding leases stay valid until dropped; their pages die with the
    /// process. Safe to call repeatedly. A later `acquire_page` relaunches.
    pub async fn close_all(&self) {
        if let Some(reaper) = self.reaper.lock().take() {
            reaper.abort();
        }

        let handle = self.browser.lock().await.take();
        if let Some(handle) = handle {
            info!("Shutting down shared browser");
            handle.shutdown().await;
        }
    }

    fn ensure_reaper(self: &Arc<Self>) {
        let Some(idle_timeout) = self.config.browser_idle_timeout() else {
            return;
        };

        let mut reaper = self.reaper.lock();
        if reaper.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let manager = Arc::downgrade(self);
        *reaper = Some(tokio::spawn(reap_idle_browser(manager, idle_timeout)));
    }

    /// Take the browser if it has been idle for `idle_timeout` with no pages
    async fn take_if_idle(&self, idle_timeout: Duration) -> Option<BrowserHandle> {
        let mut guard = self.browser.lock().await;
        let idle_for = self.last_activity.lock().elapsed();
        if guard.is_some() && self.slots.open() == 0 && idle_for >= idle_timeout {
            guard.take()
        } else {
            None
        }
    }
}

/// Background task closing the browser after an idle period
///
/// Holds only a weak reference so it never keeps the manager alive; exits
/// once the browser has been reaped or the manager dropped.
async fn reap_idle_browser(manager: Weak<BrowserSessionManager>, idle_timeout: Duration) {
    let check_every = (idle_timeout / 4).max(Duration::from_secs(1));
    loop {
        tokio::time::sleep(check_every).await;

        let Some(manager) = manager.upgrade() else {
            return;
        };

        if let Some(handle) = manager.take_if_idle(idle_timeout).await {
            info!("Closing browser after {:?} idle", idle_timeout);
            handle.shutdown().await;
            return;
        }

        if !manager.is_running().await {
            debug!("Idle reaper found no browser; exiting");
            return;
        }
    }
}
