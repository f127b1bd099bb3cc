//! Getter methods for `ScrapeConfig`
//!
//! Durations are stored as integer seconds/milliseconds for serde and exposed
//! here as `Duration`.

use std::path::Path;
use std::time::Duration;

use super::types::ScrapeConfig;

impl ScrapeConfig {
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn challenge_timeout(&self) -> Duration {
        Duration::from_secs(self.challenge_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn content_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.content_wait_timeout_secs)
    }

    #[must_use]
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    #[must_use]
    pub fn max_tracked_origins(&self) -> usize {
        self.max_tracked_origins
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Idle period after which the browser is closed, `None` when disabled
    #[must_use]
    pub fn browser_idle_timeout(&self) -> Option<Duration> {
        (self.browser_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.browser_idle_timeout_secs))
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn accept_language(&self) -> &str {
        &self.accept_language
    }

    #[must_use]
    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    #[must_use]
    pub fn max_page_number(&self) -> u32 {
        self.max_page_number
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }
}
