//! Fluent builder for `ScrapeConfig`
//!
//! Every field has a default, so the builder only records overrides and
//! validates the combination once in [`ScrapeConfigBuilder::build`].

use anyhow::{Result, bail};
use std::path::PathBuf;

use super::types::ScrapeConfig;
use crate::utils::MAX_PAGES_LIMIT;

#[derive(Debug, Clone, Default)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfig {
    /// Start a builder seeded with the defaults
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }

    /// Start a builder seeded with this config, e.g. one loaded from a file
    #[must_use]
    pub fn to_builder(&self) -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: self.clone(),
        }
    }

    /// Check the invariants the rest of the crate relies on
    ///
    /// # Errors
    ///
    /// Returns an error naming the first field that is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 || self.max_pages > MAX_PAGES_LIMIT {
            bail!(
                "max_pages must be between 1 and {MAX_PAGES_LIMIT}, got {}",
                self.max_pages
            );
        }
        for (name, secs) in [
            ("http_timeout_secs", self.http_timeout_secs),
            ("challenge_timeout_secs", self.challenge_timeout_secs),
            ("navigation_timeout_secs", self.navigation_timeout_secs),
            ("content_wait_timeout_secs", self.content_wait_timeout_secs),
        ] {
            if secs == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        if self.max_tracked_origins == 0 {
            bail!("max_tracked_origins must be greater than zero");
        }
        if self.max_query_length == 0 {
            bail!("max_query_length must be greater than zero");
        }
        if self.max_page_number == 0 {
            bail!("max_page_number must be greater than zero");
        }
        if self.user_agent.trim().is_empty() {
            bail!("user_agent cannot be empty");
        }
        Ok(())
    }
}

impl ScrapeConfigBuilder {
    #[must_use]
    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn challenge_timeout_secs(mut self, secs: u64) -> Self {
        self.config.challenge_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn content_wait_timeout_secs(mut self, secs: u64) -> Self {
        self.config.content_wait_timeout_secs = secs;
        self
    }

    /// Set the per-origin pacing gap
    ///
    /// 0 disables pacing entirely, which is only sensible in tests.
    #[must_use]
    pub fn pacing_interval_ms(mut self, ms: u64) -> Self {
        self.config.pacing_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn max_tracked_origins(mut self, count: usize) -> Self {
        self.config.max_tracked_origins = count;
        self
    }

    /// Set the page-pool bound (1-32)
    #[must_use]
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = pages;
        self
    }

    #[must_use]
    pub fn browser_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.browser_idle_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.config.accept_language = accept_language.into();
        self
    }

    #[must_use]
    pub fn max_query_length(mut self, length: usize) -> Self {
        self.config.max_query_length = length;
        self
    }

    #[must_use]
    pub fn max_page_number(mut self, page: u32) -> Self {
        self.config.max_page_number = page;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    /// Validate and return the finished config
    ///
    /// # Errors
    ///
    /// Returns an error if any field is out of range (see [`ScrapeConfig::validate`]).
    pub fn build(self) -> Result<ScrapeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
