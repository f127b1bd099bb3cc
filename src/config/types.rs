//! Core configuration types for scraping
//!
//! This module contains the `ScrapeConfig` struct that carries every tunable
//! used by the fetch tiers, the browser session and the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_BROWSER_IDLE_TIMEOUT_SECS,
    DEFAULT_CHALLENGE_TIMEOUT_SECS, DEFAULT_CONTENT_WAIT_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_PAGE_NUMBER, DEFAULT_MAX_PAGES, DEFAULT_MAX_QUERY_LENGTH,
    DEFAULT_MAX_TRACKED_ORIGINS, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_PACING_INTERVAL_MS,
};

/// Main configuration struct for scrape operations
///
/// Deserializes with `#[serde(default)]`, so a partial JSON file only needs
/// the fields it overrides. Call [`ScrapeConfig::validate`] after loading one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Timeout in seconds for the DirectHttp tier
    ///
    /// Default: 30 seconds
    pub(crate) http_timeout_secs: u64,

    /// Timeout in seconds for the ChallengeBypass tier
    ///
    /// Covers the challenge-solving navigation and the replayed GET together.
    ///
    /// Default: 60 seconds
    pub(crate) challenge_timeout_secs: u64,

    /// Timeout in seconds for headless navigation to reach DOMContentLoaded
    ///
    /// Default: 30 seconds
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout in seconds to wait for the schema's root selector after navigation
    ///
    /// Default: 15 seconds
    pub(crate) content_wait_timeout_secs: u64,

    /// Minimum milliseconds between two requests to the same origin
    ///
    /// Default: 2000
    pub(crate) pacing_interval_ms: u64,

    /// Number of origins the pacer remembers before evicting the least recent
    pub(crate) max_tracked_origins: usize,

    /// Maximum browser pages open at once across all requests
    /// Default: 4, Range: 1-32
    pub(crate) max_pages: usize,

    /// Close the browser after this many seconds with zero open pages
    ///
    /// 0 disables idle teardown; the browser then lives until `close_all()`.
    ///
    /// Default: 300 seconds
    pub(crate) browser_idle_timeout_secs: u64,

    pub(crate) headless: bool,
    pub(crate) user_agent: String,
    pub(crate) accept_language: String,
    pub(crate) max_query_length: usize,
    pub(crate) max_page_number: u32,

    /// Explicit Chrome/Chromium executable
    ///
    /// When unset the browser is discovered via `CHROMIUM_PATH`, platform
    /// install paths and `which`, then downloaded as a last resort.
    pub(crate) chrome_executable: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            challenge_timeout_secs: DEFAULT_CHALLENGE_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            content_wait_timeout_secs: DEFAULT_CONTENT_WAIT_TIMEOUT_SECS,
            pacing_interval_ms: DEFAULT_PACING_INTERVAL_MS,
            max_tracked_origins: DEFAULT_MAX_TRACKED_ORIGINS,
            max_pages: DEFAULT_MAX_PAGES,
            browser_idle_timeout_secs: DEFAULT_BROWSER_IDLE_TIMEOUT_SECS,
            headless: true,
            user_agent: CHROME_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            max_page_number: DEFAULT_MAX_PAGE_NUMBER,
            chrome_executable: None,
        }
    }
}
