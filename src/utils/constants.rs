//! Shared configuration constants for mediascrape
//!
//! Default values used by `ScrapeConfig` and the fetch tiers so the same
//! numbers are not repeated across modules.

/// DirectHttp time budget: 30 seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// ChallengeBypass time budget: 60 seconds
///
/// Covers the challenge-solving navigation plus the replayed GET.
pub const DEFAULT_CHALLENGE_TIMEOUT_SECS: u64 = 60;

/// Headless navigation cap ("content loaded" wait): 30 seconds
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Headless wait for the schema's root selector: 15 seconds
pub const DEFAULT_CONTENT_WAIT_TIMEOUT_SECS: u64 = 15;

/// Minimum gap between two requests to the same origin: 2 seconds
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 2_000;

/// Maximum number of origins tracked by the pacer before LRU eviction
pub const DEFAULT_MAX_TRACKED_ORIGINS: usize = 1_000;

/// Maximum concurrently open browser pages
pub const DEFAULT_MAX_PAGES: usize = 4;

/// Upper bound accepted for `max_pages`
pub const MAX_PAGES_LIMIT: usize = 32;

/// Close the browser after this long with zero open pages: 5 minutes
pub const DEFAULT_BROWSER_IDLE_TIMEOUT_SECS: u64 = 300;

/// Maximum accepted query length in characters
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 100;

/// Page numbers above this coerce to 1
pub const DEFAULT_MAX_PAGE_NUMBER: u32 = 999;

/// Poll interval used while waiting for DOM conditions in the browser tiers
pub const DOM_POLL_INTERVAL_MS: u64 = 200;

/// Chrome user agent string shared by the HTTP tiers and the browser
///
/// The challenge clearance cookie is bound to the user agent that earned it,
/// so every tier must present this exact string.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default `Accept-Language` header
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Default `Accept` header for document requests
pub const DOCUMENT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
