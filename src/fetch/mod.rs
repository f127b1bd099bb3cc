//! Fetch strategies
//!
//! Every tier retrieves raw HTML for a URL and classifies the outcome with a
//! [`BlockSignal`]. The tiers share one contract, [`FetchStrategy`], so the
//! orchestrator can walk an ordered escalation list without knowing which
//! concrete technique sits behind each entry.

pub mod challenge;
pub mod challenge_bypass;
pub mod direct_http;
pub mod headless_browser;
pub mod timeout;

use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::ScrapeConfig;
use crate::utils::DOCUMENT_ACCEPT;

pub use challenge::{html_shows_challenge, title_shows_challenge};
pub use challenge_bypass::{
    BrowserChallengeSolver, ChallengeBypass, ChallengeSolver, Clearance, Solved,
};
pub use direct_http::DirectHttp;
pub use headless_browser::HeadlessBrowser;
pub use timeout::with_budget;

/// The tagged strategy variants, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    DirectHttp,
    ChallengeBypass,
    HeadlessBrowser,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectHttp => write!(f, "direct-http"),
            Self::ChallengeBypass => write!(f, "challenge-bypass"),
            Self::HeadlessBrowser => write!(f, "headless-browser"),
        }
    }
}

/// Why a fetch yielded no usable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockSignal {
    #[default]
    None,
    Http403,
    ChallengeDetected,
    MissingContentMarker,
}

impl BlockSignal {
    #[must_use]
    pub fn is_blocked(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Http403 => write!(f, "http 403"),
            Self::ChallengeDetected => write!(f, "challenge detected"),
            Self::MissingContentMarker => write!(f, "missing content marker"),
        }
    }
}

/// HTML produced by one fetch attempt, discarded after extraction
#[derive(Debug, Clone)]
pub struct RawPage {
    pub html: String,
    pub status_code: u16,
    pub final_url: String,
}

/// What a strategy needs to know about the target
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: HeaderMap,
    /// Root selector of the source's extraction schema; its presence marks
    /// a rendered content page.
    pub content_marker: String,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub page: RawPage,
    pub signal: BlockSignal,
}

impl FetchOutcome {
    #[must_use]
    pub fn new(page: RawPage, signal: BlockSignal) -> Self {
        Self { page, signal }
    }
}

/// Transport-class failures; these never escalate to a costlier tier
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Classify a reqwest failure, keeping the full source chain in the message
    #[must_use]
    pub fn from_reqwest(error: reqwest::Error, budget: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(budget)
        } else {
            Self::Network(format!("{:#}", anyhow::Error::from(error)))
        }
    }

    pub(crate) fn browser(error: anyhow::Error) -> Self {
        Self::Browser(format!("{error:#}"))
    }
}

/// Uniform contract implemented by every tier
///
/// Boxed futures keep the trait object-safe so chains can hold
/// `Arc<dyn FetchStrategy>` values of different concrete types.
pub trait FetchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchOutcome, FetchError>>;
}

/// Browser-like default headers shared by the HTTP tiers
///
/// `Accept-Encoding` is left to reqwest, which only advertises the codecs it
/// can actually decode.
#[must_use]
pub fn default_headers(config: &ScrapeConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(config.user_agent()) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static(DOCUMENT_ACCEPT));
    if let Ok(value) = HeaderValue::from_str(config.accept_language()) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers
}

/// Build the shared reqwest client used by the HTTP tiers
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_none_is_unblocked() {
        assert!(!BlockSignal::None.is_blocked());
        assert!(BlockSignal::Http403.is_blocked());
        assert!(BlockSignal::ChallengeDetected.is_blocked());
        assert!(BlockSignal::MissingContentMarker.is_blocked());
    }
}
