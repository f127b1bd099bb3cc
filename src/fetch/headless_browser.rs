//! HeadlessBrowser tier: render the page in the shared stealth browser

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, Headers, ResourceType, SetBlockedUrLsParams,
    SetExtraHttpHeadersParams,
};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use reqwest::header::{HeaderMap, USER_AGENT};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::challenge::html_shows_challenge;
use super::{
    BlockSignal, FetchError, FetchOutcome, FetchRequest, FetchStrategy, RawPage, StrategyKind,
    with_budget,
};
use crate::browser_session::BrowserSessionManager;
use crate::config::ScrapeConfig;
use crate::utils::DOM_POLL_INTERVAL_MS;

/// Images, stylesheets and fonts are never needed to read the markup
const BLOCKED_RESOURCE_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.avif", "*.svg", "*.ico", "*.css", "*.woff",
    "*.woff2", "*.ttf", "*.otf", "*.eot",
];

/// Most capable tier: a real browser page
pub struct HeadlessBrowser {
    sessions: Arc<BrowserSessionManager>,
    navigation_timeout: Duration,
    content_wait: Duration,
}

impl HeadlessBrowser {
    #[must_use]
    pub fn new(sessions: Arc<BrowserSessionManager>, config: &ScrapeConfig) -> Self {
        Self {
            sessions,
            navigation_timeout: config.navigation_timeout(),
            content_wait: config.content_wait_timeout(),
        }
    }

    async fn render(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let lease = self
            .sessions
            .acquire_page()
            .await
            .map_err(FetchError::browser)?;
        let page = lease.page();

        prepare_network(page, &request.headers).await?;

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to subscribe to responses: {e}")))?;

        with_budget(
            async {
                page.goto(request.url.as_str())
                    .await
                    .map_err(|e| FetchError::Browser(format!("Navigation failed: {e}")))?;
                page.wait_for_navigation()
                    .await
                    .map_err(|e| FetchError::Browser(format!("Navigation failed: {e}")))?;
                Ok(())
            },
            self.navigation_timeout,
            "headless navigation",
        )
        .await?;

        // Last main-document response wins: challenge redirects come first.
        let mut status_code = 200;
        while let Some(Some(event)) = responses.next().now_or_never() {
            if event.r#type == ResourceType::Document {
                status_code = u16::try_from(event.response.status).unwrap_or(status_code);
            }
        }

        let marker_found = wait_for_marker(page, &request.content_marker, self.content_wait).await;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to read page content: {e}")))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| request.url.to_string());

        lease.release().await;

        let signal = if marker_found {
            BlockSignal::None
        } else if html_shows_challenge(&html) {
            warn!("Challenge page still present at {}", final_url);
            BlockSignal::ChallengeDetected
        } else {
            info!(
                "Content marker '{}' never appeared at {}",
                request.content_marker, final_url
            );
            BlockSignal::MissingContentMarker
        };

        Ok(FetchOutcome::new(
            RawPage {
                html,
                status_code,
                final_url,
            },
            signal,
        ))
    }
}

impl FetchStrategy for HeadlessBrowser {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HeadlessBrowser
    }

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchOutcome, FetchError>> {
        Box::pin(self.render(request))
    }
}

/// Enable network events, block heavy resources and send the request headers
async fn prepare_network(page: &Page, headers: &HeaderMap) -> Result<(), FetchError> {
    page.execute(EnableParams::default())
        .await
        .map_err(|e| FetchError::Browser(format!("Failed to enable network domain: {e}")))?;

    let patterns = BLOCKED_RESOURCE_PATTERNS
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    page.execute(SetBlockedUrLsParams::new(patterns))
        .await
        .map_err(|e| FetchError::Browser(format!("Failed to block resources: {e}")))?;

    // The page already carries the UA override and its own sec-fetch headers.
    let extra: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .filter(|(name, _)| *name != USER_AGENT && !name.as_str().starts_with("sec-fetch-"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), serde_json::Value::from(v)))
        })
        .collect();

    if !extra.is_empty() {
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            serde_json::Value::Object(extra),
        )))
        .await
        .map_err(|e| FetchError::Browser(format!("Failed to set request headers: {e}")))?;
    }

    Ok(())
}

/// Poll for `selector` until it appears or `max_wait` elapses
///
/// `wait_for_navigation` returns once the document has loaded, but listing
/// grids are often rendered by script afterward.
async fn wait_for_marker(page: &Page, selector: &str, max_wait: Duration) -> bool {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(DOM_POLL_INTERVAL_MS);

    loop {
        if page.find_element(selector).await.is_ok() {
            debug!("Content marker appeared after {:?}", start.elapsed());
            return true;
        }
        if start.elapsed() >= max_wait {
            return false;
        }
        tokio::time::sleep(poll_interval).await;
    }
}
