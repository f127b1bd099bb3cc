//! ChallengeBypass tier
//!
//! Satisfies the site's JavaScript challenge in the shared browser, harvests
//! the clearance cookies it earns, then replays the GET over HTTP carrying
//! those cookies and the same user agent. The replay is classified exactly
//! like [`DirectHttp`](super::DirectHttp): still 403 means still blocked.
//!
//! The solver gets half of the tier budget. A challenge still showing when
//! that window closes is reported as [`BlockSignal::ChallengeDetected`] so the
//! orchestrator can escalate; only transport stalls exhaust the full budget.

use futures::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::challenge::html_shows_challenge;
use super::direct_http::{classify_status, get_document};
use super::{
    BlockSignal, FetchError, FetchOutcome, FetchRequest, FetchStrategy, RawPage, StrategyKind,
    with_budget,
};
use crate::browser_session::BrowserSessionManager;
use crate::config::ScrapeConfig;
use crate::utils::DOM_POLL_INTERVAL_MS;

/// Credentials earned by passing a challenge
#[derive(Debug, Clone, Default)]
pub struct Clearance {
    /// Ready-to-send `Cookie` header value, empty when no cookie was issued
    pub cookie_header: String,
    /// The clearance is bound to this user agent
    pub user_agent: String,
}

/// How a solve attempt ended
#[derive(Debug, Clone)]
pub enum Solved {
    Cleared(Clearance),
    /// The challenge was still up at the deadline; carries the last snapshot
    StillChallenged(RawPage),
}

/// Something that can pass an anti-automation challenge for a URL
///
/// Implementations stop waiting for the challenge at `deadline` and return
/// [`Solved::StillChallenged`] rather than running out the tier budget.
pub trait ChallengeSolver: Send + Sync {
    fn solve<'a>(
        &'a self,
        request: &'a FetchRequest,
        deadline: Instant,
    ) -> BoxFuture<'a, Result<Solved, FetchError>>;
}

/// Solves challenges by letting a stealth browser page run them
pub struct BrowserChallengeSolver {
    sessions: Arc<BrowserSessionManager>,
    user_agent: String,
}

impl BrowserChallengeSolver {
    #[must_use]
    pub fn new(sessions: Arc<BrowserSessionManager>, config: &ScrapeConfig) -> Self {
        Self {
            sessions,
            user_agent: config.user_agent().to_string(),
        }
    }

    async fn solve_with_browser(&self, url: &Url, deadline: Instant) -> Result<Solved, FetchError> {
        let lease = self
            .sessions
            .acquire_page()
            .await
            .map_err(FetchError::browser)?;
        let page = lease.page();

        page.goto(url.as_str())
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to navigate to {url}: {e}")))?;

        // The interstitial replaces itself once its script has run.
        let host = url.host_str().unwrap_or_default();
        let poll_interval = Duration::from_millis(DOM_POLL_INTERVAL_MS);
        loop {
            let html = page
                .content()
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to read page content: {e}")))?;
            if !html_shows_challenge(&html) {
                break;
            }
            if Instant::now() >= deadline {
                let final_url = match page.url().await {
                    Ok(Some(current)) => current,
                    _ => url.to_string(),
                };
                lease.release().await;
                warn!("Challenge for {} still present at solve deadline", host);
                // Interstitials are served with 403.
                return Ok(Solved::StillChallenged(RawPage {
                    html,
                    status_code: StatusCode::FORBIDDEN.as_u16(),
                    final_url,
                }));
            }
            tokio::time::sleep_until((Instant::now() + poll_interval).min(deadline)).await;
        }

        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to read cookies: {e}")))?;

        let cookie_header = cookies
            .iter()
            .filter(|cookie| cookie_applies(&cookie.domain, host))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");

        lease.release().await;

        info!(
            "Challenge cleared for {} ({} cookie bytes)",
            host,
            cookie_header.len()
        );
        Ok(Solved::Cleared(Clearance {
            cookie_header,
            user_agent: self.user_agent.clone(),
        }))
    }
}

impl ChallengeSolver for BrowserChallengeSolver {
    fn solve<'a>(
        &'a self,
        request: &'a FetchRequest,
        deadline: Instant,
    ) -> BoxFuture<'a, Result<Solved, FetchError>> {
        Box::pin(self.solve_with_browser(&request.url, deadline))
    }
}

/// Cookie `domain` attribute matching, leading dot optional
fn cookie_applies(domain: &str, host: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Middle tier: solve the challenge, then replay the GET with its clearance
pub struct ChallengeBypass {
    client: reqwest::Client,
    solver: Arc<dyn ChallengeSolver>,
    timeout: Duration,
}

impl ChallengeBypass {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        solver: Arc<dyn ChallengeSolver>,
        config: &ScrapeConfig,
    ) -> Self {
        Self::with_timeout(client, solver, config.challenge_timeout())
    }

    #[must_use]
    pub fn with_timeout(
        client: reqwest::Client,
        solver: Arc<dyn ChallengeSolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            solver,
            timeout,
        }
    }

    /// Share of the budget the solver may spend waiting on the challenge
    fn solve_window(&self) -> Duration {
        self.timeout / 2
    }

    async fn solve_and_replay(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let deadline = Instant::now() + self.solve_window();
        let clearance = match self.solver.solve(request, deadline).await? {
            Solved::Cleared(clearance) => clearance,
            Solved::StillChallenged(page) => {
                return Ok(FetchOutcome::new(page, BlockSignal::ChallengeDetected));
            }
        };

        let mut headers = request.headers.clone();
        if let Ok(value) = HeaderValue::from_str(&clearance.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        if clearance.cookie_header.is_empty() {
            debug!("No clearance cookie issued for {}", request.url);
        } else if let Ok(value) = HeaderValue::from_str(&clearance.cookie_header) {
            headers.insert(COOKIE, value);
        }

        let page = get_document(&self.client, &request.url, &headers, self.timeout).await?;
        let signal = classify_status(page.status_code);
        Ok(FetchOutcome::new(page, signal))
    }
}

impl FetchStrategy for ChallengeBypass {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ChallengeBypass
    }

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchOutcome, FetchError>> {
        Box::pin(with_budget(
            self.solve_and_replay(request),
            self.timeout,
            "challenge bypass",
        ))
    }
}
