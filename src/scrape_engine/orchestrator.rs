//! Strategy orchestration
//!
//! Each request runs a small state machine exactly once:
//!
//! ```text
//! NotStarted --pace--> TryingStrategy(0)
//! TryingStrategy(i) --None--------------------------> Succeeded
//! TryingStrategy(i) --block, i+1 exists-------------> TryingStrategy(i+1)
//! TryingStrategy(last) --MissingContentMarker-------> Succeeded (with message)
//! TryingStrategy(last) --Http403/ChallengeDetected--> Blocked
//! TryingStrategy(i) --network/timeout/browser error-> Failed
//! ```
//!
//! Transport failures never escalate: an unreachable site stays unreachable
//! for the browser too.

use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::{AttemptContext, ScrapeError};
use super::pacing::OriginPacer;
use super::types::{ScrapeRequest, ScrapeResult};
use crate::browser_session::BrowserSessionManager;
use crate::config::ScrapeConfig;
use crate::extraction::extract;
use crate::fetch::{
    BlockSignal, BrowserChallengeSolver, ChallengeBypass, DirectHttp, FetchOutcome, FetchRequest,
    FetchStrategy, HeadlessBrowser, StrategyKind, build_http_client, default_headers,
};
use crate::sources::{SourceProfile, SourceRegistry};

/// Per-request orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    NotStarted,
    TryingStrategy(usize),
    Succeeded,
    Blocked,
    Failed,
}

/// Where a successful fetch at `index` of a `chain_len` chain leads
#[must_use]
pub fn next_state(index: usize, chain_len: usize, signal: BlockSignal) -> ScrapeState {
    let is_last = index + 1 >= chain_len;
    match signal {
        signal if !signal.is_blocked() => ScrapeState::Succeeded,
        BlockSignal::MissingContentMarker if is_last => ScrapeState::Succeeded,
        _ if !is_last => ScrapeState::TryingStrategy(index + 1),
        _ => ScrapeState::Blocked,
    }
}

/// The scraping entry point: sources, strategies, pacing and the browser
pub struct Scraper {
    config: ScrapeConfig,
    registry: SourceRegistry,
    strategies: HashMap<StrategyKind, Arc<dyn FetchStrategy>>,
    pacer: OriginPacer,
    sessions: Arc<BrowserSessionManager>,
    base_headers: HeaderMap,
}

impl Scraper {
    /// Build a scraper with the built-in sources and all three tiers
    ///
    /// Nothing is launched here; the browser starts on first use.
    ///
    /// # Errors
    ///
    /// Fails if a built-in schema does not compile or the HTTP client cannot
    /// be built.
    pub fn new(config: ScrapeConfig) -> anyhow::Result<Self> {
        let registry = SourceRegistry::builtin()?;
        let client = build_http_client()?;
        let sessions = BrowserSessionManager::new(config.clone());

        let solver = Arc::new(BrowserChallengeSolver::new(Arc::clone(&sessions), &config));
        let strategies: Vec<Arc<dyn FetchStrategy>> = vec![
            Arc::new(DirectHttp::new(client.clone(), &config)),
            Arc::new(ChallengeBypass::new(client, solver, &config)),
            Arc::new(HeadlessBrowser::new(Arc::clone(&sessions), &config)),
        ];

        Ok(Self::assemble(config, registry, strategies, sessions))
    }

    /// Build a scraper over caller-supplied sources and strategy implementations
    #[must_use]
    pub fn with_strategies(
        config: ScrapeConfig,
        registry: SourceRegistry,
        strategies: impl IntoIterator<Item = Arc<dyn FetchStrategy>>,
    ) -> Self {
        let sessions = BrowserSessionManager::new(config.clone());
        Self::assemble(config, registry, strategies, sessions)
    }

    fn assemble(
        config: ScrapeConfig,
        registry: SourceRegistry,
        strategies: impl IntoIterator<Item = Arc<dyn FetchStrategy>>,
        sessions: Arc<BrowserSessionManager>,
    ) -> Self {
        Self {
            pacer: OriginPacer::new(config.pacing_interval(), config.max_tracked_origins()),
            base_headers: default_headers(&config),
            strategies: strategies
                .into_iter()
                .map(|strategy| (strategy.kind(), strategy))
                .collect(),
            registry,
            sessions,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<BrowserSessionManager> {
        &self.sessions
    }

    /// Validate raw route parameters into a request
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Validation`] for an empty or over-long query.
    pub fn request(
        &self,
        source: &str,
        query: &str,
        page: Option<&str>,
    ) -> Result<ScrapeRequest, ScrapeError> {
        ScrapeRequest::new(source, query, page, &self.config)
    }

    /// Scrape one listing page of `source` for `query`
    ///
    /// # Errors
    ///
    /// See [`ScrapeError`]; a page with no results is `Ok`, not an error.
    pub async fn scrape(
        &self,
        source: &str,
        query: &str,
        page: Option<&str>,
    ) -> Result<ScrapeResult, ScrapeError> {
        let request = self.request(source, query, page)?;
        self.execute(&request).await
    }

    /// Like [`Scraper::execute`], abandoned as soon as `cancel` resolves
    ///
    /// The in-flight fetch is dropped, which returns any leased browser page.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Cancelled`] if `cancel` wins, otherwise as `execute`.
    pub async fn scrape_until<C>(
        &self,
        request: &ScrapeRequest,
        cancel: C,
    ) -> Result<ScrapeResult, ScrapeError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                info!("Scrape of {} '{}' cancelled", request.source, request.query);
                Err(ScrapeError::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }

    /// Run the state machine for a validated request
    ///
    /// # Errors
    ///
    /// See [`ScrapeError`].
    pub async fn execute(&self, request: &ScrapeRequest) -> Result<ScrapeResult, ScrapeError> {
        let profile = self
            .registry
            .get(&request.source)
            .ok_or_else(|| ScrapeError::UnknownSource(request.source.clone()))?;

        let url = profile
            .listing_url(&request.query, request.page)
            .map_err(|e| ScrapeError::Configuration(format!("{}: {e:#}", profile.name())))?;

        let mut headers = self.base_headers.clone();
        headers.extend(profile.headers().clone());
        let fetch_request = FetchRequest {
            url,
            headers,
            content_marker: profile.schema().root_css().to_string(),
        };

        let chain = profile.strategies();
        let mut context = AttemptContext::new(profile.name());
        let mut state = ScrapeState::NotStarted;
        debug!("{} '{}' p{}: {:?}", profile.name(), request.query, request.page, state);

        let waited = self.pacer.wait_turn(&fetch_request.url).await;
        if !waited.is_zero() {
            debug!("Paced {} for {:?}", profile.name(), waited);
        }

        for (index, kind) in chain.iter().copied().enumerate() {
            state = ScrapeState::TryingStrategy(index);
            context.strategy_attempted = Some(kind);
            debug!("{}: {:?}", profile.name(), state);

            let strategy = self.strategies.get(&kind).ok_or_else(|| {
                ScrapeError::Configuration(format!(
                    "{}: no {kind} strategy registered",
                    profile.name()
                ))
            })?;

            info!(
                "{} attempt {}/{} via {}: {}",
                profile.name(),
                index + 1,
                chain.len(),
                kind,
                fetch_request.url
            );

            let outcome = match strategy.fetch(&fetch_request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    state = ScrapeState::Failed;
                    warn!("{} {:?} after {}: {}", profile.name(), state, kind, e);
                    return Err(ScrapeError::from_fetch(e, context));
                }
            };

            context.block_signal = outcome.signal;
            state = next_state(index, chain.len(), outcome.signal);

            match state {
                ScrapeState::Succeeded => {
                    return Ok(self.finish(request, profile, kind, outcome));
                }
                ScrapeState::TryingStrategy(_) => {
                    warn!(
                        "{} {} reported {}; escalating",
                        profile.name(),
                        kind,
                        outcome.signal
                    );
                }
                _ => break,
            }
        }

        warn!("{} {:?}: {}", profile.name(), ScrapeState::Blocked, context);
        Err(ScrapeError::Blocked { context })
    }

    /// Extract, stamp provenance and wrap the records
    fn finish(
        &self,
        request: &ScrapeRequest,
        profile: &SourceProfile,
        kind: StrategyKind,
        outcome: FetchOutcome,
    ) -> ScrapeResult {
        let FetchOutcome { page, signal } = outcome;

        let mut records = extract(&page.html, profile.schema());
        for record in &mut records {
            record.source_meta.strategy = Some(kind);
            record.source_meta.page_url = Some(page.final_url.clone());
        }

        let message = if signal == BlockSignal::MissingContentMarker {
            Some(format!(
                "Content marker '{}' never appeared; the page may have no results",
                profile.schema().root_css()
            ))
        } else if records.is_empty() {
            Some("No results found".to_string())
        } else {
            None
        };

        info!(
            "{} '{}' p{} succeeded via {} with {} records",
            profile.name(),
            request.query,
            request.page,
            kind,
            records.len()
        );
        ScrapeResult::succeeded(request, records, message)
    }

    /// Close the shared browser, if one was launched
    pub async fn shutdown(&self) {
        self.sessions.close_all().await;
    }
}
