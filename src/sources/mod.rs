//! Source profiles
//!
//! A source ties together everything needed to scrape one site: how to build
//! the listing URL for a query and page, which extraction schema reads it,
//! the ordered strategy chain to escalate through and extra request headers.
//! The registry is built once at startup and never mutated.

pub mod peakpx;
pub mod pixiv;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::collections::HashMap;
use url::Url;

use crate::extraction::ExtractionSchema;
use crate::fetch::StrategyKind;

/// Builds the listing URL for `(origin, query, page)`
pub type UrlBuilder = fn(&Url, &str, u32) -> Result<Url>;

#[derive(Debug, Clone)]
pub struct SourceProfile {
    name: String,
    origin: Url,
    schema: ExtractionSchema,
    strategies: Vec<StrategyKind>,
    headers: HeaderMap,
    url_builder: UrlBuilder,
}

impl SourceProfile {
    /// Create a profile whose requests carry `Referer: <origin>`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        origin: Url,
        schema: ExtractionSchema,
        strategies: Vec<StrategyKind>,
        url_builder: UrlBuilder,
    ) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(referer) = HeaderValue::from_str(origin.as_str()) {
            headers.insert(REFERER, referer);
        }
        Self {
            name: name.into(),
            origin,
            schema,
            strategies,
            headers,
            url_builder,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    #[must_use]
    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Strategies in escalation order, cheapest first
    #[must_use]
    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    /// Headers merged over the default browser-like set
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Listing URL for a validated query and page
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be assembled.
    pub fn listing_url(&self, query: &str, page: u32) -> Result<Url> {
        (self.url_builder)(&self.origin, query, page)
    }
}

/// Immutable name -> profile lookup
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    profiles: HashMap<String, SourceProfile>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = SourceProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.name.clone(), profile))
                .collect(),
        }
    }

    /// The built-in HTML sources
    ///
    /// # Errors
    ///
    /// Fails only if a built-in schema does not compile.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new([peakpx::profile()?, pixiv::profile()?]))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SourceProfile> {
        self.profiles.get(name)
    }

    /// Registered source names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
