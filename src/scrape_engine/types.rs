use serde::{Deserialize, Serialize};

use super::errors::ScrapeError;
use crate::config::ScrapeConfig;
use crate::extraction::Record;

/// A validated scrape request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub source: String,
    pub query: String,
    pub page: u32,
}

impl ScrapeRequest {
    /// Validate the query and coerce the raw page parameter
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Validation`] for an empty (after trimming) or
    /// over-long query.
    pub fn new(
        source: impl Into<String>,
        query: &str,
        raw_page: Option<&str>,
        config: &ScrapeConfig,
    ) -> Result<Self, ScrapeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScrapeError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let length = query.chars().count();
        if length > config.max_query_length() {
            return Err(ScrapeError::Validation(format!(
                "query is {length} characters; the limit is {}",
                config.max_query_length()
            )));
        }

        Ok(Self {
            source: source.into(),
            query: query.to_string(),
            page: coerce_page(raw_page, config.max_page_number()),
        })
    }
}

/// Parse an untrusted page parameter
///
/// Missing, non-numeric, non-positive or greater-than-`max` values become 1.
#[must_use]
pub fn coerce_page(raw: Option<&str>, max: u32) -> u32 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| (1..=max).contains(n))
        .unwrap_or(1)
}

/// Response body for one scrape
///
/// `success: true` with `count: 0` is a legitimate empty page, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub success: bool,
    pub query: String,
    pub page: u32,
    pub count: usize,
    pub results: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScrapeResult {
    #[must_use]
    pub fn succeeded(request: &ScrapeRequest, results: Vec<Record>, message: Option<String>) -> Self {
        Self {
            success: true,
            query: request.query.clone(),
            page: request.page,
            count: results.len(),
            results,
            message,
        }
    }
}
