//! DirectHttp tier: one plain GET with browser-like headers

use futures::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{BlockSignal, FetchError, FetchOutcome, FetchRequest, FetchStrategy, RawPage, StrategyKind};
use crate::config::ScrapeConfig;

/// Cheapest tier: a single GET under the HTTP time budget
#[derive(Debug, Clone)]
pub struct DirectHttp {
    client: reqwest::Client,
    timeout: Duration,
}

impl DirectHttp {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ScrapeConfig) -> Self {
        Self {
            client,
            timeout: config.http_timeout(),
        }
    }

    #[must_use]
    pub fn with_timeout(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl FetchStrategy for DirectHttp {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectHttp
    }

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchOutcome, FetchError>> {
        Box::pin(async move {
            let page = get_document(&self.client, &request.url, &request.headers, self.timeout).await?;
            let signal = classify_status(page.status_code);
            Ok(FetchOutcome::new(page, signal))
        })
    }
}

/// GET a document and read its body, shared with the challenge replay
pub(crate) async fn get_document(
    client: &reqwest::Client,
    url: &Url,
    headers: &HeaderMap,
    budget: Duration,
) -> Result<RawPage, FetchError> {
    debug!("GET {}", url);

    let response = client
        .get(url.clone())
        .headers(headers.clone())
        .timeout(budget)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(e, budget))?;

    let status = response.status();
    let final_url = response.url().to_string();
    let html = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(e, budget))?;

    if !status.is_success() {
        warn!("HTTP {} for {}", status.as_u16(), url);
    }

    Ok(RawPage {
        html,
        status_code: status.as_u16(),
        final_url,
    })
}

/// Only an explicit 403 is a block; every other status is handed to
/// extraction, where an error page simply yields no records.
pub(crate) fn classify_status(status_code: u16) -> BlockSignal {
    if status_code == StatusCode::FORBIDDEN.as_u16() {
        BlockSignal::Http403
    } else {
        BlockSignal::None
    }
}
