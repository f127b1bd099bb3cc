//! Test utilities shared by the mediascrape integration tests

use futures::future::BoxFuture;
use kodegen_tools_mediascrape::{
    BlockSignal, ChallengeSolver, ExtractionSchema, Field, FieldSpec, FetchError, FetchOutcome,
    FetchRequest, FetchStrategy, RawPage, ScrapeConfig, Solved, SourceProfile, StrategyKind,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;
use url::Url;

pub const GALLERY_ORIGIN: &str = "http://gallery.test";

/// Config with pacing disabled so orchestration tests run instantly
#[allow(dead_code)]
pub fn fast_config() -> ScrapeConfig {
    ScrapeConfig::builder()
        .pacing_interval_ms(0)
        .build()
        .expect("valid test config")
}

/// `<origin>/search?q=<query>&page=<page>`
#[allow(dead_code)]
pub fn gallery_url(origin: &Url, query: &str, page: u32) -> anyhow::Result<Url> {
    let mut url = origin.join("/search")?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Schema for the `<ul class="gallery"><li class="item">` markup below
#[allow(dead_code)]
pub fn gallery_schema(origin: &Url) -> ExtractionSchema {
    ExtractionSchema::builder("gallery", origin.clone(), "ul.gallery > li.item")
        .field(Field::Title, FieldSpec::text("h3"))
        .field(Field::Title, FieldSpec::own_attr("data-title"))
        .field(Field::MediaUrl, FieldSpec::attr("a.full", "href"))
        .field(Field::Thumbnail, FieldSpec::attr("img", "src"))
        .field(Field::Author, FieldSpec::text(".by"))
        .field(Field::Dimensions, FieldSpec::text(".res"))
        .default_title("Untitled")
        .build()
        .expect("gallery schema compiles")
}

#[allow(dead_code)]
pub fn gallery_profile(origin: &str, strategies: Vec<StrategyKind>) -> SourceProfile {
    let origin = Url::parse(origin).expect("valid origin");
    let schema = gallery_schema(&origin);
    SourceProfile::new("gallery", origin, schema, strategies, gallery_url)
}

/// One gallery item; `None` media leaves out the full-size link
#[allow(dead_code)]
pub fn gallery_item(title: &str, media: Option<&str>) -> String {
    let link = media
        .map(|href| format!(r#"<a class="full" href="{href}">full</a>"#))
        .unwrap_or_default();
    format!(r#"<li class="item"><h3>{title}</h3>{link}<img src="/t/{title}.jpg"></li>"#)
}

#[allow(dead_code)]
pub fn gallery_page(items: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Gallery</title></head>
<body><ul class="gallery">{}</ul></body></html>"#,
        items.concat()
    )
}

/// What a scripted strategy does on each call
#[allow(dead_code)]
#[derive(Clone)]
pub enum Step {
    Page { html: String, status: u16, signal: BlockSignal },
    Fail(FetchError),
    Hang,
}

#[allow(dead_code)]
impl Step {
    pub fn ok(html: impl Into<String>) -> Self {
        Self::Page {
            html: html.into(),
            status: 200,
            signal: BlockSignal::None,
        }
    }

    pub fn blocked(signal: BlockSignal) -> Self {
        let status = if signal == BlockSignal::Http403 { 403 } else { 200 };
        Self::Page {
            html: "<html><head><title>Just a moment...</title></head></html>".into(),
            status,
            signal,
        }
    }
}

/// Strategy replaying a fixed script and counting calls
pub struct ScriptedStrategy {
    kind: StrategyKind,
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedStrategy {
    pub fn new(kind: StrategyKind, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FetchStrategy for ScriptedStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchOutcome, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .pop_front()
            .expect("strategy called more often than scripted");

        Box::pin(async move {
            match step {
                Step::Page {
                    html,
                    status,
                    signal,
                } => Ok(FetchOutcome::new(
                    RawPage {
                        html,
                        status_code: status,
                        final_url: request.url.to_string(),
                    },
                    signal,
                )),
                Step::Fail(error) => Err(error),
                Step::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        })
    }
}

/// Polls an interstitial that never goes away, like a page whose challenge
/// script cannot pass
#[allow(dead_code)]
pub struct StuckSolver;

impl ChallengeSolver for StuckSolver {
    fn solve<'a>(
        &'a self,
        request: &'a FetchRequest,
        deadline: Instant,
    ) -> BoxFuture<'a, Result<Solved, FetchError>> {
        Box::pin(async move {
            tokio::time::sleep_until(deadline).await;
            Ok(Solved::StillChallenged(RawPage {
                html: "<html><head><title>Just a moment...</title></head></html>".into(),
                status_code: 403,
                final_url: request.url.to_string(),
            }))
        })
    }
}

