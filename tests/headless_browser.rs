//! Tests against a real Chrome/Chromium; run with `cargo test -- --ignored`

mod common;

use anyhow::Result;
use common::gallery_profile;
use kodegen_tools_mediascrape::{
    BlockSignal, BrowserSessionManager, FetchRequest, FetchStrategy, HeadlessBrowser,
    ScrapeConfig, ScrapeError, Scraper, SourceRegistry, StrategyKind,
};
use mockito::Matcher;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn config() -> ScrapeConfig {
    ScrapeConfig::builder()
        .max_pages(2)
        .content_wait_timeout_secs(2)
        .build()
        .expect("valid config")
}

fn data_request(html: &str, marker: &str) -> Result<FetchRequest> {
    Ok(FetchRequest {
        url: Url::parse(&format!("data:text/html,{}", urlencoding::encode(html)))?,
        headers: HeaderMap::new(),
        content_marker: marker.to_string(),
    })
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn test_rendered_marker_found() -> Result<()> {
    let config = config();
    let sessions = BrowserSessionManager::new(config.clone());
    let strategy = HeadlessBrowser::new(Arc::clone(&sessions), &config);

    let outcome = strategy
        .fetch(&data_request(
            r#"<ul id="list_ul"><li class="grid">one</li></ul>"#,
            "#list_ul > li.grid",
        )?)
        .await?;

    assert_eq!(outcome.signal, BlockSignal::None);
    assert!(outcome.page.html.contains("list_ul"));
    assert_eq!(sessions.slots().open(), 0);

    sessions.close_all().await;
    Ok(())
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn test_missing_marker_and_challenge_classification() -> Result<()> {
    let config = config();
    let sessions = BrowserSessionManager::new(config.clone());
    let strategy = HeadlessBrowser::new(Arc::clone(&sessions), &config);

    let empty = strategy
        .fetch(&data_request("<p>No results</p>", "#list_ul > li.grid")?)
        .await?;
    assert_eq!(empty.signal, BlockSignal::MissingContentMarker);
    assert!(empty.page.html.contains("No results"));

    let challenge = strategy
        .fetch(&data_request(
            r#"<title>Just a moment...</title><div id="challenge-form"></div>"#,
            "#list_ul > li.grid",
        )?)
        .await?;
    assert_eq!(challenge.signal, BlockSignal::ChallengeDetected);

    assert_eq!(sessions.slots().open(), 0);
    assert!(sessions.slots().high_water() <= 2);

    sessions.close_all().await;
    assert!(!sessions.is_running().await);
    Ok(())
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn test_stealth_profile_applied() -> Result<()> {
    let sessions = BrowserSessionManager::new(config());
    let lease = sessions.acquire_page().await?;
    let page = lease.page();
    page.goto("data:text/html,<html><body></body></html>").await?;

    let webdriver = page.evaluate("navigator.webdriver === undefined").await?;
    assert!(webdriver.into_value::<bool>()?);

    let width = page.evaluate("screen.width").await?;
    assert_eq!(width.into_value::<u32>()?, 1920);

    let agent = page.evaluate("navigator.userAgent").await?;
    assert!(!agent.into_value::<String>()?.contains("Headless"));

    lease.release().await;
    assert_eq!(sessions.slots().open(), 0);
    sessions.close_all().await;
    Ok(())
}

/// Waits far longer for the marker than the tests let it run
fn patient_config() -> ScrapeConfig {
    ScrapeConfig::builder()
        .max_pages(2)
        .content_wait_timeout_secs(60)
        .pacing_interval_ms(0)
        .build()
        .expect("valid config")
}

fn assert_pool_drained(sessions: &BrowserSessionManager) {
    assert_eq!(sessions.slots().open(), 0);
    assert_eq!(sessions.slots().available(), sessions.slots().limit());
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn test_abandoned_fetch_returns_page_slot() -> Result<()> {
    let config = patient_config();
    let sessions = BrowserSessionManager::new(config.clone());
    let strategy = HeadlessBrowser::new(Arc::clone(&sessions), &config);

    let request = data_request("<p>Still loading</p>", "#list_ul > li.grid")?;
    let abandoned = tokio::time::timeout(Duration::from_secs(3), strategy.fetch(&request)).await;
    assert!(abandoned.is_err(), "fetch should still be waiting on the marker");
    assert_pool_drained(&sessions);

    let outcome = strategy
        .fetch(&data_request(
            r#"<ul id="list_ul"><li class="grid">one</li></ul>"#,
            "#list_ul > li.grid",
        )?)
        .await?;
    assert_eq!(outcome.signal, BlockSignal::None);
    assert_pool_drained(&sessions);

    sessions.close_all().await;
    Ok(())
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn test_cancelled_scrape_returns_page_slot() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html><body><p>Still loading</p></body></html>")
        .create_async()
        .await;

    let config = patient_config();
    let sessions = BrowserSessionManager::new(config.clone());
    let headless: Arc<dyn FetchStrategy> =
        Arc::new(HeadlessBrowser::new(Arc::clone(&sessions), &config));
    let registry = SourceRegistry::new([gallery_profile(
        &server.url(),
        vec![StrategyKind::HeadlessBrowser],
    )]);
    let scraper = Scraper::with_strategies(config, registry, [headless]);
    let request = scraper.request("gallery", "cats", None)?;

    let error = scraper
        .scrape_until(&request, tokio::time::sleep(Duration::from_secs(3)))
        .await
        .expect_err("cancelled while waiting on the marker");

    assert!(matches!(error, ScrapeError::Cancelled));
    assert_pool_drained(&sessions);

    sessions.close_all().await;
    Ok(())
}
