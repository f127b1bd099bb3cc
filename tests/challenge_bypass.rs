mod common;

use common::StuckSolver;
use futures::future::BoxFuture;
use kodegen_tools_mediascrape::fetch::{build_http_client, default_headers};
use kodegen_tools_mediascrape::{
    BlockSignal, ChallengeBypass, ChallengeSolver, Clearance, FetchError, FetchRequest,
    FetchStrategy, ScrapeConfig, Solved, StrategyKind,
};
use mockito::Matcher;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Hands out a fixed clearance without a browser
struct FixedSolver {
    result: Result<Clearance, FetchError>,
    calls: AtomicUsize,
}

impl FixedSolver {
    fn new(result: Result<Clearance, FetchError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }
}

impl ChallengeSolver for FixedSolver {
    fn solve<'a>(
        &'a self,
        _request: &'a FetchRequest,
        _deadline: Instant,
    ) -> BoxFuture<'a, Result<Solved, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.clone().map(Solved::Cleared);
        Box::pin(async move { result })
    }
}

fn clearance() -> Clearance {
    Clearance {
        cookie_header: "cf_clearance=abc123; __cf_bm=xyz".to_string(),
        user_agent: "TestAgent/1.0".to_string(),
    }
}

fn request(url: String) -> FetchRequest {
    FetchRequest {
        url: Url::parse(&url).expect("valid url"),
        headers: default_headers(&ScrapeConfig::default()),
        content_marker: "#list_ul > li.grid".to_string(),
    }
}

fn bypass(solver: Arc<FixedSolver>) -> ChallengeBypass {
    let client = build_http_client().expect("client builds");
    ChallengeBypass::with_timeout(client, solver, Duration::from_secs(10))
}

#[tokio::test]
async fn test_replay_carries_clearance_cookie_and_agent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/en/search")
        .match_query(Matcher::Any)
        .match_header("cookie", "cf_clearance=abc123; __cf_bm=xyz")
        .match_header("user-agent", "TestAgent/1.0")
        .with_status(200)
        .with_body("<ul id=\"list_ul\"><li class=\"grid\"></li></ul>")
        .create_async()
        .await;

    let solver = FixedSolver::new(Ok(clearance()));
    let strategy = bypass(Arc::clone(&solver));
    assert_eq!(strategy.kind(), StrategyKind::ChallengeBypass);

    let outcome = strategy
        .fetch(&request(format!("{}/en/search?q=cats", server.url())))
        .await
        .expect("replay succeeds");

    mock.assert_async().await;
    assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.signal, BlockSignal::None);
    assert!(outcome.page.html.contains("list_ul"));
}

#[tokio::test]
async fn test_still_forbidden_after_solving_is_http403() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/en/search")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let outcome = bypass(FixedSolver::new(Ok(clearance())))
        .fetch(&request(format!("{}/en/search?q=cats", server.url())))
        .await
        .expect("403 is an outcome");

    assert_eq!(outcome.signal, BlockSignal::Http403);
}

#[tokio::test]
async fn test_solver_failure_propagates_without_replay() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let error = bypass(FixedSolver::new(Err(FetchError::Browser(
        "browser failed to launch".into(),
    ))))
    .fetch(&request(format!("{}/en/search?q=cats", server.url())))
    .await
    .expect_err("solver failure is terminal");

    mock.assert_async().await;
    assert!(matches!(error, FetchError::Browser(_)));
}

#[tokio::test]
async fn test_empty_clearance_still_replays_without_cookie() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/en/search")
        .match_query(Matcher::Any)
        .match_header("cookie", Matcher::Missing)
        .with_status(200)
        .with_body("<html></html>")
        .create_async()
        .await;

    let solver = FixedSolver::new(Ok(Clearance {
        cookie_header: String::new(),
        user_agent: "TestAgent/1.0".into(),
    }));
    let outcome = bypass(solver)
        .fetch(&request(format!("{}/en/search?q=cats", server.url())))
        .await
        .expect("replay succeeds");

    mock.assert_async().await;
    assert_eq!(outcome.signal, BlockSignal::None);
}

#[tokio::test(start_paused = true)]
async fn test_unsolved_challenge_reports_block_within_budget() {
    let budget = Duration::from_secs(60);
    let client = build_http_client().expect("client builds");
    let strategy = ChallengeBypass::with_timeout(client, Arc::new(StuckSolver), budget);
    let start = Instant::now();

    let outcome = strategy
        .fetch(&request("http://gallery.test/en/search?q=cats".to_string()))
        .await
        .expect("a standing challenge is an outcome, not a timeout");

    assert_eq!(outcome.signal, BlockSignal::ChallengeDetected);
    assert_eq!(outcome.page.status_code, 403);
    assert!(outcome.page.html.contains("Just a moment"));
    assert!(start.elapsed() < budget, "elapsed {:?}", start.elapsed());
}
