//! Anti-automation challenge detection
//!
//! Recognizes interstitial challenge pages (Cloudflare "Just a moment...",
//! access-denied walls, human verification) from a DOM snapshot. Shared by the
//! headless tier, which flags `ChallengeDetected`, and the challenge solver,
//! which polls until the markers disappear.

use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Lowercased fragments of `<title>` text seen on challenge interstitials
const CHALLENGE_TITLES: &[&str] = &[
    "just a moment",
    "attention required",
    "access denied",
    "checking your browser",
    "verify you are human",
    "please wait",
];

const CHALLENGE_DOM_MARKERS: &[&str] = &[
    "#challenge-form",
    "#challenge-running",
    "#cf-challenge-running",
    ".cf-browser-verification",
    "iframe[src*='challenges.cloudflare.com']",
    "script[src*='/cdn-cgi/challenge-platform/']",
];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static DOM_MARKER_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CHALLENGE_DOM_MARKERS
        .iter()
        .map(|css| {
            Selector::parse(css).expect("BUG: hardcoded challenge marker selector is invalid")
        })
        .collect()
});

/// Whether a document title belongs to a challenge interstitial
#[must_use]
pub fn title_shows_challenge(title: &str) -> bool {
    let title = title.to_lowercase();
    CHALLENGE_TITLES.iter().any(|marker| title.contains(marker))
}

/// Whether an HTML snapshot carries any known challenge marker
#[must_use]
pub fn html_shows_challenge(html: &str) -> bool {
    let document = Html::parse_document(html);

    let title_hit = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect::<String>())
        .is_some_and(|title| title_shows_challenge(&title));

    title_hit
        || DOM_MARKER_SELECTORS
            .iter()
            .any(|selector| document.select(selector).next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloudflare_interstitial_detected() {
        let html = r#"<html><head><title>Just a moment...</title></head>
            <body><div id="challenge-running"></div></body></html>"#;
        assert!(html_shows_challenge(html));
    }

    #[test]
    fn test_challenge_script_detected_without_title() {
        let html = r#"<html><head><title>peakpx</title>
            <script src="/cdn-cgi/challenge-platform/h/b/orchestrate/jsch/v1"></script>
            </head><body></body></html>"#;
        assert!(html_shows_challenge(html));
    }

    #[test]
    fn test_ordinary_page_not_flagged() {
        let html = r#"<html><head><title>Wallpapers - peakpx</title></head>
            <body><ul id="list_ul"><li class="grid"></li></ul></body></html>"#;
        assert!(!html_shows_challenge(html));
    }
}
