//! Media URL normalization
//!
//! Rewrites scraped media URLs into their canonical absolute, full-size form:
//! proxy path prefixes are unwrapped, preview-size path segments are replaced
//! with the full-size equivalents, and origin-relative paths are resolved.
//! Every rewrite is applied to a fixed point, so `normalize` is idempotent.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Path prefix used by image proxies: `/proxy/<host>/<path>`
const PROXY_PREFIX: &str = "/proxy/";

/// Crop/resize directory inserted by preview endpoints, e.g. `/c/250x250_80_a2/`
static PREVIEW_SIZE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/c/\d+x\d+(?:_[0-9A-Za-z]+)*/")
        .expect("BUG: hardcoded preview segment regex is invalid")
});

/// Square or custom-cropped preview suffix before the extension
static PREVIEW_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(?:square|custom)1200(\.[0-9A-Za-z]+)$")
        .expect("BUG: hardcoded preview suffix regex is invalid")
});

/// Normalize a raw media URL against the page origin
///
/// Returns `None` when the input cannot be turned into an absolute http(s)
/// URL (empty, `data:`/`javascript:` schemes, unparseable).
///
/// # Example
/// ```
/// use kodegen_tools_mediascrape::media_url::normalize;
/// use url::Url;
///
/// let origin = Url::parse("https://site").unwrap();
/// let url = normalize(
///     "https://site/proxy/i.cdn.net/c/250x250_80_a2/img-master/foo_square1200.jpg",
///     &origin,
/// );
/// assert_eq!(url.as_deref(), Some("https://i.cdn.net/img-master/foo_master1200.jpg"));
/// ```
#[must_use]
pub fn normalize(raw: &str, origin: &Url) -> Option<String> {
    let mut url = resolve_url(raw, origin)?;

    // Removing a size segment can expose a proxy prefix, so both rewrites
    // repeat until neither changes the URL.
    loop {
        while let Some(unwrapped) = strip_proxy_prefix(&url) {
            log::trace!("Unwrapped proxied media URL {} -> {}", url, unwrapped);
            url = unwrapped;
        }

        let path = canonical_size_path(url.path());
        if path == url.path() {
            break;
        }
        url.set_path(&path);
    }

    Some(url.to_string())
}

/// Resolve a possibly relative URL against the origin without size rewriting
///
/// Used for thumbnails, avatars and detail links, which are kept at the size
/// the page served them.
#[must_use]
pub fn resolve(raw: &str, origin: &Url) -> Option<String> {
    resolve_url(raw, origin).map(|url| url.to_string())
}

fn resolve_url(raw: &str, origin: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("data:")
        || lowered.starts_with("javascript:")
        || lowered.starts_with("blob:")
    {
        return None;
    }

    let parsed = if let Some(rest) = raw.strip_prefix("//") {
        Url::parse(&format!("https://{rest}")).ok()?
    } else {
        match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => origin.join(raw).ok()?,
            Err(e) => {
                log::debug!("Discarding unparseable media URL '{}': {}", raw, e);
                return None;
            }
        }
    };

    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

/// `https://proxy/proxy/<host>/<rest>` -> `https://<host>/<rest>`
fn strip_proxy_prefix(url: &Url) -> Option<Url> {
    let rest = url.path().strip_prefix(PROXY_PREFIX)?;
    let (host, remainder) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };

    // A bare `/proxy/foo` segment without a dotted host is an ordinary path.
    if !host.contains('.') {
        return None;
    }

    let mut target = Url::parse(&format!("https://{host}{remainder}")).ok()?;
    target.set_query(url.query());
    target.set_fragment(url.fragment());
    target.host_str().is_some().then_some(target)
}

fn canonical_size_path(path: &str) -> String {
    let mut path = path.to_string();

    while PREVIEW_SIZE_SEGMENT.is_match(&path) {
        path = PREVIEW_SIZE_SEGMENT.replace_all(&path, "/").into_owned();
    }

    PREVIEW_SUFFIX
        .replace(&path, "_master1200$1")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://litexiv.qunn.link").unwrap()
    }

    #[test]
    fn test_nested_proxy_prefixes_unwrap_fully() {
        let url = normalize(
            "https://a.example/proxy/b.example/proxy/i.cdn.net/img.jpg",
            &origin(),
        );
        assert_eq!(url.as_deref(), Some("https://i.cdn.net/img.jpg"));
    }

    #[test]
    fn test_proxy_segment_without_host_is_kept() {
        let url = normalize("https://site.example/proxy/thumbs/a.jpg", &origin());
        assert_eq!(url.as_deref(), Some("https://site.example/proxy/thumbs/a.jpg"));
    }

    #[test]
    fn test_repeated_size_segments_collapse() {
        assert_eq!(
            canonical_size_path("/c/1x1/c/250x250_80_a2/img-master/x_custom1200.png"),
            "/img-master/x_master1200.png"
        );
    }

    #[test]
    fn test_query_survives_proxy_unwrap() {
        let url = normalize("/proxy/i.cdn.net/a.jpg?v=2", &origin());
        assert_eq!(url.as_deref(), Some("https://i.cdn.net/a.jpg?v=2"));
    }

    #[test]
    fn test_size_segment_hiding_proxy_prefix() {
        let url = normalize("/c/1x1/proxy/i.cdn.net/a.jpg", &origin());
        assert_eq!(url.as_deref(), Some("https://i.cdn.net/a.jpg"));
    }
}
