use kodegen_tools_mediascrape::normalize_media_url;
use proptest::prelude::*;
use url::Url;

fn origin() -> Url {
    Url::parse("https://site").expect("valid origin")
}

#[test]
fn test_proxied_preview_becomes_full_size() {
    assert_eq!(
        normalize_media_url(
            "https://site/proxy/i.cdn.net/c/250x250_80_a2/img-master/foo_square1200.jpg",
            &origin()
        )
        .as_deref(),
        Some("https://i.cdn.net/img-master/foo_master1200.jpg")
    );
}

#[test]
fn test_canonical_url_unchanged() {
    let canonical = "https://i.cdn.net/img-master/foo_master1200.jpg";
    assert_eq!(
        normalize_media_url(canonical, &origin()).as_deref(),
        Some(canonical)
    );
}

#[test]
fn test_relative_and_protocol_relative_resolve() {
    assert_eq!(
        normalize_media_url("/img/a.jpg", &origin()).as_deref(),
        Some("https://site/img/a.jpg")
    );
    assert_eq!(
        normalize_media_url("//cdn.site/a.jpg", &origin()).as_deref(),
        Some("https://cdn.site/a.jpg")
    );
    assert_eq!(
        normalize_media_url("img/a.jpg", &origin()).as_deref(),
        Some("https://site/img/a.jpg")
    );
}

#[test]
fn test_non_http_inputs_rejected() {
    for raw in ["", "   ", "data:image/gif;base64,R0lGOD", "javascript:alert(1)", "ftp://x.net/a.jpg"] {
        assert_eq!(normalize_media_url(raw, &origin()), None, "{raw}");
    }
}

fn media_url() -> impl Strategy<Value = String> {
    let base = prop_oneof![
        Just(String::new()),
        Just("https://site".to_string()),
        Just("https://mirror.example".to_string()),
    ];
    let proxy = prop_oneof![
        Just(String::new()),
        Just("/proxy/i.cdn.net".to_string()),
        Just("/proxy/a.example/proxy/i.cdn.net".to_string()),
    ];
    let size = prop_oneof![
        Just(String::new()),
        Just("/c/250x250_80_a2".to_string()),
        Just("/c/600x1200_90_webp".to_string()),
        Just("/c/1x1/c/48x48".to_string()),
    ];
    let dirs = proptest::collection::vec("[a-z0-9-]{1,8}", 0..3);
    let stem = "[a-z0-9]{1,10}";
    let suffix = prop_oneof![
        Just(""),
        Just("_square1200"),
        Just("_custom1200"),
        Just("_master1200"),
        Just("_p0"),
    ];
    let ext = prop_oneof![Just(".jpg"), Just(".png"), Just(".webp")];
    let query = prop_oneof![Just(""), Just("?v=2"), Just("?w=1&h=2")];

    (base, proxy, size, dirs, stem, suffix, ext, query).prop_map(
        |(base, proxy, size, dirs, stem, suffix, ext, query)| {
            let mut path = String::new();
            for dir in dirs {
                path.push('/');
                path.push_str(&dir);
            }
            format!("{base}{proxy}{size}{path}/{stem}{suffix}{ext}{query}")
        },
    )
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(raw in media_url()) {
        let origin = origin();
        if let Some(once) = normalize_media_url(&raw, &origin) {
            let twice = normalize_media_url(&once, &origin);
            prop_assert_eq!(twice.as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn prop_normalized_urls_are_absolute_http(raw in media_url()) {
        if let Some(url) = normalize_media_url(&raw, &origin()) {
            let parsed = Url::parse(&url).expect("normalized URL parses");
            prop_assert!(matches!(parsed.scheme(), "http" | "https"));
            prop_assert!(!parsed.path().contains("/proxy/i.cdn.net"));
            prop_assert!(!parsed.path().contains("/c/250x250"));
        }
    }
}
