//! peakpx wallpaper search

use anyhow::{Context, Result};
use url::Url;

use super::SourceProfile;
use crate::extraction::{ExtractionSchema, Field, FieldSpec};
use crate::fetch::StrategyKind;

pub const NAME: &str = "peakpx";
pub const ORIGIN: &str = "https://www.peakpx.com";

/// `https://www.peakpx.com/en/search?q=<query>&page=<page>`
pub fn search_url(origin: &Url, query: &str, page: u32) -> Result<Url> {
    let mut url = origin
        .join("/en/search")
        .context("Failed to build peakpx search URL")?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("page", &page.to_string());
    Ok(url)
}

pub fn profile() -> Result<SourceProfile> {
    let origin = Url::parse(ORIGIN).context("Invalid peakpx origin")?;

    let schema = ExtractionSchema::builder(NAME, origin.clone(), "#list_ul > li.grid")
        .field(Field::Title, FieldSpec::text("figure > .overflow.title"))
        .field(
            Field::MediaUrl,
            FieldSpec::attr(r#"figure > link[itemprop="contentUrl"]"#, "href"),
        )
        .field(Field::Thumbnail, FieldSpec::attr("figure img", "src"))
        .field(Field::Thumbnail, FieldSpec::attr("figure img", "data-src"))
        .field(Field::Link, FieldSpec::attr("figure a", "href"))
        .field(Field::Dimensions, FieldSpec::text("figure .res"))
        .build()?;

    Ok(SourceProfile::new(
        NAME,
        origin,
        schema,
        vec![
            StrategyKind::DirectHttp,
            StrategyKind::ChallengeBypass,
            StrategyKind::HeadlessBrowser,
        ],
        search_url,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::extract;

    #[test]
    fn test_search_url_encodes_query() {
        let origin = Url::parse(ORIGIN).expect("valid origin");
        let url = search_url(&origin, "night city", 2).expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://www.peakpx.com/en/search?q=night+city&page=2"
        );
    }

    #[test]
    fn test_listing_markup_extracts() {
        let html = r#"<html><body><ul id="list_ul">
            <li class="grid">
              <figure>
                <link itemprop="contentUrl" href="https://images.peakpx.com/a.jpg">
                <a href="/en/hd-wallpaper-desktop-abc"><img data-src="https://images.peakpx.com/a_thumb.jpg"></a>
                <div class="overflow title"> Neon   skyline </div>
                <span class="res">1920x1080</span>
              </figure>
            </li>
            <li class="grid"><figure><div class="overflow title">Ad slot</div></figure></li>
        </ul></body></html>"#;

        let profile = profile().expect("builtin profile compiles");
        let records = extract(html, profile.schema());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.title, "Neon skyline");
        assert_eq!(record.media_url, "https://images.peakpx.com/a.jpg");
        assert_eq!(
            record.thumbnail.as_deref(),
            Some("https://images.peakpx.com/a_thumb.jpg")
        );
        assert_eq!(
            record.link.as_deref(),
            Some("https://www.peakpx.com/en/hd-wallpaper-desktop-abc")
        );
        assert_eq!(record.dimensions.map(|d| (d.width, d.height)), Some((1920, 1080)));
    }
}
