//! pixiv artwork search through the litexiv mirror

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderValue};
use url::Url;

use super::SourceProfile;
use crate::extraction::{ExtractionSchema, Field, FieldSpec};
use crate::fetch::StrategyKind;

pub const NAME: &str = "pixiv";
pub const ORIGIN: &str = "https://litexiv.qunn.link";

/// The mirror localizes titles; ask for English first
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// `https://litexiv.qunn.link/tags/<encoded query>?p=<page>`
pub fn search_url(origin: &Url, query: &str, page: u32) -> Result<Url> {
    let mut url = origin
        .join(&format!("/tags/{}", urlencoding::encode(query)))
        .context("Failed to build pixiv tag URL")?;
    url.query_pairs_mut().append_pair("p", &page.to_string());
    Ok(url)
}

pub fn profile() -> Result<SourceProfile> {
    let origin = Url::parse(ORIGIN).context("Invalid pixiv mirror origin")?;

    let schema = ExtractionSchema::builder(NAME, origin.clone(), ".grid.show-author > div")
        .field(Field::Title, FieldSpec::text("a.title b"))
        .field(Field::Title, FieldSpec::attr("a.title", "title"))
        .field(Field::MediaUrl, FieldSpec::attr("a.thumbnail img", "src"))
        .field(Field::Thumbnail, FieldSpec::attr("a.thumbnail img", "src"))
        .field(Field::Author, FieldSpec::text("a.author .username"))
        .field(Field::AuthorAvatar, FieldSpec::attr("a.author img.avatar", "src"))
        .field(Field::Link, FieldSpec::attr("a.thumbnail", "href"))
        .default_title("Untitled")
        .default_author("Unknown Artist")
        .id_pattern(r"/artworks/(\d+)")
        .build()?;

    // The mirror serves plain HTML and never presents a JS challenge.
    Ok(SourceProfile::new(
        NAME,
        origin,
        schema,
        vec![StrategyKind::DirectHttp, StrategyKind::HeadlessBrowser],
        search_url,
    )
    .with_header(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE)))
}
