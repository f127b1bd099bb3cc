//! Extraction pipeline
//!
//! Turns a fetched HTML document into [`Record`]s using a source's
//! [`ExtractionSchema`]. Every root-selector match is one candidate, kept in
//! document order. A candidate whose media URL cannot be resolved is skipped
//! and logged; nothing about one malformed node affects its siblings.

mod record;
mod schema;

pub use record::{Dimensions, Record, SourceMeta};
pub use schema::{ExtractionSchema, ExtractionSchemaBuilder, Field, FieldSpec, FieldValue};

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

use crate::media_url;

static DIMENSIONS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*[x×X]\s*(\d+)").expect("BUG: hardcoded dimensions regex is invalid")
});

/// Extract every record the schema finds in `html`
#[must_use]
pub fn extract(html: &str, schema: &ExtractionSchema) -> Vec<Record> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, element) in document.select(schema.root()).enumerate() {
        match extract_record(element, schema) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                log::debug!(
                    "Skipping {} candidate #{index}: no resolvable media URL",
                    schema.source()
                );
            }
        }
    }

    log::debug!(
        "Extracted {} {} records ({} skipped)",
        records.len(),
        schema.source(),
        skipped
    );
    records
}

fn extract_record(element: ElementRef<'_>, schema: &ExtractionSchema) -> Option<Record> {
    let origin = schema.origin();

    let media_url = read_field(element, schema, Field::MediaUrl)
        .and_then(|raw| media_url::normalize(&raw, origin))?;

    let title = read_field(element, schema, Field::Title)
        .unwrap_or_else(|| schema.default_title().to_string());
    let author = read_field(element, schema, Field::Author)
        .or_else(|| schema.default_author().map(ToString::to_string));
    let thumbnail = read_url(element, schema, Field::Thumbnail);
    let author_avatar = read_url(element, schema, Field::AuthorAvatar);
    let link = read_url(element, schema, Field::Link);
    let dimensions =
        read_field(element, schema, Field::Dimensions).and_then(|text| parse_dimensions(&text));

    let id = schema.id_pattern().and_then(|pattern| {
        let haystack = link.as_deref().unwrap_or(&media_url);
        pattern
            .captures(haystack)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    });

    Some(Record {
        title,
        media_url,
        thumbnail,
        author,
        author_avatar,
        dimensions,
        link,
        id,
        source_meta: SourceMeta::new(schema.source()),
    })
}

/// First non-empty value among the field's sources
fn read_field(element: ElementRef<'_>, schema: &ExtractionSchema, field: Field) -> Option<String> {
    schema.sources_for(field).iter().find_map(|source| {
        let target = match source.selector() {
            Some(selector) => element.select(selector).next()?,
            None => element,
        };
        let value = match source.value() {
            FieldValue::Text => collapse_whitespace(&target.text().collect::<String>()),
            FieldValue::Attr(name) => target.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    })
}

/// Secondary URLs are only made absolute, never rewritten to full size
fn read_url(element: ElementRef<'_>, schema: &ExtractionSchema, field: Field) -> Option<String> {
    read_field(element, schema, field).and_then(|raw| media_url::resolve(&raw, schema.origin()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_dimensions(text: &str) -> Option<Dimensions> {
    let caps = DIMENSIONS_PATTERN.captures(text)?;
    Some(Dimensions {
        width: caps.get(1)?.as_str().parse().ok()?,
        height: caps.get(2)?.as_str().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(
            parse_dimensions(" 1920x1080 "),
            Some(Dimensions {
                width: 1920,
                height: 1080
            })
        );
        assert_eq!(
            parse_dimensions("3840 × 2160"),
            Some(Dimensions {
                width: 3840,
                height: 2160
            })
        );
        assert_eq!(parse_dimensions("HD"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
