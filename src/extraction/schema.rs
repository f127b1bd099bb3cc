//! Declarative per-source extraction schemas

use anyhow::{Context, Result};
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Output fields a schema can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    /// Required: a candidate without it is dropped
    MediaUrl,
    Thumbnail,
    Author,
    AuthorAvatar,
    Link,
    /// Text like `1920x1080`
    Dimensions,
}

/// Which part of the matched element supplies the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text,
    Attr(String),
}

/// One way to read a field; a field may list several, tried in order
#[derive(Debug, Clone)]
pub struct FieldSource {
    /// Relative to the root element; `None` reads the root element itself
    selector: Option<Selector>,
    value: FieldValue,
}

impl FieldSource {
    pub(crate) fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub(crate) fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Uncompiled field source, as written in a source profile
#[derive(Debug, Clone)]
pub struct FieldSpec {
    css: Option<String>,
    value: FieldValue,
}

impl FieldSpec {
    /// Text content of the first element matching `css`
    pub fn text(css: impl Into<String>) -> Self {
        Self {
            css: Some(css.into()),
            value: FieldValue::Text,
        }
    }

    /// Attribute `name` of the first element matching `css`
    pub fn attr(css: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            css: Some(css.into()),
            value: FieldValue::Attr(name.into()),
        }
    }

    /// Attribute `name` of the root element itself
    pub fn own_attr(name: impl Into<String>) -> Self {
        Self {
            css: None,
            value: FieldValue::Attr(name.into()),
        }
    }

    fn compile(self) -> Result<FieldSource> {
        let selector = self.css.as_deref().map(compile_selector).transpose()?;
        Ok(FieldSource {
            selector,
            value: self.value,
        })
    }
}

/// Compiled, immutable mapping from a repeating root selector to record fields
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    source: String,
    origin: Url,
    root_css: String,
    root: Selector,
    fields: Vec<(Field, Vec<FieldSource>)>,
    default_title: String,
    default_author: Option<String>,
    id_pattern: Option<Regex>,
}

impl ExtractionSchema {
    #[must_use]
    pub fn builder(
        source: impl Into<String>,
        origin: Url,
        root: impl Into<String>,
    ) -> ExtractionSchemaBuilder {
        ExtractionSchemaBuilder {
            source: source.into(),
            origin,
            root: root.into(),
            fields: Vec::new(),
            default_title: String::new(),
            default_author: None,
            id_pattern: None,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Relative URLs in the document resolve against this
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    #[must_use]
    pub fn root(&self) -> &Selector {
        &self.root
    }

    /// Root selector text; its presence marks a rendered content page
    #[must_use]
    pub fn root_css(&self) -> &str {
        &self.root_css
    }

    pub(crate) fn sources_for(&self, field: Field) -> &[FieldSource] {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, sources)| sources.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn default_title(&self) -> &str {
        &self.default_title
    }

    pub(crate) fn default_author(&self) -> Option<&str> {
        self.default_author.as_deref()
    }

    pub(crate) fn id_pattern(&self) -> Option<&Regex> {
        self.id_pattern.as_ref()
    }
}

pub struct ExtractionSchemaBuilder {
    source: String,
    origin: Url,
    root: String,
    fields: Vec<(Field, Vec<FieldSpec>)>,
    default_title: String,
    default_author: Option<String>,
    id_pattern: Option<String>,
}

impl ExtractionSchemaBuilder {
    /// Add a fallback source for `field`; earlier sources win
    #[must_use]
    pub fn field(mut self, field: Field, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some((_, specs)) => specs.push(spec),
            None => self.fields.push((field, vec![spec])),
        }
        self
    }

    #[must_use]
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    #[must_use]
    pub fn default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }

    /// Regex whose first capture group, matched against the record link
    /// (or media URL), becomes the record id
    #[must_use]
    pub fn id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.id_pattern = Some(pattern.into());
        self
    }

    /// Compile every selector and pattern
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid selector or regex, or if no
    /// media URL source was declared.
    pub fn build(self) -> Result<ExtractionSchema> {
        if !self.fields.iter().any(|(f, _)| *f == Field::MediaUrl) {
            anyhow::bail!("Schema for '{}' declares no media URL field", self.source);
        }

        let root = compile_selector(&self.root)?;
        let fields = self
            .fields
            .into_iter()
            .map(|(field, specs)| {
                let sources = specs
                    .into_iter()
                    .map(FieldSpec::compile)
                    .collect::<Result<Vec<_>>>()?;
                Ok((field, sources))
            })
            .collect::<Result<Vec<_>>>()?;
        let id_pattern = self
            .id_pattern
            .as_deref()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid id pattern '{p}'")))
            .transpose()?;

        Ok(ExtractionSchema {
            source: self.source,
            origin: self.origin,
            root_css: self.root,
            root,
            fields,
            default_title: self.default_title,
            default_author: self.default_author,
            id_pattern,
        })
    }
}

fn compile_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector '{css}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.com").expect("valid url")
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = ExtractionSchema::builder("t", origin(), "div[")
            .field(Field::MediaUrl, FieldSpec::attr("img", "src"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_media_url_field_required() {
        let result = ExtractionSchema::builder("t", origin(), "div")
            .field(Field::Title, FieldSpec::text("h2"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_fallbacks_kept_in_order() {
        let schema = ExtractionSchema::builder("t", origin(), "div")
            .field(Field::MediaUrl, FieldSpec::attr("img", "src"))
            .field(Field::MediaUrl, FieldSpec::attr("img", "data-src"))
            .build()
            .expect("valid schema");
        let sources = schema.sources_for(Field::MediaUrl);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].value(), &FieldValue::Attr("data-src".into()));
        assert!(schema.sources_for(Field::Author).is_empty());
    }
}
