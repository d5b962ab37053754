//! CSL-JSON as returned by DOI content negotiation.
//!
//! Only the fields a citation needs are modelled; everything else in the
//! registry response is ignored.

use data_citation_core::{CitationMetadata, Creator};
use serde::Deserialize;
use serde_json::Value;

/// A CSL-JSON item.
#[derive(Debug, Deserialize)]
pub(crate) struct CslItem {
    #[serde(default)]
    title: Option<TextOrList>,
    #[serde(default)]
    author: Vec<CslName>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    issued: Option<CslDate>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, rename = "URL")]
    url: Option<String>,
}

/// Some registries send `title` as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    fn into_first(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(list) => list.into_iter().next(),
        }
    }
}

/// A CSL name: personal (`family`/`given`) or organisational (`literal`).
#[derive(Debug, Deserialize)]
struct CslName {
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    literal: Option<String>,
}

impl CslName {
    fn into_creator(self) -> Option<Creator> {
        match (self.family, self.literal) {
            (Some(family), _) if !family.trim().is_empty() => Some(Creator {
                given: self.given,
                family,
            }),
            (_, Some(literal)) if !literal.trim().is_empty() => Some(Creator::literal(literal)),
            _ => None,
        }
    }
}

/// Date in `[[year, month, day]]` form; parts may be numbers or strings.
#[derive(Debug, Deserialize)]
struct CslDate {
    #[serde(default, rename = "date-parts")]
    date_parts: Vec<Vec<Value>>,
}

impl CslDate {
    fn year(&self) -> Option<i32> {
        let year = self.date_parts.first()?.first()?;
        match year {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl CslItem {
    /// Convert into the service's metadata shape.
    pub(crate) fn into_metadata(self) -> CitationMetadata {
        CitationMetadata {
            title: self.title.and_then(TextOrList::into_first),
            publication_year: self.issued.as_ref().and_then(CslDate::year),
            creators: self
                .author
                .into_iter()
                .filter_map(CslName::into_creator)
                .collect(),
            publisher: self.publisher,
            resource_type: self.kind,
            url: self.url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> CitationMetadata {
        serde_json::from_value::<CslItem>(value).unwrap().into_metadata()
    }

    #[test]
    fn test_full_item() {
        let metadata = parse(json!({
            "DOI": "10.11570/18.0001",
            "type": "dataset",
            "title": "Deep Survey Catalogue",
            "author": [
                {"family": "Smith", "given": "Jane"},
                {"literal": "CADC Team"}
            ],
            "publisher": "NRC Canada",
            "issued": {"date-parts": [[2018, 5, 1]]},
            "URL": "https://example.org/landing"
        }));

        assert_eq!(metadata.title.as_deref(), Some("Deep Survey Catalogue"));
        assert_eq!(
            metadata.creators,
            vec![Creator::person("Smith", "Jane"), Creator::literal("CADC Team")]
        );
        assert_eq!(metadata.publication_year, Some(2018));
        assert_eq!(metadata.resource_type.as_deref(), Some("dataset"));
        assert_eq!(metadata.url.as_deref(), Some("https://example.org/landing"));
    }

    #[test]
    fn test_lenient_shapes() {
        let metadata = parse(json!({
            "title": ["First", "Second"],
            "author": [{"given": "Nobody"}],
            "issued": {"date-parts": [["2020"]]}
        }));

        assert_eq!(metadata.title.as_deref(), Some("First"));
        assert!(metadata.creators.is_empty());
        assert_eq!(metadata.publication_year, Some(2020));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(parse(json!({})), CitationMetadata::default());
    }
}
