//! Citation artifacts produced for successfully resolved DOIs.
//!
//! The metadata mirrors the minimal DataCite document a data citation carries:
//! identifier, creators, title, publisher, publication year and resource type.

use crate::doi::Doi;
use serde::{Deserialize, Serialize};

/// Base URL used when rendering the resolvable link of a citation.
pub const DOI_LINK_BASE: &str = "https://doi.org/";

/// A single creator of the cited resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Given name(s), if known.
    pub given: Option<String>,
    /// Family name, or the full literal name for organisations.
    pub family: String,
}

impl Creator {
    /// Create a personal creator.
    #[must_use]
    pub fn person(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            given: Some(given.into()),
            family: family.into(),
        }
    }

    /// Create a creator known only by a literal name.
    #[must_use]
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            given: None,
            family: name.into(),
        }
    }

    /// Display name in `Family, Given` form.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.given.as_deref().map(str::trim) {
            Some(given) if !given.is_empty() => format!("{}, {given}", self.family.trim()),
            _ => self.family.trim().to_string(),
        }
    }
}

/// Descriptive metadata returned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetadata {
    /// Title of the resource.
    pub title: Option<String>,
    /// Ordered creator list.
    pub creators: Vec<Creator>,
    /// Publishing organisation.
    pub publisher: Option<String>,
    /// Year of publication.
    pub publication_year: Option<i32>,
    /// Resource type (e.g. `dataset`).
    pub resource_type: Option<String>,
    /// Landing page URL, if the registry provides one.
    pub url: Option<String>,
}

/// The payload of a SUCCEEDED citation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationArtifact {
    /// Normalized identifier that was resolved.
    pub doi: Doi,
    /// Registry metadata.
    pub metadata: CitationMetadata,
    /// Rendered one-line citation. Never empty.
    pub formatted: String,
}

impl CitationArtifact {
    /// Build an artifact and render its citation text.
    #[must_use]
    pub fn new(doi: Doi, metadata: CitationMetadata) -> Self {
        let formatted = format_citation(&doi, &metadata);
        Self {
            doi,
            metadata,
            formatted,
        }
    }
}

/// Render `Creators (Year). Title. Publisher. https://doi.org/<doi>`.
///
/// Absent parts are skipped; the link is always present.
#[must_use]
pub fn format_citation(doi: &Doi, metadata: &CitationMetadata) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    let creators = metadata
        .creators
        .iter()
        .map(Creator::display_name)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    match (creators.is_empty(), metadata.publication_year) {
        (false, Some(year)) => parts.push(format!("{creators} ({year})")),
        (false, None) => parts.push(creators),
        (true, Some(year)) => parts.push(format!("({year})")),
        (true, None) => {}
    }

    for field in [&metadata.title, &metadata.publisher] {
        if let Some(value) = field.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            parts.push(value.trim_end_matches('.').to_string());
        }
    }

    parts.push(format!("{DOI_LINK_BASE}{doi}"));
    parts.join(". ")
}
