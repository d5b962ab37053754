//! DOI syntax validation.
//!
//! Structural checks only. Whether a DOI is actually registered is the
//! resolver's concern; keeping the two apart lets the processor fail malformed
//! input synchronously without scheduling any resolution work.
//!
//! # Accepted shape
//!
//! ```text
//! 10.<registrant>[.<sub>...]/<suffix>
//! ```
//!
//! Common presentation prefixes (`doi:`, `https://doi.org/`, ...) are stripped
//! before the checks run.
//!
//! # Example
//!
//! ```
//! use data_citation_core::doi::{validate, InvalidDoi, ValidationResult};
//!
//! assert!(validate("10.11570/18.0001").is_valid());
//! assert_eq!(
//!     validate("99.9999"),
//!     ValidationResult::Invalid(InvalidDoi::MissingSeparator),
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Directory indicator every DOI prefix starts with.
pub const DIRECTORY_INDICATOR: &str = "10";

/// Minimum number of digits in the first registrant group.
const MIN_REGISTRANT_DIGITS: usize = 4;

/// Presentation forms stripped before validation.
const PRESENTATION_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "DOI:",
];

/// Characters never allowed anywhere in an identifier.
const DISALLOWED: [char; 9] = ['"', '<', '>', '\\', '^', '`', '{', '|', '}'];

/// Why a candidate identifier failed structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum InvalidDoi {
    /// Nothing left after trimming and prefix stripping.
    #[error("DOI is empty")]
    Empty,

    /// No `/` between prefix and suffix.
    #[error("DOI has no prefix/suffix separator")]
    MissingSeparator,

    /// Prefix does not start with the `10` directory indicator.
    #[error("DOI prefix is not in the 10. directory")]
    UnknownDirectory,

    /// Registrant code is not a dot-separated run of digit groups.
    #[error("DOI registrant code is invalid")]
    InvalidRegistrant,

    /// Nothing after the separator.
    #[error("DOI suffix is empty")]
    EmptySuffix,

    /// Whitespace, control or reserved character found.
    #[error("DOI contains disallowed character {0:?}")]
    DisallowedCharacter(char),
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Structurally well-formed identifier.
    Valid(Doi),
    /// Structurally malformed identifier.
    Invalid(InvalidDoi),
}

impl ValidationResult {
    /// Returns `true` for [`ValidationResult::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`InvalidDoi`] reason for malformed input.
    pub fn into_result(self) -> Result<Doi, InvalidDoi> {
        match self {
            Self::Valid(doi) => Ok(doi),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

/// A structurally valid, normalized DOI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi {
    value: String,
    separator: usize,
}

impl Doi {
    /// Parse and validate a candidate identifier.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found.
    pub fn parse(candidate: &str) -> Result<Self, InvalidDoi> {
        validate(candidate).into_result()
    }

    /// Full normalized identifier, e.g. `10.11570/18.0001`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Prefix part, e.g. `10.11570`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.value[..self.separator]
    }

    /// Suffix part, e.g. `18.0001`.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.value[self.separator + 1..]
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for Doi {
    type Error = InvalidDoi;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.value
    }
}

/// Strip whitespace and presentation prefixes.
#[must_use]
pub fn normalize(candidate: &str) -> &str {
    let trimmed = candidate.trim();
    PRESENTATION_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
}

/// Validate the structure of a candidate DOI.
///
/// Fast, synchronous and side-effect free.
#[must_use]
pub fn validate(candidate: &str) -> ValidationResult {
    let normalized = normalize(candidate);
    match check(normalized) {
        Ok(separator) => ValidationResult::Valid(Doi {
            value: normalized.to_string(),
            separator,
        }),
        Err(reason) => ValidationResult::Invalid(reason),
    }
}

fn check(doi: &str) -> Result<usize, InvalidDoi> {
    if doi.is_empty() {
        return Err(InvalidDoi::Empty);
    }

    if let Some(bad) = doi
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || DISALLOWED.contains(c))
    {
        return Err(InvalidDoi::DisallowedCharacter(bad));
    }

    let separator = doi.find('/').ok_or(InvalidDoi::MissingSeparator)?;
    let (prefix, suffix) = (&doi[..separator], &doi[separator + 1..]);

    let mut groups = prefix.split('.');
    if groups.next() != Some(DIRECTORY_INDICATOR) {
        return Err(InvalidDoi::UnknownDirectory);
    }

    let registrant: Vec<&str> = groups.collect();
    let well_formed = registrant
        .first()
        .is_some_and(|first| first.len() >= MIN_REGISTRANT_DIGITS)
        && registrant
            .iter()
            .all(|group| !group.is_empty() && group.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(InvalidDoi::InvalidRegistrant);
    }

    if suffix.is_empty() {
        return Err(InvalidDoi::EmptySuffix);
    }

    Ok(separator)
}
