//! Version ordering used when several cores share a key.

use std::cmp::Ordering;

/// How two core version strings are compared when picking the newest.
///
/// `Ordinal` compares the raw strings byte by byte. It is the default because
/// existing consumers rely on it, even though it ranks `1.6.10` below `1.6.9`.
/// `Semantic` parses both sides as semver and falls back to ordinal comparison
/// when either side does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Plain string comparison.
    #[default]
    Ordinal,
    /// Semver-aware comparison.
    Semantic,
}

impl VersionOrdering {
    /// Compare two version strings.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Ordinal => a.cmp(b),
            Self::Semantic => match (semver::Version::parse(a), semver::Version::parse(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            },
        }
    }

    /// True if `candidate` ranks strictly above `current`.
    pub fn is_newer(self, candidate: &str, current: &str) -> bool {
        self.compare(candidate, current) == Ordering::Greater
    }
}
