//! Algorithm-tagged archive checksums.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An artifact checksum as written in the package index (`"SHA-256:<hex>"`).
///
/// The index tags every digest with the algorithm that produced it. Both halves
/// are kept: the digest is what gets propagated downstream, the algorithm
/// decides whether the optional verification step can check it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Checksum {
    algorithm: String,
    digest: String,
}

impl Checksum {
    /// Parse an `"<algorithm>:<hexdigest>"` string.
    ///
    /// A string without a colon is kept whole as the digest with an empty
    /// algorithm tag; an empty string yields an empty checksum.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.split_once(':') {
            Some((algorithm, digest)) => Self {
                algorithm: algorithm.to_string(),
                digest: digest.to_lowercase(),
            },
            None => Self {
                algorithm: String::new(),
                digest: s.to_lowercase(),
            },
        }
    }

    /// The algorithm tag exactly as it appeared in the index (e.g. `SHA-256`).
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The lowercase hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// True when the index carried no digest at all.
    pub fn is_empty(&self) -> bool {
        self.digest.is_empty()
    }

    /// True when the algorithm tag names SHA-256 (`SHA-256`, `sha256`, ...).
    pub fn is_sha256(&self) -> bool {
        let normalized: String = self
            .algorithm
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        normalized.eq_ignore_ascii_case("sha256")
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.algorithm.is_empty() {
            write!(f, "{}", self.digest)
        } else {
            write!(f, "{}:{}", self.algorithm, self.digest)
        }
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.as_deref().map(Self::parse).unwrap_or_default())
    }
}
