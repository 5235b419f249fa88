//! Host-triple classification.
//!
//! Tool artifacts are published per host triple, and indexes are not
//! consistent about spelling them (`x86_64-linux-gnu`, `x86_64-pc-linux-gnu`,
//! `i386-apple-darwin11`, ...). Every triple is sorted into one of five
//! canonical buckets.
//!
//! Known triples are looked up in [`KNOWN_HOSTS`] first. Anything else falls
//! back to Jaro similarity against the bucket's canonical triple, except for
//! darwin, which matches on the `apple-darwin` substring.
//!
//! # Example
//!
//! ```
//! use corefetch_schema::HostBucket;
//!
//! assert_eq!(HostBucket::classify("x86_64-pc-linux-gnu"), Some(HostBucket::LinuxX86_64));
//! assert_eq!(HostBucket::classify("i386-apple-darwin11"), Some(HostBucket::Darwin));
//! assert_eq!(HostBucket::classify("riscv64-unknown-elf"), None);
//! ```

/// Similarity a host must exceed to fall into a bucket by fuzzy match.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

/// Canonical host buckets, in classification priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum HostBucket {
    /// 64-bit x86 Linux.
    #[serde(rename = "linux-x86_64")]
    LinuxX86_64,
    /// 32-bit x86 Linux.
    #[serde(rename = "linux-i686")]
    LinuxI686,
    /// 32-bit ARM hard-float Linux.
    #[serde(rename = "linux-arm")]
    LinuxArm,
    /// macOS, any architecture.
    #[serde(rename = "darwin")]
    Darwin,
    /// 32-bit Windows (mingw).
    #[serde(rename = "windows-i686")]
    WindowsI686,
}

/// Exact host triples seen in published indexes and the bucket each belongs to.
///
/// A `None` entry marks a triple that is known and deliberately unbucketed, so
/// it never reaches the similarity fallback.
pub const KNOWN_HOSTS: &[(&str, Option<HostBucket>)] = &[
    ("x86_64-linux-gnu", Some(HostBucket::LinuxX86_64)),
    ("x86_64-pc-linux-gnu", Some(HostBucket::LinuxX86_64)),
    ("i686-linux-gnu", Some(HostBucket::LinuxI686)),
    ("i686-pc-linux-gnu", Some(HostBucket::LinuxI686)),
    ("arm-linux-gnueabihf", Some(HostBucket::LinuxArm)),
    ("armhf-pc-linux-gnu", Some(HostBucket::LinuxArm)),
    ("i386-apple-darwin11", Some(HostBucket::Darwin)),
    ("x86_64-apple-darwin", Some(HostBucket::Darwin)),
    ("x86_64-apple-darwin12", Some(HostBucket::Darwin)),
    ("arm64-apple-darwin", Some(HostBucket::Darwin)),
    ("i686-mingw32", Some(HostBucket::WindowsI686)),
    ("i686-w64-mingw32", Some(HostBucket::WindowsI686)),
    ("aarch64-linux-gnu", None),
    ("aarch64-pc-linux-gnu", None),
    ("x86_64-mingw32", None),
];

impl HostBucket {
    /// All buckets, in the order classification tries them.
    pub const ALL: [Self; 5] = [
        Self::LinuxX86_64,
        Self::LinuxI686,
        Self::LinuxArm,
        Self::Darwin,
        Self::WindowsI686,
    ];

    /// Bucket name (`linux-x86_64`, `darwin`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "linux-x86_64",
            Self::LinuxI686 => "linux-i686",
            Self::LinuxArm => "linux-arm",
            Self::Darwin => "darwin",
            Self::WindowsI686 => "windows-i686",
        }
    }

    /// The triple fuzzy matching compares against. For darwin this is the
    /// substring that has to be present.
    pub fn canonical_triple(self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "x86_64-linux-gnu",
            Self::LinuxI686 => "i686-linux-gnu",
            Self::LinuxArm => "arm-linux-gnueabihf",
            Self::Darwin => "apple-darwin",
            Self::WindowsI686 => "i686-mingw32",
        }
    }

    /// Classify a host triple, or `None` if it belongs to no bucket.
    pub fn classify(host: &str) -> Option<Self> {
        if let Some((_, bucket)) = KNOWN_HOSTS.iter().find(|(known, _)| *known == host) {
            return *bucket;
        }
        Self::ALL.into_iter().find(|b| b.fuzzy_matches(host))
    }

    fn fuzzy_matches(self, host: &str) -> bool {
        match self {
            Self::Darwin => host.contains(self.canonical_triple()),
            _ => similarity(host, self.canonical_triple()) > SIMILARITY_THRESHOLD,
        }
    }
}

/// Normalized string similarity in `[0, 1]` used by the fallback match.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro(a, b)
}

/// True if an artifact built for `host` can be used on `target`.
///
/// Exact equality always matches; otherwise both triples have to land in the
/// same bucket.
pub fn host_matches(host: &str, target: &str) -> bool {
    if host == target {
        return true;
    }
    match (HostBucket::classify(host), HostBucket::classify(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// The index host triple for a Rust `target_os`/`target_arch` pair.
pub fn host_triple_for(os: &str, arch: &str) -> Option<&'static str> {
    match (os, arch) {
        ("linux", "x86_64") => Some("x86_64-linux-gnu"),
        ("linux", "x86") => Some("i686-linux-gnu"),
        ("linux", "arm") => Some("arm-linux-gnueabihf"),
        ("linux", "aarch64") => Some("aarch64-linux-gnu"),
        ("macos", _) => Some("x86_64-apple-darwin"),
        ("windows", _) => Some("i686-mingw32"),
        _ => None,
    }
}

/// The index host triple of the running platform, if it has one.
pub fn current_host_triple() -> Option<&'static str> {
    host_triple_for(std::env::consts::OS, std::env::consts::ARCH)
}

impl std::fmt::Display for HostBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
