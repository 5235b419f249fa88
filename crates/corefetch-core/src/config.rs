//! Run configuration.
//!
//! A single [`ProvisionConfig`] is built once at process start and passed by
//! reference to every component. Nothing in this crate reads environment
//! variables or settings files; that is the binary's job.

use std::path::{Path, PathBuf};

use corefetch_schema::VersionOrdering;

/// Everything a provisioning run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Location of the package index: an `http(s)://` URL, a `file://` URL, or a path.
    pub index_url: String,
    /// Host triple tool artifacts are selected for (e.g. `x86_64-linux-gnu`).
    pub target_host: String,
    /// Cores land in `<core_root>/<maintainer>/<architecture>`.
    pub core_root: PathBuf,
    /// Tools land in `<tool_root>/<name>/<version>`.
    pub tool_root: PathBuf,
    /// Only provision cores published by this maintainer.
    pub packager: Option<String>,
    /// Only provision cores for this architecture.
    pub architecture: Option<String>,
    /// Compare downloaded bytes against the index checksum.
    pub verify_checksums: bool,
    /// How core versions are ranked when several share a key.
    pub version_ordering: VersionOrdering,
}

impl ProvisionConfig {
    /// Create a configuration with no core filter, checksum verification off
    /// and ordinal version ordering.
    pub fn new(
        index_url: impl Into<String>,
        target_host: impl Into<String>,
        core_root: impl Into<PathBuf>,
        tool_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            index_url: index_url.into(),
            target_host: target_host.into(),
            core_root: core_root.into(),
            tool_root: tool_root.into(),
            packager: None,
            architecture: None,
            verify_checksums: false,
            version_ordering: VersionOrdering::default(),
        }
    }

    /// Restrict the run to one maintainer and/or architecture.
    pub fn with_filter(mut self, packager: Option<String>, architecture: Option<String>) -> Self {
        self.packager = packager;
        self.architecture = architecture;
        self
    }

    /// Enable or disable checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Choose how core versions are compared.
    pub fn with_version_ordering(mut self, ordering: VersionOrdering) -> Self {
        self.version_ordering = ordering;
        self
    }

    /// True if the core published by `maintainer` for `architecture` passes the filter.
    pub fn wants(&self, maintainer: &str, architecture: &str) -> bool {
        self.packager.as_deref().is_none_or(|p| p == maintainer)
            && self.architecture.as_deref().is_none_or(|a| a == architecture)
    }

    /// Destination directory of a core.
    pub fn core_dir(&self, maintainer: &str, architecture: &str) -> PathBuf {
        self.core_root.join(maintainer).join(architecture)
    }

    /// Destination directory of a tool.
    pub fn tool_dir(&self, name: &str, version: &str) -> PathBuf {
        self.tool_root.join(name).join(version)
    }
}

pub(crate) fn is_local_location(location: &str) -> bool {
    let scheme = location.split_once("://").map(|(scheme, _)| scheme);
    !scheme.is_some_and(|s| s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
}

pub(crate) fn local_path(location: &str) -> &Path {
    const FILE_SCHEME: &str = "file://";
    match location.get(..FILE_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(FILE_SCHEME) => {
            Path::new(&location[FILE_SCHEME.len()..])
        }
        _ => Path::new(location),
    }
}
