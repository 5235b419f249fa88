//! The package index document.
//!
//! Parsing is permissive: unknown fields are ignored and any
//! missing field falls back to its zero value, so an index published by a
//! newer producer still loads.

use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Root of the package index: every package, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageIndex {
    /// Packages in the order they appear in the document.
    pub packages: Vec<Package>,
}

impl PackageIndex {
    /// Parse an index from its JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the document is not
    /// structurally well-formed.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Every platform in the index paired with the package that publishes it.
    pub fn platforms(&self) -> impl Iterator<Item = (&Package, &CoreDescriptor)> {
        self.packages
            .iter()
            .flat_map(|p| p.platforms.iter().map(move |c| (p, c)))
    }

    /// Every tool in the index paired with the package that publishes it.
    pub fn tools(&self) -> impl Iterator<Item = (&Package, &ToolDescriptor)> {
        self.packages
            .iter()
            .flat_map(|p| p.tools.iter().map(move |t| (p, t)))
    }
}

/// One maintainer's entry in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    /// Maintainer id, used as the first half of core keys (e.g. `arduino`).
    pub name: String,
    /// Human-readable maintainer name. Display only.
    pub maintainer: String,
    /// Cores (hardware platforms) published by this maintainer.
    pub platforms: Vec<CoreDescriptor>,
    /// Tools published by this maintainer.
    pub tools: Vec<ToolDescriptor>,
}

/// A versioned hardware core archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreDescriptor {
    /// Architecture id, the second half of the core key (e.g. `avr`).
    pub architecture: String,
    /// Version string. Compared as an opaque string unless semantic ordering is requested.
    pub version: String,
    /// Download URL of the core archive.
    pub url: String,
    /// File name the archive is stored under.
    pub archive_file_name: String,
    /// Checksum of the archive.
    pub checksum: Checksum,
    /// Tools this core needs to build.
    #[serde(rename = "toolsDependencies")]
    pub dependencies: Vec<ToolRef>,
}

impl CoreDescriptor {
    /// File name to download the archive to: `archiveFileName`, or the last URL segment.
    pub fn file_name(&self) -> &str {
        archive_name(&self.archive_file_name, &self.url)
    }
}

/// A reference from a core to a tool in some package's tool list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRef {
    /// Maintainer id of the package publishing the tool.
    pub packager: String,
    /// Tool name.
    pub name: String,
    /// Exact tool version.
    pub version: String,
}

impl ToolRef {
    /// Catalog key this reference resolves through.
    pub fn key(&self) -> ToolKey {
        ToolKey::new(&self.packager, &self.name, &self.version)
    }
}

impl std::fmt::Display for ToolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.packager, self.name, self.version)
    }
}

/// A build tool, published once per host variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDescriptor {
    /// Tool name (e.g. `avr-gcc`).
    pub name: String,
    /// Tool version.
    pub version: String,
    /// One entry per host the tool is built for.
    pub systems: Vec<ToolSystem>,
}

/// One host-specific artifact of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSystem {
    /// Host triple this artifact runs on (e.g. `x86_64-linux-gnu`).
    pub host: String,
    /// Download URL.
    pub url: String,
    /// File name the archive is stored under.
    pub archive_file_name: String,
    /// Checksum of the archive.
    pub checksum: Checksum,
}

impl ToolSystem {
    /// File name to download the archive to: `archiveFileName`, or the last URL segment.
    pub fn file_name(&self) -> &str {
        archive_name(&self.archive_file_name, &self.url)
    }
}

fn archive_name<'a>(declared: &'a str, url: &'a str) -> &'a str {
    if declared.is_empty() {
        filename_from_url(url)
    } else {
        declared
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// Key identifying a selected core: `maintainer:architecture`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreKey(String);

impl CoreKey {
    /// Build the key for a maintainer and architecture.
    pub fn new(maintainer: &str, architecture: &str) -> Self {
        Self(format!("{maintainer}:{architecture}"))
    }

    /// Return the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key identifying a tool in the catalog: `packager:name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolKey(String);

impl ToolKey {
    /// Build the key for a packager, tool name and version.
    pub fn new(packager: &str, name: &str, version: &str) -> Self {
        Self(format!("{packager}:{name}:{version}"))
    }

    /// Return the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "packages": [{
            "name": "arduino",
            "maintainer": "Arduino",
            "websiteURL": "http://www.arduino.cc/",
            "platforms": [{
                "name": "Arduino AVR Boards",
                "architecture": "avr",
                "version": "1.6.0",
                "url": "http://x/avr-1.6.0.tar.bz2",
                "archiveFileName": "avr-1.6.0.tar.bz2",
                "checksum": "SHA-256:0a1b",
                "size": "12345",
                "toolsDependencies": [
                    {"packager": "arduino", "name": "avr-gcc", "version": "4.9"}
                ]
            }],
            "tools": [{
                "name": "avr-gcc",
                "version": "4.9",
                "systems": [{
                    "host": "x86_64-linux-gnu",
                    "url": "http://x/avr-gcc-4.9-linux64.tar.gz",
                    "archiveFileName": "avr-gcc-4.9-linux64.tar.gz",
                    "checksum": "SHA-256:ffee",
                    "size": "1"
                }]
            }]
        }]
    }"#;

    #[test]
    fn parses_index_and_ignores_unknown_fields() {
        let index = PackageIndex::from_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(index.packages.len(), 1);

        let pkg = &index.packages[0];
        assert_eq!(pkg.name, "arduino");
        assert_eq!(pkg.maintainer, "Arduino");

        let core = &pkg.platforms[0];
        assert_eq!(core.architecture, "avr");
        assert_eq!(core.archive_file_name, "avr-1.6.0.tar.bz2");
        assert_eq!(core.checksum.digest(), "0a1b");
        assert_eq!(core.dependencies[0].key().as_str(), "arduino:avr-gcc:4.9");

        let system = &pkg.tools[0].systems[0];
        assert_eq!(system.host, "x86_64-linux-gnu");
        assert_eq!(system.checksum.algorithm(), "SHA-256");
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let index = PackageIndex::from_json(
            br#"{"packages":[{"name":"bare","platforms":[{"architecture":"sam","version":"1.0"}],"tools":[{"name":"t"}]}]}"#,
        )
        .unwrap();
        let core = &index.packages[0].platforms[0];
        assert!(core.url.is_empty());
        assert!(core.checksum.is_empty());
        assert!(core.dependencies.is_empty());
        assert!(index.packages[0].tools[0].systems.is_empty());
    }

    #[test]
    fn empty_document_is_an_empty_index() {
        let index = PackageIndex::from_json(b"{}").unwrap();
        assert!(index.packages.is_empty());
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(PackageIndex::from_json(b"{\"packages\": [").is_err());
        assert!(PackageIndex::from_json(b"{\"packages\": 3}").is_err());
    }

    #[test]
    fn file_name_falls_back_to_url() {
        let system = ToolSystem {
            url: "http://downloads.example.com/tools/bossac-1.6.1-linux64.tar.gz".into(),
            ..ToolSystem::default()
        };
        assert_eq!(system.file_name(), "bossac-1.6.1-linux64.tar.gz");
    }

    #[test]
    fn iterators_pair_entries_with_their_package() {
        let index = PackageIndex::from_json(SAMPLE.as_bytes()).unwrap();
        let (pkg, core) = index.platforms().next().unwrap();
        assert_eq!(pkg.name, "arduino");
        assert_eq!(core.version, "1.6.0");
        assert_eq!(index.tools().count(), 1);
    }
}
