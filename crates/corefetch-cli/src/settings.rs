//! Settings file and flag resolution.
//!
//! Precedence, highest first: command-line flag, `COREFETCH_*` environment
//! variable (both handled by clap), settings file, built-in default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use corefetch_core::ProvisionConfig;
use corefetch_schema::{VersionOrdering, current_host_triple};
use serde::Deserialize;

use crate::{DEFAULT_INDEX_URL, GlobalArgs, paths};

/// Contents of a `config.toml`. Every key is optional.
///
/// ```toml
/// index_url = "https://downloads.arduino.cc/packages/package_index.json"
/// target_host = "x86_64-linux-gnu"
/// core_root = "/opt/arduino/hardware"
/// tool_root = "/opt/arduino/tools"
/// packager = "arduino"
/// core = "avr"
/// verify_checksums = true
/// version_ordering = "semantic"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub index_url: Option<String>,
    pub target_host: Option<String>,
    pub core_root: Option<PathBuf>,
    pub tool_root: Option<PathBuf>,
    pub packager: Option<String>,
    pub core: Option<String>,
    pub verify_checksums: Option<bool>,
    pub version_ordering: Option<VersionOrdering>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }
}

/// Build the run configuration from flags, the settings file, and defaults.
///
/// An explicit `--config` must exist; the default `$COREFETCH_HOME/config.toml`
/// is only read if present.
pub fn resolve(args: &GlobalArgs) -> Result<ProvisionConfig> {
    let home = paths::try_corefetch_home();

    let settings = match (&args.config, &home) {
        (Some(path), _) => Settings::load(path)?,
        (None, Some(home)) => {
            let path = paths::default_settings_path(home);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Loading settings");
                Settings::load(&path)?
            } else {
                Settings::default()
            }
        }
        (None, None) => Settings::default(),
    };

    merge(args, settings, home.as_deref())
}

/// Combine flags with settings. Flags win.
pub fn merge(args: &GlobalArgs, settings: Settings, home: Option<&Path>) -> Result<ProvisionConfig> {
    let index_url = args
        .index_url
        .clone()
        .or(settings.index_url)
        .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());

    let target_host = args
        .target_host
        .clone()
        .or(settings.target_host)
        .or_else(|| current_host_triple().map(String::from))
        .context("Cannot determine a host triple for this platform; pass --target-host")?;

    let core_root = args
        .core_root
        .clone()
        .or(settings.core_root)
        .or_else(|| home.map(paths::default_core_root))
        .context("Cannot determine a core root; set COREFETCH_HOME or pass --core-root")?;

    let tool_root = args
        .tool_root
        .clone()
        .or(settings.tool_root)
        .or_else(|| home.map(paths::default_tool_root))
        .context("Cannot determine a tool root; set COREFETCH_HOME or pass --tool-root")?;

    let ordering = if args.semver_ordering {
        VersionOrdering::Semantic
    } else {
        settings.version_ordering.unwrap_or_default()
    };

    Ok(ProvisionConfig::new(index_url, target_host, core_root, tool_root)
        .with_filter(
            args.packager.clone().or(settings.packager),
            args.core.clone().or(settings.core),
        )
        .with_checksum_verification(
            args.verify_checksums || settings.verify_checksums.unwrap_or(false),
        )
        .with_version_ordering(ordering))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_settings() {
        let settings = Settings::parse(
            r#"
            index_url = "file:///srv/index.json"
            target_host = "i686-mingw32"
            core_root = "/opt/hardware"
            packager = "arduino"
            core = "avr"
            verify_checksums = true
            version_ordering = "semantic"
            "#,
        )
        .unwrap();
        assert_eq!(settings.index_url.as_deref(), Some("file:///srv/index.json"));
        assert_eq!(settings.core_root, Some(PathBuf::from("/opt/hardware")));
        assert_eq!(settings.tool_root, None);
        assert_eq!(settings.verify_checksums, Some(true));
        assert_eq!(settings.version_ordering, Some(VersionOrdering::Semantic));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Settings::parse("index = \"x\"").is_err());
    }

    #[test]
    fn defaults_come_from_home() {
        let args = GlobalArgs {
            target_host: Some("x86_64-linux-gnu".into()),
            ..GlobalArgs::default()
        };
        let config = merge(&args, Settings::default(), Some(Path::new("/home/u/.corefetch"))).unwrap();

        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.core_root, PathBuf::from("/home/u/.corefetch/cores"));
        assert_eq!(config.tool_root, PathBuf::from("/home/u/.corefetch/tools"));
        assert_eq!(config.packager, None);
        assert!(!config.verify_checksums);
        assert_eq!(config.version_ordering, VersionOrdering::Ordinal);
    }

    #[test]
    fn flags_override_settings() {
        let args = GlobalArgs {
            index_url: Some("https://mirror/index.json".into()),
            target_host: Some("arm-linux-gnueabihf".into()),
            core: Some("sam".into()),
            semver_ordering: true,
            ..GlobalArgs::default()
        };
        let settings = Settings {
            index_url: Some("https://other/index.json".into()),
            target_host: Some("i686-mingw32".into()),
            core_root: Some("/settings/cores".into()),
            tool_root: Some("/settings/tools".into()),
            packager: Some("arduino".into()),
            core: Some("avr".into()),
            verify_checksums: Some(true),
            version_ordering: Some(VersionOrdering::Ordinal),
        };

        let config = merge(&args, settings, None).unwrap();
        assert_eq!(config.index_url, "https://mirror/index.json");
        assert_eq!(config.target_host, "arm-linux-gnueabihf");
        assert_eq!(config.core_root, PathBuf::from("/settings/cores"));
        assert_eq!(config.packager.as_deref(), Some("arduino"));
        assert_eq!(config.architecture.as_deref(), Some("sam"));
        assert!(config.verify_checksums);
        assert_eq!(config.version_ordering, VersionOrdering::Semantic);
    }

    #[test]
    fn missing_roots_without_home_is_an_error() {
        let args = GlobalArgs {
            target_host: Some("x86_64-linux-gnu".into()),
            ..GlobalArgs::default()
        };
        assert!(merge(&args, Settings::default(), None).is_err());
    }
}
