//! Turn a loaded index into a provisioning plan.
//!
//! Planning is pure: it selects cores, resolves every dependency, and lays
//! out destinations. Nothing is downloaded, so a missing dependency anywhere
//! in the index is reported before the first byte hits the disk.

use std::path::PathBuf;

use corefetch_schema::{Checksum, PackageIndex};
use serde::Serialize;
use thiserror::Error;

use crate::config::ProvisionConfig;
use crate::resolver::{MissingDependencyError, ResolvedTool, SkippedTool, ToolCatalog, resolve_tools};
use crate::select::{SelectedCore, select_cores};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while building a plan.
pub enum PlanError {
    /// A core depends on a tool the index does not publish.
    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),

    /// An index field would produce an unsafe path component.
    #[error("refusing to use {field} {value:?} as a path component")]
    UnsafeName {
        /// Which field carried the value.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

/// What an artifact is installed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A hardware core.
    Core,
    /// A build tool.
    Tool,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// One archive to fetch, unpack, and normalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Core or tool.
    pub kind: ArtifactKind,
    /// Display name (`maintainer:architecture` for cores, tool name for tools).
    pub name: String,
    /// Version being installed.
    pub version: String,
    /// Download URL.
    pub url: String,
    /// Checksum published in the index.
    pub checksum: Checksum,
    /// Directory the artifact is installed into.
    pub destination: PathBuf,
    /// Where the archive is downloaded before unpacking.
    pub archive: PathBuf,
}

/// A resolved tool and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTool {
    /// Resolution result.
    pub resolved: ResolvedTool,
    /// Download and install target.
    pub artifact: Artifact,
}

/// Everything needed to provision one core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorePlan {
    /// The selected core.
    pub core: SelectedCore,
    /// Download and install target of the core archive.
    pub artifact: Artifact,
    /// Tools to acquire, in dependency order.
    pub tools: Vec<PlannedTool>,
    /// Tools with no variant for the target host.
    pub skipped: Vec<SkippedTool>,
}

/// The full set of work for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionPlan {
    /// Host triple tools were resolved for.
    pub target_host: String,
    /// Cores in index order.
    pub cores: Vec<CorePlan>,
}

impl ProvisionPlan {
    /// True if no core passed the filter.
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    /// Number of resolved tools across all cores.
    pub fn tool_count(&self) -> usize {
        self.cores.iter().map(|c| c.tools.len()).sum()
    }

    /// Number of skipped tools across all cores.
    pub fn skipped_count(&self) -> usize {
        self.cores.iter().map(|c| c.skipped.len()).sum()
    }
}

/// Reject values that would not stay a single path component.
fn path_component<'a>(field: &'static str, value: &'a str) -> Result<&'a str, PlanError> {
    let unsafe_name = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if unsafe_name {
        return Err(PlanError::UnsafeName {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn plan_core(core: &SelectedCore, config: &ProvisionConfig) -> Result<Artifact, PlanError> {
    let maintainer = path_component("maintainer", &core.maintainer)?;
    let architecture = path_component("architecture", core.architecture())?;
    let file_name = path_component("archive file name", core.descriptor.file_name())?;
    let destination = config.core_dir(maintainer, architecture);

    Ok(Artifact {
        kind: ArtifactKind::Core,
        name: core.key.to_string(),
        version: core.version().to_string(),
        url: core.descriptor.url.clone(),
        checksum: core.descriptor.checksum.clone(),
        archive: destination.join(file_name),
        destination,
    })
}

fn plan_tool(resolved: ResolvedTool, config: &ProvisionConfig) -> Result<PlannedTool, PlanError> {
    let name = path_component("tool name", &resolved.descriptor.name)?;
    let version = path_component("tool version", &resolved.descriptor.version)?;
    let file_name = path_component("archive file name", resolved.system.file_name())?;
    let destination = config.tool_dir(name, version);

    let artifact = Artifact {
        kind: ArtifactKind::Tool,
        name: name.to_string(),
        version: version.to_string(),
        url: resolved.system.url.clone(),
        checksum: resolved.system.checksum.clone(),
        archive: destination.join(file_name),
        destination,
    };
    Ok(PlannedTool { resolved, artifact })
}

/// Select cores, apply the configured filter, and resolve every dependency.
///
/// # Errors
///
/// Returns [`PlanError::MissingDependency`] if any wanted core references a
/// tool the index does not publish, and [`PlanError::UnsafeName`] if an index
/// field cannot be used as a directory or file name.
pub fn build_plan(index: &PackageIndex, config: &ProvisionConfig) -> Result<ProvisionPlan, PlanError> {
    let selected = select_cores(index, config.version_ordering);
    let catalog = ToolCatalog::from_index(index);
    tracing::debug!(cores = selected.len(), tools = catalog.len(), "Planning");

    let mut cores = Vec::new();
    for core in &selected {
        if !config.wants(&core.maintainer, core.architecture()) {
            tracing::trace!(core = %core.key, "Filtered out");
            continue;
        }

        let resolution = resolve_tools(core, &catalog, &config.target_host)?;
        let artifact = plan_core(core, config)?;
        let tools = resolution
            .tools
            .into_iter()
            .map(|t| plan_tool(t, config))
            .collect::<Result<Vec<_>, _>>()?;

        cores.push(CorePlan {
            core: core.clone(),
            artifact,
            tools,
            skipped: resolution.skipped,
        });
    }

    Ok(ProvisionPlan {
        target_host: config.target_host.clone(),
        cores,
    })
}
