//! Resolution and acquisition pipeline for embedded toolchains.
//!
//! [`select`] reduces the package index to one core per
//! `maintainer:architecture`, [`resolver`] narrows each core's tool
//! dependencies to a host variant, [`plan`] lays out destinations, and
//! [`provision`] fetches, unpacks, and normalizes every artifact.

pub mod config;
pub mod error;
pub mod io;
pub mod plan;
pub mod provision;
pub mod reporter;
pub mod resolver;
pub mod select;

pub use config::ProvisionConfig;
pub use error::{AcquireError, ProvisionError};
pub use io::download::FetchError;
pub use io::extract::UnpackError;
pub use io::index::{IndexError, load_index};
pub use plan::{Artifact, ArtifactKind, CorePlan, PlanError, PlannedTool, ProvisionPlan, build_plan};
pub use provision::{InstalledArtifact, ProvisionReport, Provisioner};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{MissingDependencyError, ResolvedTool, SkippedTool, ToolCatalog, ToolRole, resolve_tools};
pub use select::{SelectedCore, SelectedCores, select_cores};

/// User Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("corefetch/", env!("CARGO_PKG_VERSION"));
