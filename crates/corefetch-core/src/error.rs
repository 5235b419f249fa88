//! Run-level error types.

use thiserror::Error;

use crate::io::download::FetchError;
use crate::io::extract::UnpackError;
use crate::io::index::IndexError;
use crate::plan::{ArtifactKind, PlanError};

#[derive(Error, Debug)]
/// Failure while acquiring a single artifact.
pub enum AcquireError {
    /// Clearing or creating the destination directory failed.
    #[error("failed to prepare destination")]
    Prepare(#[source] std::io::Error),

    /// Download or checksum verification failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Extraction failed.
    #[error(transparent)]
    Unpack(#[from] UnpackError),

    /// Collapsing the wrapper directory failed.
    #[error("failed to normalize layout")]
    Normalize(#[source] std::io::Error),

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
/// Failure of a provisioning run. Every variant aborts the run.
pub enum ProvisionError {
    /// The index could not be loaded.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The index could not be planned.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A core or tool could not be acquired.
    #[error("failed to install {kind} {name} {version}")]
    Acquire {
        /// Core or tool.
        kind: ArtifactKind,
        /// Artifact name.
        name: String,
        /// Artifact version.
        version: String,
        /// What went wrong.
        #[source]
        source: AcquireError,
    },
}
