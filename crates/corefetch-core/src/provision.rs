//! Drive a plan through fetch, unpack, and normalize.
//!
//! Everything runs strictly in sequence: one core, then each of its tools,
//! then the next core. Archive work is blocking and runs on
//! `spawn_blocking`, awaited before the next artifact starts. The first
//! failure aborts the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use reqwest::Client;
use serde::Serialize;

use crate::Reporter;
use crate::config::ProvisionConfig;
use crate::error::{AcquireError, ProvisionError};
use crate::io::download::{DownloadRequest, verify_checksum};
use crate::io::extract::unpack;
use crate::io::index::load_index;
use crate::io::normalize::flatten_single_wrapper;
use crate::plan::{Artifact, ArtifactKind, ProvisionPlan, build_plan};

/// An artifact that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledArtifact {
    /// Core or tool.
    pub kind: ArtifactKind,
    /// Artifact name.
    pub name: String,
    /// Artifact version.
    pub version: String,
    /// Install directory.
    pub destination: PathBuf,
    /// Archive size in bytes.
    pub size: u64,
    /// SHA-256 of the downloaded archive.
    pub sha256: String,
    /// True if a wrapper directory was collapsed.
    pub flattened: bool,
}

/// Outcome of [`Provisioner::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// Installed artifacts in acquisition order.
    pub installed: Vec<InstalledArtifact>,
    /// Tools skipped for lack of a host variant.
    pub skipped: usize,
}

impl ProvisionReport {
    /// Number of cores installed.
    pub fn cores(&self) -> usize {
        self.count(ArtifactKind::Core)
    }

    /// Number of tools installed.
    pub fn tools(&self) -> usize {
        self.count(ArtifactKind::Tool)
    }

    /// Total bytes downloaded.
    pub fn bytes(&self) -> u64 {
        self.installed.iter().map(|a| a.size).sum()
    }

    fn count(&self, kind: ArtifactKind) -> usize {
        self.installed.iter().filter(|a| a.kind == kind).count()
    }
}

/// Runs the provisioning pipeline for one configuration.
pub struct Provisioner<'a, R: Reporter> {
    config: &'a ProvisionConfig,
    client: Client,
    reporter: &'a R,
}

impl<R: Reporter> std::fmt::Debug for Provisioner<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Reporter> Provisioner<'a, R> {
    /// Create a provisioner. The client is reused for the index and every artifact.
    pub fn new(config: &'a ProvisionConfig, client: Client, reporter: &'a R) -> Self {
        Self {
            config,
            client,
            reporter,
        }
    }

    /// Load the index and build the plan without downloading any artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Index`] if the index cannot be loaded and
    /// [`ProvisionError::Plan`] if a dependency is missing.
    pub async fn plan(&self) -> Result<ProvisionPlan, ProvisionError> {
        let index = load_index(&self.client, &self.config.index_url).await?;
        Ok(build_plan(&index, self.config)?)
    }

    /// Plan, then execute.
    ///
    /// # Errors
    ///
    /// See [`Provisioner::plan`] and [`Provisioner::execute`].
    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let plan = self.plan().await?;
        self.execute(&plan).await
    }

    /// Acquire every artifact in the plan.
    ///
    /// A tool shared by several cores is only acquired once per run.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Acquire`] naming the first artifact that
    /// could not be fetched, unpacked, or normalized.
    pub async fn execute(&self, plan: &ProvisionPlan) -> Result<ProvisionReport, ProvisionError> {
        let start = Instant::now();
        let mut report = ProvisionReport::default();
        let mut acquired_tools: HashSet<&Path> = HashSet::new();

        for core in &plan.cores {
            self.reporter
                .section(&format!("{} {}", core.core.key, core.core.version()));

            report.installed.push(self.acquire(&core.artifact).await?);

            for tool in &core.tools {
                if !acquired_tools.insert(&tool.artifact.destination) {
                    tracing::debug!(
                        tool = %tool.resolved.reference,
                        "Already acquired in this run"
                    );
                    self.reporter.info(&format!(
                        "{} {} already installed in this run",
                        tool.artifact.name, tool.artifact.version
                    ));
                    continue;
                }
                report.installed.push(self.acquire(&tool.artifact).await?);
            }

            for skipped in &core.skipped {
                self.reporter.warning(&format!(
                    "{} has no artifact for {}, skipped",
                    skipped.reference, plan.target_host
                ));
                report.skipped += 1;
            }
        }

        self.reporter.summary(
            report.installed.len(),
            "installed",
            start.elapsed().as_secs_f64(),
        );
        tracing::info!(
            cores = report.cores(),
            tools = report.tools(),
            skipped = report.skipped,
            bytes = report.bytes(),
            "Provisioning complete"
        );
        Ok(report)
    }

    async fn acquire(&self, artifact: &Artifact) -> Result<InstalledArtifact, ProvisionError> {
        match self.try_acquire(artifact).await {
            Ok(installed) => {
                self.reporter.done(
                    &artifact.name,
                    &artifact.version,
                    &artifact.destination.display().to_string(),
                    Some(installed.size),
                );
                Ok(installed)
            }
            Err(source) => {
                self.reporter
                    .failed(&artifact.name, &artifact.version, &error_chain(&source));
                Err(ProvisionError::Acquire {
                    kind: artifact.kind,
                    name: artifact.name.clone(),
                    version: artifact.version.clone(),
                    source,
                })
            }
        }
    }

    async fn try_acquire(&self, artifact: &Artifact) -> Result<InstalledArtifact, AcquireError> {
        let dest = &artifact.destination;
        tracing::info!(kind = %artifact.kind, name = %artifact.name, version = %artifact.version, "Acquiring");

        if tokio::fs::try_exists(dest).await.map_err(AcquireError::Prepare)? {
            tokio::fs::remove_dir_all(dest)
                .await
                .map_err(AcquireError::Prepare)?;
        }
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(AcquireError::Prepare)?;

        let fetched = DownloadRequest::new(
            &self.client,
            &artifact.name,
            &artifact.version,
            &artifact.url,
            &artifact.archive,
            self.reporter,
        )
        .execute()
        .await?;

        if self.config.verify_checksums {
            verify_checksum(&fetched, &artifact.checksum).await?;
        }

        self.reporter.extracting(&artifact.name, &artifact.version);
        let archive = fetched.path.clone();
        let flattened = tokio::task::spawn_blocking(move || -> Result<bool, AcquireError> {
            let unpacked = unpack(&archive)?;
            flatten_single_wrapper(&unpacked.root, &unpacked.top_level).map_err(AcquireError::Normalize)
        })
        .await??;

        Ok(InstalledArtifact {
            kind: artifact.kind,
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            destination: dest.clone(),
            size: fetched.size,
            sha256: fetched.sha256,
            flattened,
        })
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
