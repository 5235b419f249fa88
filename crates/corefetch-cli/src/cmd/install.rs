//! Install command

use anyhow::{Context, Result};
use corefetch_core::{ProvisionConfig, Provisioner, Reporter};

use crate::cmd::plan::print_plan;
use crate::ui::ConsoleReporter;

/// Provision every selected core and its tools.
pub async fn install(config: &ProvisionConfig, client: reqwest::Client, dry_run: bool) -> Result<()> {
    let reporter = ConsoleReporter::new();
    let provisioner = Provisioner::new(config, client, &reporter);

    let plan = provisioner
        .plan()
        .await
        .context("Failed to plan provisioning")?;

    if dry_run {
        print_plan(&plan);
        return Ok(());
    }

    if plan.is_empty() {
        reporter.warning("No cores match the current filter, nothing to install");
        return Ok(());
    }

    tracing::debug!(
        cores = plan.cores.len(),
        tools = plan.tool_count(),
        core_root = %config.core_root.display(),
        tool_root = %config.tool_root.display(),
        "Installing"
    );

    provisioner
        .execute(&plan)
        .await
        .context("Provisioning failed")?;
    Ok(())
}
