//! Plan command

use anyhow::{Context, Result};
use corefetch_core::{NullReporter, ProvisionConfig, ProvisionPlan, Provisioner};

use crate::ui::table::plan_table;

/// Load the index and print what `install` would do.
pub async fn plan(config: &ProvisionConfig, client: reqwest::Client, json: bool) -> Result<()> {
    let plan = Provisioner::new(config, client, &NullReporter)
        .plan()
        .await
        .context("Failed to plan provisioning")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Print a plan as a table with a one-line summary.
pub fn print_plan(plan: &ProvisionPlan) {
    if plan.is_empty() {
        println!();
        println!("  No cores match the current filter.");
        return;
    }

    println!("{}", plan_table(plan));
    println!(
        "  {} cores, {} tools, {} skipped for {}",
        plan.cores.len(),
        plan.tool_count(),
        plan.skipped_count(),
        plan.target_host
    );
}
