//! Plan and host tables.

use comfy_table::presets::UTF8_HORIZONTAL_ONLY;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use corefetch_core::ProvisionPlan;
use corefetch_schema::{HostBucket, host::similarity};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::DarkGrey)));
    table
}

/// One row per core, resolved tool, and skipped tool, in acquisition order.
pub fn plan_table(plan: &ProvisionPlan) -> Table {
    let mut table = new_table(&["", "NAME", "VERSION", "ROLE", "HOST", "DESTINATION"]);

    for core in &plan.cores {
        table.add_row(vec![
            Cell::new("core"),
            Cell::new(core.core.key.as_str()).fg(Color::Cyan),
            Cell::new(core.core.version()),
            Cell::new(""),
            Cell::new(""),
            Cell::new(core.artifact.destination.display()),
        ]);
        for tool in &core.tools {
            let system = &tool.resolved.system;
            table.add_row(vec![
                Cell::new("tool"),
                Cell::new(&tool.artifact.name),
                Cell::new(&tool.artifact.version),
                Cell::new(tool.resolved.role),
                Cell::new(&system.host),
                Cell::new(tool.artifact.destination.display()),
            ]);
        }
        for skipped in &core.skipped {
            table.add_row(vec![
                Cell::new("skip").fg(Color::Yellow),
                Cell::new(&skipped.reference.name),
                Cell::new(&skipped.reference.version),
                Cell::new(skipped.role),
                Cell::new(format!("none for {}", plan.target_host)).fg(Color::Yellow),
                Cell::new(""),
            ]);
        }
    }

    table
}

/// The bucket each triple classifies into and its closest canonical triple.
pub fn host_table(triples: &[String]) -> Table {
    let mut table = new_table(&["HOST", "BUCKET", "CLOSEST", "SIMILARITY"]);

    for triple in triples {
        let (closest, score) = HostBucket::ALL
            .into_iter()
            .map(|b| (b, similarity(triple, b.canonical_triple())))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((HostBucket::LinuxX86_64, 0.0));

        let bucket = match HostBucket::classify(triple) {
            Some(bucket) => Cell::new(bucket).fg(Color::Green),
            None => Cell::new("unsupported").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(triple),
            bucket,
            Cell::new(closest.canonical_triple()),
            Cell::new(format!("{score:.3}")),
        ]);
    }

    table
}
