//! Host command

use crate::ui::table::host_table;

/// Print the bucket each host triple falls into.
pub fn host(triples: &[String]) {
    println!("{}", host_table(triples));
}
