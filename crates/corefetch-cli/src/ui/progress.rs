//! Download progress formatting.

use super::theme::format_size;

/// Width of the progress bar in characters.
pub const BAR_WIDTH: usize = 24;

/// Percentage complete, or `None` when the server sent no length.
pub fn percent(current: u64, total: Option<u64>) -> Option<u64> {
    match total {
        Some(total) if total > 0 => Some((current * 100 / total).min(100)),
        _ => None,
    }
}

/// A bar of ▓ (filled) and ░ (empty).
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total > 0 {
        (((current as f64 / total as f64) * width as f64).round() as usize).min(width)
    } else {
        0
    };
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}

/// Bar, percentage, and total size; just the byte count when the length is unknown.
pub fn format_download_progress(current: u64, total: Option<u64>) -> String {
    match (total, percent(current, total)) {
        (Some(total), Some(pct)) => {
            let bar = format_progress_bar(current, total, BAR_WIDTH);
            format!("{bar}  {pct:>3}%  {}", format_size(total))
        }
        _ => format!("{} received", format_size(current)),
    }
}
