//! Shared visual constants.

use crossterm::style::Color;

/// Status icons for artifact rows.
#[derive(Debug, Clone, Copy)]
pub struct Icons {
    /// In progress (●)
    pub active: &'static str,
    /// Installed (✓)
    pub success: &'static str,
    /// Failed (✗)
    pub error: &'static str,
    /// Skipped or warning (⚠)
    pub warning: &'static str,
    /// Informational (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Colors for artifact rows.
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub name: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            name: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Icons and colors used by the console reporter.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub icons: Icons,
    pub colors: Colors,
    /// Width of the name column.
    pub name_width: usize,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            icons: Icons::default(),
            colors: Colors::default(),
            name_width: 22,
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}
