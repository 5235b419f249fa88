//! Terminal output: progress reporting and plan rendering.

pub mod progress;
pub mod reporter;
pub mod table;
pub mod theme;

pub use reporter::ConsoleReporter;
