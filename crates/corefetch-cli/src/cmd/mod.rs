//! Command modules - one file per CLI command

pub mod completions;
pub mod host;
pub mod install;
pub mod plan;
