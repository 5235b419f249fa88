//! corefetch - embedded toolchain provisioner
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Reads an Arduino-style package index, keeps the newest version of every
//! hardware core, resolves each core's tool dependencies for the current
//! host, and installs everything into a flat directory layout.
//!
//! # Directory Layout
//!
//! ```text
//! $COREFETCH_HOME/
//! ├── cores/<maintainer>/<architecture>/   # Core contents, wrapper stripped
//! └── tools/<name>/<version>/              # Tool contents, wrapper stripped
//! ```

pub mod cmd;
pub mod paths;
pub mod settings;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default package index.
pub const DEFAULT_INDEX_URL: &str = "http://downloads.arduino.cc/packages/package_index.json";

#[derive(Debug, Parser)]
#[command(name = "corefetch")]
#[command(author, version, about = "corefetch - provision embedded cores and toolchains")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand. Unset values fall back to the
/// settings file, then to built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// URL or path of the package index
    #[arg(long, global = true, env = "COREFETCH_INDEX_URL")]
    pub index_url: Option<String>,

    /// Host triple to select tool artifacts for (default: this machine)
    #[arg(long, global = true, env = "COREFETCH_TARGET_HOST")]
    pub target_host: Option<String>,

    /// Directory cores are installed under
    #[arg(long, global = true, env = "COREFETCH_CORE_ROOT")]
    pub core_root: Option<PathBuf>,

    /// Directory tools are installed under
    #[arg(long, global = true, env = "COREFETCH_TOOL_ROOT")]
    pub tool_root: Option<PathBuf>,

    /// Only provision cores from this maintainer (e.g. arduino)
    #[arg(long, global = true, env = "COREFETCH_PACKAGER")]
    pub packager: Option<String>,

    /// Only provision cores for this architecture (e.g. avr)
    #[arg(long, global = true, env = "COREFETCH_CORE")]
    pub core: Option<String>,

    /// Verify SHA-256 checksums of downloaded archives
    #[arg(long, global = true, env = "COREFETCH_VERIFY_CHECKSUMS")]
    pub verify_checksums: bool,

    /// Compare core versions as semver instead of plain strings
    #[arg(long, global = true, env = "COREFETCH_SEMVER_ORDERING")]
    pub semver_ordering: bool,

    /// Settings file (TOML)
    #[arg(long, global = true, env = "COREFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show what would be installed without downloading anything
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download and install every selected core and its tools
    Install {
        /// Print the plan instead of installing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the host bucket each triple classifies into
    Host {
        /// Host triples (e.g. x86_64-linux-gnu)
        #[arg(required = true)]
        triples: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
