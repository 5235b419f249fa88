//! corefetch - embedded toolchain provisioner CLI

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use corefetch_cli::{Cli, Commands, cmd, settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Host { triples } => {
            cmd::host::host(&triples);
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
        Commands::Plan { json } => {
            let config = settings::resolve(&cli.global)?;
            cmd::plan::plan(&config, http_client()?, json).await
        }
        Commands::Install { dry_run } => {
            let config = settings::resolve(&cli.global)?;
            cmd::install::install(&config, http_client()?, dry_run).await
        }
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(corefetch_core::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}
