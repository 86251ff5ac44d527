//! xenv - cross-target build environments CLI

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xenv_cli::cmd;
use xenv_cli::{Cli, Commands};
use xenv_core::RegistrySource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        cmd::completions::completions(shell);
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let source = RegistrySource::discover(cli.registry.as_deref(), &cwd);
    tracing::info!("Using {source}");
    let registry = source
        .load()
        .await
        .with_context(|| format!("Failed to load registry from {source}"))?;

    match cli.command {
        Commands::Resolve {
            targets,
            deps,
            format,
        } => cmd::resolve::resolve(registry, &targets, &deps, format.into()).await,
        Commands::Targets => {
            cmd::targets::targets(&registry);
            Ok(())
        }
        Commands::Check => cmd::check::check(&registry, &source),
        Commands::Completions { .. } => Ok(()),
    }
}
