//! Check command

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use xenv_core::{Registry, RegistrySource};

/// Resolve every library of every target and report the result.
pub fn check(registry: &Registry, source: &RegistrySource) -> Result<()> {
    let count = xenv_core::check(registry)
        .with_context(|| format!("Registry check failed for {source}"))?;
    println!(
        "{} {count} target{} in {source}",
        "ok".green().bold(),
        if count == 1 { "" } else { "s" }
    );
    Ok(())
}
