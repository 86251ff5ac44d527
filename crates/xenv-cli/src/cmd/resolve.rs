//! Resolve command

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::task::JoinSet;
use xenv_core::{BuildPlan, Format, Registry, Resolution, ResolveError};
use xenv_schema::{LibraryName, TargetTriple};

/// Resolve `deps` for every requested target and print the combined plan.
pub async fn resolve(
    registry: Registry,
    targets: &[String],
    deps: &[String],
    format: Format,
) -> Result<()> {
    let plan = build_plan(registry, targets, deps).await?;
    let output = xenv_core::render(&plan, format).context("Failed to render plan")?;
    print!("{output}");
    Ok(())
}

/// Parse the request and resolve each target on the blocking pool.
///
/// Results are slotted back into request order, so the first error reported
/// is the first failing target as typed, not the first one to finish.
pub async fn build_plan(
    registry: Registry,
    targets: &[String],
    deps: &[String],
) -> Result<BuildPlan> {
    let triples = targets
        .iter()
        .map(|t| {
            t.parse::<TargetTriple>()
                .with_context(|| format!("Invalid target '{t}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if triples.len() > 1 && !registry.allows_multi_target() {
        bail!(
            "{} targets requested but the registry does not allow multi-target plans (set `multi_target = true` under [settings])",
            triples.len()
        );
    }

    let libraries: Arc<[LibraryName]> = deps
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| LibraryName::parse(d).with_context(|| format!("Invalid dependency '{d}'")))
        .collect::<Result<Vec<_>>>()?
        .into();

    let registry = Arc::new(registry);
    let mut set = JoinSet::new();
    for (idx, triple) in triples.iter().cloned().enumerate() {
        let registry = Arc::clone(&registry);
        let libraries = Arc::clone(&libraries);
        set.spawn_blocking(move || (idx, xenv_core::resolve(&triple, &libraries, &registry)));
    }

    let mut slots: Vec<Option<Result<Resolution, ResolveError>>> = vec![None; triples.len()];
    while let Some(joined) = set.join_next().await {
        let (idx, result) = joined.context("Resolver task failed")?;
        slots[idx] = Some(result);
    }

    let resolutions = slots
        .into_iter()
        .flatten()
        .collect::<Result<Vec<_>, _>>()?;

    for resolution in &resolutions {
        tracing::debug!(
            "{}: {} packages, {} variables",
            resolution.target,
            resolution.packages.len(),
            resolution.environment.len()
        );
    }

    Ok(BuildPlan::combine(resolutions)?)
}
