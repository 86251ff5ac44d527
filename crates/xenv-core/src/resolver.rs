use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;
use xenv_schema::{LibraryName, Multiarch, QualifiedPackage, TargetTriple};

use crate::registry::Registry;

/// Why a resolution failed. Every kind is a configuration error: nothing is
/// retried and no partial result is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The requested triple is not in the registry.
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(TargetTriple),

    /// A requested library has no mapping for the target.
    #[error("Unresolved dependency '{0}': no package mapping for this target")]
    UnresolvedDependency(LibraryName),

    /// Two declarations set the same variable to different values.
    #[error("Conflicting override for {name}: '{first}' vs '{second}'")]
    ConflictingOverride {
        /// The variable name.
        name: String,
        /// The value declared first.
        first: String,
        /// The value that disagreed with it.
        second: String,
    },
}

/// The outcome of resolving one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved target.
    pub target: TargetTriple,
    /// Architecture the package manager must enable before installing.
    pub multiarch: Multiarch,
    /// Packages to install, sorted by rendered name.
    pub packages: Vec<QualifiedPackage>,
    /// Variables to export into the build process.
    pub environment: BTreeMap<String, String>,
}

/// Resolve the packages and environment a target needs for `dependencies`.
///
/// Dependencies are treated as a set: duplicates collapse and declaration
/// order does not affect the result. The install list is sorted by the
/// rendered `name:qualifier` string. Calling this twice with the same input
/// yields identical output.
///
/// # Errors
///
/// - [`ResolveError::UnsupportedTarget`] if `target` is not in `registry`
///   (checked first, even for an empty dependency set).
/// - [`ResolveError::UnresolvedDependency`] naming the first unmapped
///   library in sorted order.
/// - [`ResolveError::ConflictingOverride`] if two overrides disagree.
pub fn resolve(
    target: &TargetTriple,
    dependencies: &[LibraryName],
    registry: &Registry,
) -> Result<Resolution, ResolveError> {
    let entry = registry
        .target(target)
        .ok_or_else(|| ResolveError::UnsupportedTarget(target.clone()))?;

    let requested: BTreeSet<&LibraryName> = dependencies.iter().collect();
    if requested.is_empty() {
        tracing::debug!("No dependencies requested for {target}");
        return Ok(Resolution {
            target: target.clone(),
            multiarch: entry.multiarch().clone(),
            packages: Vec::new(),
            environment: BTreeMap::new(),
        });
    }

    tracing::debug!("Resolving {} dependencies for {target}", requested.len());

    // Look everything up before producing output so a partial failure
    // returns nothing.
    let mut mappings = Vec::with_capacity(requested.len());
    for library in requested {
        let mapping = entry
            .mapping(library)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ResolveError::UnresolvedDependency(library.clone()))?;
        mappings.push(mapping);
    }

    let mut packages = BTreeSet::new();
    for mapping in &mappings {
        tracing::debug!("  {} -> {} package(s)", mapping.library(), mapping.packages().len());
        packages.extend(
            mapping
                .packages()
                .iter()
                .map(|p| QualifiedPackage::foreign(p.clone(), entry.multiarch())),
        );
        packages.extend(mapping.host_packages().iter().cloned().map(QualifiedPackage::host));
    }

    let overrides = entry
        .overrides()
        .iter()
        .chain(mappings.iter().flat_map(|m| m.overrides()))
        .map(|o| (o.name(), o.value()));
    let environment = merge_environment(BTreeMap::new(), overrides)?;

    Ok(Resolution {
        target: target.clone(),
        multiarch: entry.multiarch().clone(),
        packages: packages.into_iter().collect(),
        environment,
    })
}

/// Validate every target in the registry by resolving all of its libraries
/// together. Returns the number of targets checked.
///
/// # Errors
///
/// Returns the first [`ResolveError`] encountered, in target order.
pub fn check(registry: &Registry) -> Result<usize, ResolveError> {
    for entry in registry.targets() {
        let libraries: Vec<LibraryName> = entry.mappings().map(|m| m.library().clone()).collect();
        if libraries.is_empty() {
            let overrides = entry.overrides().iter().map(|o| (o.name(), o.value()));
            merge_environment(BTreeMap::new(), overrides)?;
        } else {
            resolve(entry.triple(), &libraries, registry)?;
        }
        tracing::debug!("{} ok ({} libraries)", entry.triple(), libraries.len());
    }
    Ok(registry.len())
}

/// Fold `(name, value)` pairs into `environment`, collapsing exact repeats.
pub(crate) fn merge_environment<'a>(
    mut environment: BTreeMap<String, String>,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<BTreeMap<String, String>, ResolveError> {
    for (name, value) in pairs {
        match environment.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
            }
            Entry::Occupied(existing) if existing.get() == value => {
                tracing::debug!("Override {name} declared twice with the same value");
            }
            Entry::Occupied(existing) => {
                return Err(ResolveError::ConflictingOverride {
                    name: name.to_string(),
                    first: existing.get().clone(),
                    second: value.to_string(),
                });
            }
        }
    }
    Ok(environment)
}
