//! Build plans.
//!
//! A [`BuildPlan`] is what the external collaborators consume: the set of
//! architectures to enable, the packages to install and the variables to
//! export. A plan usually holds one target; registries that set
//! `multi_target = true` may combine several independent resolutions into
//! one environment.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use xenv_schema::{QualifiedPackage, TargetTriple};

use crate::resolver::{Resolution, ResolveError, merge_environment};

/// Packages and environment for one build environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Targets this plan serves, in request order.
    pub targets: Vec<TargetTriple>,
    /// Multi-arch qualifiers to enable, sorted.
    pub architectures: Vec<String>,
    /// Packages to install, sorted by rendered name.
    pub packages: Vec<QualifiedPackage>,
    /// Variables to export.
    pub environment: BTreeMap<String, String>,
}

impl BuildPlan {
    /// Merge independent per-target resolutions into one plan.
    ///
    /// Packages shared between targets collapse. A repeated target is kept
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ConflictingOverride`] if two targets export the
    /// same variable with different values.
    pub fn combine(
        resolutions: impl IntoIterator<Item = Resolution>,
    ) -> Result<Self, ResolveError> {
        let mut targets = Vec::new();
        let mut architectures = BTreeSet::new();
        let mut packages = BTreeSet::new();
        let mut environment = BTreeMap::new();

        for resolution in resolutions {
            if targets.contains(&resolution.target) {
                continue;
            }
            architectures.insert(resolution.multiarch.qualifier().to_string());
            packages.extend(resolution.packages);
            environment = merge_environment(
                environment,
                resolution
                    .environment
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )?;
            targets.push(resolution.target);
        }

        Ok(Self {
            targets,
            architectures: architectures.into_iter().collect(),
            packages: packages.into_iter().collect(),
            environment,
        })
    }

    /// True if the plan installs nothing and exports nothing.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.environment.is_empty()
    }
}

impl From<Resolution> for BuildPlan {
    fn from(resolution: Resolution) -> Self {
        Self {
            targets: vec![resolution.target],
            architectures: vec![resolution.multiarch.qualifier().to_string()],
            packages: resolution.packages,
            environment: resolution.environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, TargetEntry};
    use crate::resolver::resolve;
    use xenv_schema::LibraryName;

    fn triple(s: &str) -> TargetTriple {
        s.parse().unwrap()
    }

    fn registry() -> Registry {
        let mut builder = Registry::builder().multi_target(true);
        for t in ["armv7-linux-gnueabihf", "aarch64-linux-gnu"] {
            let target = triple(t);
            let entry = TargetEntry::new(target.clone())
                .unwrap()
                .map_library("ssl", &["libssl-dev"])
                .unwrap()
                .set_env(
                    &format!("PKG_CONFIG_LIBDIR_{}", target.env_key()),
                    "/usr/lib/pkgconfig",
                )
                .unwrap()
                .set_env("PKG_CONFIG_ALLOW_CROSS", "1")
                .unwrap();
            builder = builder.target(entry);
        }
        builder.build().unwrap()
    }

    fn resolve_ssl(registry: &Registry, target: &str) -> Resolution {
        resolve(
            &triple(target),
            &[LibraryName::parse("ssl").unwrap()],
            registry,
        )
        .unwrap()
    }

    #[test]
    fn test_single_resolution_plan() {
        let registry = registry();
        let plan = BuildPlan::from(resolve_ssl(&registry, "armv7-linux-gnueabihf"));
        assert_eq!(plan.architectures, vec!["armhf"]);
        assert_eq!(plan.packages.len(), 1);
        assert_eq!(plan.environment.len(), 2);
    }

    #[test]
    fn test_combine_two_targets() {
        let registry = registry();
        let plan = BuildPlan::combine([
            resolve_ssl(&registry, "armv7-linux-gnueabihf"),
            resolve_ssl(&registry, "aarch64-linux-gnu"),
        ])
        .unwrap();

        assert_eq!(plan.architectures, vec!["arm64", "armhf"]);
        let packages: Vec<String> = plan.packages.iter().map(ToString::to_string).collect();
        assert_eq!(packages, vec!["libssl-dev:arm64", "libssl-dev:armhf"]);
        // Two per-target pkg-config paths plus one shared variable.
        assert_eq!(plan.environment.len(), 3);
        assert_eq!(plan.targets.len(), 2);
    }

    #[test]
    fn test_combine_conflict_across_targets() {
        let registry = registry();
        let armv7 = resolve_ssl(&registry, "armv7-linux-gnueabihf");
        let mut arm64 = resolve_ssl(&registry, "aarch64-linux-gnu");
        arm64
            .environment
            .insert("PKG_CONFIG_ALLOW_CROSS".into(), "0".into());

        let result = BuildPlan::combine([armv7, arm64]);
        assert!(matches!(
            result,
            Err(ResolveError::ConflictingOverride { .. })
        ));
    }

    #[test]
    fn test_combine_nothing() {
        let plan = BuildPlan::combine(Vec::new()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.targets.is_empty());
    }

    #[test]
    fn test_repeated_target_kept_once() {
        let registry = registry();
        let plan = BuildPlan::combine([
            resolve_ssl(&registry, "armv7-linux-gnueabihf"),
            resolve_ssl(&registry, "armv7-unknown-linux-gnueabihf"),
        ])
        .unwrap();
        assert_eq!(plan.targets.len(), 1);
    }
}
