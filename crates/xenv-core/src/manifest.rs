//! Registry file parsing.
//!
//! A registry file (`xenv.toml`) declares the supported targets, how each
//! logical library maps to packages, and the environment the toolchain
//! needs. Global `[libraries]` and `[env]` tables apply to every target;
//! a target's own tables specialize them.
//!
//! ```toml
//! [settings]
//! multi_target = false
//!
//! [env]
//! "PKG_CONFIG_LIBDIR_{triple_env}" = "/usr/lib/{gnu_triplet}/pkgconfig"
//!
//! [libraries]
//! ssl = ["libssl-dev"]
//! dbus = { packages = ["libdbus-1-dev"], host = ["pkg-config"] }
//!
//! [[target]]
//! triple = "armv7-unknown-linux-gnueabihf"
//! ```
//!
//! Environment names and values may use the placeholders `{triple}`,
//! `{triple_env}`, `{arch}`, `{multiarch}` and `{gnu_triplet}`. Literal
//! braces are written doubled: `"${{PKG_CONFIG_PATH}}:/opt/lib"` expands to
//! `${PKG_CONFIG_PATH}:/opt/lib`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use xenv_schema::{EnvironmentOverride, LibraryName, Multiarch, PackageName, TargetTriple};

use crate::registry::{PackageMapping, Registry, RegistryError, TargetEntry};

/// Registry shipped with the binary.
const BUILTIN_REGISTRY: &str = include_str!("../registry/builtin.toml");

/// `{name}` placeholders, plus `{{` / `}}` for literal braces.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_]+)\}").expect("placeholder pattern is valid")
});

/// The `[settings]` table.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Allow one build environment to serve several targets.
    #[serde(default)]
    pub multi_target: bool,
}

/// Top-level structure of a registry file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    libraries: BTreeMap<LibraryName, MappingSpec>,
    #[serde(default, rename = "target")]
    targets: Vec<TargetSpec>,
}

/// One `[[target]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSpec {
    triple: TargetTriple,
    multiarch: Option<String>,
    gnu_triplet: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    libraries: BTreeMap<LibraryName, MappingSpec>,
}

/// A library mapping: either a bare package list or a detailed table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MappingSpec {
    Packages(Vec<PackageName>),
    Detailed(DetailedMapping),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedMapping {
    #[serde(default)]
    packages: Vec<PackageName>,
    #[serde(default)]
    host: Vec<PackageName>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl MappingSpec {
    fn into_mapping(
        self,
        library: LibraryName,
        vars: &Placeholders,
    ) -> Result<PackageMapping, RegistryError> {
        let detailed = match self {
            Self::Packages(packages) => {
                return Ok(PackageMapping::new(library, packages));
            }
            Self::Detailed(detailed) => detailed,
        };

        let mut mapping = PackageMapping::new(library, detailed.packages).with_host(detailed.host);
        for (name, value) in &detailed.env {
            mapping = mapping.with_override(vars.override_for(name, value)?);
        }
        Ok(mapping)
    }
}

/// Values substituted into `{placeholder}`s for one target.
struct Placeholders {
    target: TargetTriple,
    triple: String,
    triple_env: String,
    arch: String,
    multiarch: String,
    gnu_triplet: String,
}

impl Placeholders {
    fn new(target: &TargetTriple, multiarch: &Multiarch) -> Self {
        Self {
            target: target.clone(),
            triple: target.to_string(),
            triple_env: target.env_key(),
            arch: target.arch().to_string(),
            multiarch: multiarch.qualifier().to_string(),
            gnu_triplet: multiarch.triplet().to_string(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "triple" => Some(&self.triple),
            "triple_env" => Some(&self.triple_env),
            "arch" => Some(&self.arch),
            "multiarch" => Some(&self.multiarch),
            "gnu_triplet" => Some(&self.gnu_triplet),
            _ => None,
        }
    }

    fn expand(&self, text: &str) -> Result<String, RegistryError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let value = match (whole.as_str(), caps.get(1)) {
                ("{{", _) => "{",
                ("}}", _) => "}",
                (_, Some(name)) => self.lookup(name.as_str()).ok_or_else(|| {
                    RegistryError::UnknownPlaceholder {
                        placeholder: name.as_str().to_string(),
                        text: text.to_string(),
                    }
                })?,
                _ => continue,
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn override_for(&self, name: &str, value: &str) -> Result<EnvironmentOverride, RegistryError> {
        EnvironmentOverride::new(self.expand(name)?, self.expand(value)?).map_err(|source| {
            RegistryError::InvalidVariable {
                target: self.target.clone(),
                source,
            }
        })
    }
}

fn resolve_multiarch(spec: &TargetSpec) -> Result<Multiarch, RegistryError> {
    let derived = Multiarch::for_triple(&spec.triple);
    let qualifier = spec
        .multiarch
        .clone()
        .or_else(|| derived.as_ref().map(|m| m.qualifier().to_string()));
    let triplet = spec
        .gnu_triplet
        .clone()
        .or_else(|| derived.as_ref().map(|m| m.triplet().to_string()));

    match (qualifier, triplet) {
        (Some(qualifier), Some(triplet)) => Ok(Multiarch::new(qualifier, triplet)),
        _ => Err(RegistryError::UnknownMultiarch(spec.triple.clone())),
    }
}

impl RegistryFile {
    fn into_registry(self) -> Result<Registry, RegistryError> {
        let mut builder = Registry::builder().multi_target(self.settings.multi_target);

        for spec in self.targets {
            let multiarch = resolve_multiarch(&spec)?;
            let vars = Placeholders::new(&spec.triple, &multiarch);
            let mut entry = TargetEntry::with_multiarch(spec.triple.clone(), multiarch);

            for (name, value) in self.env.iter().chain(spec.env.iter()) {
                entry = entry.set_env(&vars.expand(name)?, &vars.expand(value)?)?;
            }

            // Target tables replace global mappings of the same library.
            let mut libraries = self.libraries.clone();
            libraries.extend(spec.libraries);
            for (library, mapping) in libraries {
                entry = entry.insert_mapping(mapping.into_mapping(library, &vars)?)?;
            }

            builder = builder.target(entry);
        }

        builder.build()
    }
}

impl Registry {
    /// Parse a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the TOML is malformed, names are invalid,
    /// a mapping is empty, a placeholder is unknown or a target is declared
    /// twice.
    pub fn parse(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(content)?;
        file.into_registry()
    }

    /// Read and parse a registry file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file cannot be read, or any error
    /// from [`Registry::parse`].
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Asynchronously read and parse a registry file.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::from_file`].
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// The registry shipped with xenv: Debian/Ubuntu multi-arch ports.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded registry is itself invalid.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::parse(BUILTIN_REGISTRY)
    }
}
