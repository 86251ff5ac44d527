//! The registry of supported targets.
//!
//! A [`Registry`] is the static configuration every resolution runs against:
//! which target triples are supported, how each logical library maps to
//! concrete packages on that target, and which environment overrides the
//! toolchain needs. It is assembled once (in process through
//! [`RegistryBuilder`], or from TOML through [`Registry::parse`]) and is
//! immutable afterwards.

use std::collections::BTreeMap;

use thiserror::Error;
use xenv_schema::{
    EnvironmentOverride, LibraryName, Multiarch, NameError, PackageName, TargetTriple, TripleError,
};

/// Errors raised while building or loading a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An I/O error occurred while reading a registry file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a registry.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A target triple in the registry is malformed.
    #[error(transparent)]
    Triple(#[from] TripleError),

    /// A library or package name in the registry is malformed.
    #[error(transparent)]
    Name(#[from] NameError),

    /// The same target triple was declared twice.
    #[error("Target '{0}' is declared more than once")]
    DuplicateTarget(TargetTriple),

    /// No multiarch naming could be derived and none was declared.
    #[error("No multiarch naming known for target '{0}'; declare `multiarch` and `gnu_triplet`")]
    UnknownMultiarch(TargetTriple),

    /// A library mapping lists no packages at all.
    #[error("Library '{library}' maps to no packages for target '{target}'")]
    EmptyMapping {
        /// Target the mapping was declared for.
        target: TargetTriple,
        /// The library with the empty mapping.
        library: LibraryName,
    },

    /// A `{placeholder}` in an environment declaration is not recognised.
    #[error("Unknown placeholder '{{{placeholder}}}' in '{text}'")]
    UnknownPlaceholder {
        /// The placeholder name without braces.
        placeholder: String,
        /// The text it appeared in.
        text: String,
    },

    /// An environment variable name is invalid after expansion.
    #[error("Invalid environment variable for target '{target}': {source}")]
    InvalidVariable {
        /// Target the variable was declared for.
        target: TargetTriple,
        /// The underlying name error.
        source: NameError,
    },
}

/// How one logical library resolves on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMapping {
    library: LibraryName,
    packages: Vec<PackageName>,
    host: Vec<PackageName>,
    overrides: Vec<EnvironmentOverride>,
}

impl PackageMapping {
    /// Map `library` to packages built for the target architecture.
    pub fn new(library: LibraryName, packages: Vec<PackageName>) -> Self {
        Self {
            library,
            packages,
            host: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Add packages that run on the build host (installed without qualifier).
    pub fn with_host(mut self, host: Vec<PackageName>) -> Self {
        self.host = host;
        self
    }

    /// Add an override exported only when this library is requested.
    pub fn with_override(mut self, over: EnvironmentOverride) -> Self {
        self.overrides.push(over);
        self
    }

    /// The logical library this mapping resolves.
    pub fn library(&self) -> &LibraryName {
        &self.library
    }

    /// Packages installed for the target architecture.
    pub fn packages(&self) -> &[PackageName] {
        &self.packages
    }

    /// Packages installed for the build host.
    pub fn host_packages(&self) -> &[PackageName] {
        &self.host
    }

    /// Library-scoped environment overrides.
    pub fn overrides(&self) -> &[EnvironmentOverride] {
        &self.overrides
    }

    /// True if the mapping names no package at all.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.host.is_empty()
    }
}

/// Everything the registry knows about one supported target.
#[derive(Debug, Clone)]
pub struct TargetEntry {
    triple: TargetTriple,
    multiarch: Multiarch,
    libraries: BTreeMap<LibraryName, PackageMapping>,
    overrides: Vec<EnvironmentOverride>,
}

impl TargetEntry {
    /// Declare a target, deriving its multiarch naming from the triple.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMultiarch`] if the triple has no
    /// built-in Debian naming; use [`TargetEntry::with_multiarch`] instead.
    pub fn new(triple: TargetTriple) -> Result<Self, RegistryError> {
        let multiarch = Multiarch::for_triple(&triple)
            .ok_or_else(|| RegistryError::UnknownMultiarch(triple.clone()))?;
        Ok(Self::with_multiarch(triple, multiarch))
    }

    /// Declare a target with explicit multiarch naming.
    pub fn with_multiarch(triple: TargetTriple, multiarch: Multiarch) -> Self {
        Self {
            triple,
            multiarch,
            libraries: BTreeMap::new(),
            overrides: Vec::new(),
        }
    }

    /// Map a library to target-architecture packages by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Name`] for malformed names and
    /// [`RegistryError::EmptyMapping`] if `packages` is empty.
    pub fn map_library(self, library: &str, packages: &[&str]) -> Result<Self, RegistryError> {
        let library = LibraryName::parse(library)?;
        let packages = packages
            .iter()
            .map(|p| PackageName::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_mapping(PackageMapping::new(library, packages))
    }

    /// Add a fully specified mapping, replacing any previous mapping for the
    /// same library.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyMapping`] if the mapping names no package.
    pub fn insert_mapping(mut self, mapping: PackageMapping) -> Result<Self, RegistryError> {
        if mapping.is_empty() {
            return Err(RegistryError::EmptyMapping {
                target: self.triple.clone(),
                library: mapping.library,
            });
        }
        self.libraries.insert(mapping.library.clone(), mapping);
        Ok(self)
    }

    /// Declare a target-level environment override.
    ///
    /// Declarations are kept as written; a repeated name with a different
    /// value is reported when the target is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidVariable`] for a malformed name.
    pub fn set_env(mut self, name: &str, value: &str) -> Result<Self, RegistryError> {
        let over =
            EnvironmentOverride::new(name, value).map_err(|source| RegistryError::InvalidVariable {
                target: self.triple.clone(),
                source,
            })?;
        self.overrides.push(over);
        Ok(self)
    }

    /// The target triple.
    pub fn triple(&self) -> &TargetTriple {
        &self.triple
    }

    /// Multiarch naming for this target.
    pub fn multiarch(&self) -> &Multiarch {
        &self.multiarch
    }

    /// Look up the mapping for a library.
    pub fn mapping(&self, library: &LibraryName) -> Option<&PackageMapping> {
        self.libraries.get(library)
    }

    /// All mappings, ordered by library name.
    pub fn mappings(&self) -> impl Iterator<Item = &PackageMapping> {
        self.libraries.values()
    }

    /// Target-level environment overrides, in declaration order.
    pub fn overrides(&self) -> &[EnvironmentOverride] {
        &self.overrides
    }
}

/// Immutable set of supported targets.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    multi_target: bool,
    targets: BTreeMap<TargetTriple, TargetEntry>,
}

impl Registry {
    /// Start building a registry in process.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a supported target.
    pub fn target(&self, triple: &TargetTriple) -> Option<&TargetEntry> {
        self.targets.get(triple)
    }

    /// True if `triple` is supported.
    pub fn supports(&self, triple: &TargetTriple) -> bool {
        self.targets.contains_key(triple)
    }

    /// All supported targets, ordered by triple.
    pub fn targets(&self) -> impl Iterator<Item = &TargetEntry> {
        self.targets.values()
    }

    /// Number of supported targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if no target is supported.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Whether one build environment may serve several targets at once.
    pub fn allows_multi_target(&self) -> bool {
        self.multi_target
    }
}

/// Assembles a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    multi_target: bool,
    targets: Vec<TargetEntry>,
}

impl RegistryBuilder {
    /// Allow or forbid multi-target build environments (default: forbid).
    pub fn multi_target(mut self, allowed: bool) -> Self {
        self.multi_target = allowed;
        self
    }

    /// Add a supported target.
    pub fn target(mut self, entry: TargetEntry) -> Self {
        self.targets.push(entry);
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTarget`] if a triple was added twice.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut targets = BTreeMap::new();
        for entry in self.targets {
            let triple = entry.triple.clone();
            if targets.insert(triple.clone(), entry).is_some() {
                return Err(RegistryError::DuplicateTarget(triple));
            }
        }
        tracing::debug!("Registry built with {} target(s)", targets.len());
        Ok(Registry {
            multi_target: self.multi_target,
            targets,
        })
    }
}
