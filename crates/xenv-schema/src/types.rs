use crate::Multiarch;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Errors raised when validating a name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name was empty after trimming.
    #[error("Empty {0} name")]
    Empty(&'static str),

    /// The name contained characters not allowed for its kind.
    #[error("Invalid {kind} name: '{name}'")]
    Invalid {
        /// What kind of name was being validated (`library`, `package`, ...).
        kind: &'static str,
        /// The offending input.
        name: String,
    },
}

/// A logical native library name, independent of package-manager naming
/// (e.g. `ssl`, `audio`, `dbus`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryName(String);

impl LibraryName {
    /// Parse a library name, normalizing it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if the name is empty or contains characters
    /// outside `[a-z0-9_+.-]`.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(NameError::Empty("library"));
        }
        let valid = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_+.-".contains(c));
        if !valid {
            return Err(NameError::Invalid {
                kind: "library",
                name,
            });
        }
        Ok(Self(name))
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LibraryName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LibraryName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LibraryName> for String {
    fn from(name: LibraryName) -> Self {
        name.0
    }
}

impl Borrow<str> for LibraryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LibraryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LibraryName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for LibraryName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

/// A concrete package name as known to the host package manager
/// (e.g. `libssl-dev`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Parse a package name, normalizing it to lowercase.
    ///
    /// Names follow Debian policy: at least two characters, starting with an
    /// alphanumeric, then `[a-z0-9+.-]`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if the name is empty or violates the rules above.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(NameError::Empty("package"));
        }

        let mut chars = name.chars();
        let starts_alnum = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        let rest_valid =
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+.-".contains(c));

        if name.len() < 2 || !starts_alnum || !rest_valid {
            return Err(NameError::Invalid {
                kind: "package",
                name,
            });
        }
        Ok(Self(name))
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for PackageName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A package name ready for the host package manager, optionally tagged
/// with a multi-arch qualifier (`libssl-dev:armhf`).
///
/// Ordering and equality follow the rendered string, so sorted install
/// lists are lexicographic in exactly the form the package manager sees.
#[derive(Debug, Clone)]
pub struct QualifiedPackage {
    name: PackageName,
    qualifier: Option<String>,
}

impl QualifiedPackage {
    /// A package built for the target architecture (`name:qualifier`).
    pub fn foreign(name: PackageName, multiarch: &Multiarch) -> Self {
        Self {
            name,
            qualifier: Some(multiarch.qualifier().to_string()),
        }
    }

    /// A package that runs on the build host and carries no qualifier.
    pub fn host(name: PackageName) -> Self {
        Self {
            name,
            qualifier: None,
        }
    }

    /// The unqualified package name.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The multi-arch qualifier, if this is a foreign-architecture package.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    fn rendered_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let suffix = self
            .qualifier
            .iter()
            .flat_map(|q| std::iter::once(b':').chain(q.bytes()));
        self.name.bytes().chain(suffix)
    }
}

impl fmt::Display for QualifiedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}:{qualifier}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Ord for QualifiedPackage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rendered_bytes().cmp(other.rendered_bytes())
    }
}

impl PartialOrd for QualifiedPackage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QualifiedPackage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QualifiedPackage {}

impl Serialize for QualifiedPackage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An environment variable that must be exported into the build process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnvironmentOverride {
    name: String,
    value: String,
}

impl EnvironmentOverride {
    /// Create an override, validating the variable name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] unless the name matches `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NameError::Empty("variable"));
        }
        let mut chars = name.chars();
        let head_valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let tail_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !head_valid || !tail_valid {
            return Err(NameError::Invalid {
                kind: "variable",
                name,
            });
        }
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for EnvironmentOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str) -> PackageName {
        PackageName::parse(name).unwrap()
    }

    #[test]
    fn test_library_name_normalization() {
        let name = LibraryName::parse(" SSL ").unwrap();
        assert_eq!(name.as_str(), "ssl");
        assert_eq!(name, "ssl");
        assert!(LibraryName::parse("").is_err());
        assert!(LibraryName::parse("lib ssl").is_err());
        assert!(LibraryName::parse("gtk+-3.0").is_ok());
    }

    #[test]
    fn test_package_name_rules() {
        assert_eq!(pkg("libssl-dev").as_str(), "libssl-dev");
        assert_eq!(pkg("LibDBus-1-Dev").as_str(), "libdbus-1-dev");
        assert!(PackageName::parse("x").is_err());
        assert!(PackageName::parse("-lib").is_err());
        assert!(PackageName::parse("libssl-dev:armhf").is_err());
        assert!(PackageName::parse("lib_ssl").is_err());
        assert!(PackageName::parse("libstdc++6").is_ok());
    }

    #[test]
    fn test_qualified_rendering() {
        let arch = Multiarch::new("armhf", "arm-linux-gnueabihf");
        assert_eq!(
            QualifiedPackage::foreign(pkg("libssl-dev"), &arch).to_string(),
            "libssl-dev:armhf"
        );
        assert_eq!(QualifiedPackage::host(pkg("pkg-config")).to_string(), "pkg-config");
    }

    #[test]
    fn test_ordering_follows_rendered_string() {
        let arch = Multiarch::new("armhf", "arm-linux-gnueabihf");
        let short = QualifiedPackage::foreign(pkg("libfoo"), &arch);
        let long = QualifiedPackage::foreign(pkg("libfoo-dev"), &arch);
        // '-' sorts before ':' so "libfoo-dev:armhf" < "libfoo:armhf".
        assert!(long < short);

        let mut rendered = [short.to_string(), long.to_string()];
        rendered.sort();
        assert_eq!(rendered, ["libfoo-dev:armhf", "libfoo:armhf"]);
    }

    #[test]
    fn test_host_and_foreign_differ() {
        let arch = Multiarch::new("armhf", "arm-linux-gnueabihf");
        assert_ne!(
            QualifiedPackage::host(pkg("libssl-dev")),
            QualifiedPackage::foreign(pkg("libssl-dev"), &arch)
        );
    }

    #[test]
    fn test_environment_override_names() {
        let ok = EnvironmentOverride::new("PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf", "/x");
        assert!(ok.is_ok());
        assert_eq!(ok.unwrap().to_string(), "PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf=/x");
        assert!(EnvironmentOverride::new("", "x").is_err());
        assert!(EnvironmentOverride::new("1ABC", "x").is_err());
        assert!(EnvironmentOverride::new("PKG-CONFIG", "x").is_err());
    }
}
