use dirs::home_dir;
use std::path::{Path, PathBuf};

use crate::registry::{Registry, RegistryError};

/// File name of a project-local registry.
pub const PROJECT_REGISTRY: &str = "xenv.toml";

/// File name of the user registry inside the xenv home.
pub const USER_REGISTRY: &str = "registry.toml";

/// Returns the xenv home directory (`$XENV_HOME`, else `~/.xenv`), or `None`
/// if the user's home cannot be resolved.
pub fn try_xenv_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("XENV_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".xenv"))
}

/// Walk up from `start` looking for a project registry.
pub fn find_project_registry(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_REGISTRY))
        .find(|candidate| candidate.is_file())
}

/// Where the registry for a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Given on the command line or through `XENV_REGISTRY`.
    Explicit(PathBuf),
    /// The nearest `xenv.toml` above the working directory.
    Project(PathBuf),
    /// `registry.toml` in the xenv home.
    User(PathBuf),
    /// The registry embedded in the binary.
    Builtin,
}

impl RegistrySource {
    /// Pick the registry source: explicit path, then project file, then user
    /// file, then the built-in registry.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Self {
        Self::discover_in(explicit, cwd, try_xenv_home().as_deref())
    }

    /// [`RegistrySource::discover`] with an explicit xenv home.
    pub fn discover_in(explicit: Option<&Path>, cwd: &Path, home: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }
        if let Some(path) = find_project_registry(cwd) {
            return Self::Project(path);
        }
        if let Some(path) = home.map(|h| h.join(USER_REGISTRY)) {
            if path.is_file() {
                return Self::User(path);
            }
        }
        Self::Builtin
    }

    /// Load the registry from this source.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed.
    pub async fn load(&self) -> Result<Registry, RegistryError> {
        tracing::debug!("Loading registry from {self}");
        match self {
            Self::Explicit(path) | Self::Project(path) | Self::User(path) => {
                Registry::load(path).await
            }
            Self::Builtin => Registry::builtin(),
        }
    }
}

impl std::fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(path) | Self::Project(path) | Self::User(path) => {
                write!(f, "{}", path.display())
            }
            Self::Builtin => write!(f, "built-in registry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_REGISTRY), "").unwrap();
        let explicit = dir.path().join("other.toml");

        let source = RegistrySource::discover_in(Some(&explicit), dir.path(), None);
        assert_eq!(source, RegistrySource::Explicit(explicit));
    }

    #[test]
    fn test_project_found_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(PROJECT_REGISTRY), "").unwrap();

        let source = RegistrySource::discover_in(None, &nested, None);
        assert_eq!(
            source,
            RegistrySource::Project(dir.path().join(PROJECT_REGISTRY))
        );
    }

    #[test]
    fn test_user_then_builtin() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();

        let source = RegistrySource::discover_in(None, project.path(), Some(home.path()));
        assert_eq!(source, RegistrySource::Builtin);

        std::fs::write(home.path().join(USER_REGISTRY), "").unwrap();
        let source = RegistrySource::discover_in(None, project.path(), Some(home.path()));
        assert_eq!(
            source,
            RegistrySource::User(home.path().join(USER_REGISTRY))
        );
    }

    #[tokio::test]
    async fn test_builtin_source_loads() {
        let registry = RegistrySource::Builtin.load().await.unwrap();
        assert!(!registry.is_empty());
    }
}
