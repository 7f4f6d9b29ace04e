use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which discovery phase produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    KnownCatalog,
    Registry,
    FilesystemHeuristic,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Source::KnownCatalog => "catalog",
            Source::Registry => "registry",
            Source::FilesystemHeuristic => "filesystem",
        };
        f.write_str(label)
    }
}

/// Save directory of a discovered application. Only catalog hits whose
/// configured save directory exists carry a path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SavePath {
    Resolved(PathBuf),
    #[default]
    Unknown,
}

impl fmt::Display for SavePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavePath::Resolved(path) => write!(f, "{}", path.display()),
            SavePath::Unknown => f.write_str("Unknown"),
        }
    }
}

/// One installed program found by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredApplication {
    pub name: String,
    pub install_path: PathBuf,
    /// Canonical absolute path; identity of the record.
    pub executable_path: PathBuf,
    pub save_path: SavePath,
    pub source: Source,
}

impl DiscoveredApplication {
    /// Build a record named after the executable's file stem.
    pub fn from_executable(executable_path: PathBuf, source: Source) -> Self {
        let name = executable_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let install_path = executable_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            name,
            install_path,
            executable_path,
            save_path: SavePath::Unknown,
            source,
        }
    }

    /// Case-insensitive identity key of the executable path.
    pub fn path_key(&self) -> String {
        path_key(&self.executable_path)
    }

    /// Case-insensitive executable file name, used for name claims.
    pub fn name_key(&self) -> String {
        let key = self.path_key();
        match key.rsplit_once('/') {
            Some((_, name)) => name.to_string(),
            None => key,
        }
    }
}

pub(crate) fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Catalog entry for a game whose install layout is known in advance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KnownGameDescriptor {
    pub name: String,
    #[serde(default, alias = "install_path")]
    pub relative_install_path: Option<String>,
    #[serde(default, alias = "executable")]
    pub executable_file_name: Option<String>,
    #[serde(default, alias = "save_path")]
    pub save_path_template: Option<String>,
}

impl KnownGameDescriptor {
    /// Descriptors without both an install path and an executable name are unusable.
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.relative_install_path) && filled(&self.executable_file_name)
    }
}

/// An executable file seen by a classifier, with metadata already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableInfo {
    pub path: PathBuf,
    pub size: u64,
}

impl ExecutableInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_executable_derives_name_and_install_path() {
        let app = DiscoveredApplication::from_executable(
            PathBuf::from("/games/Foo/Foo.exe"),
            Source::FilesystemHeuristic,
        );
        assert_eq!(app.name, "Foo");
        assert_eq!(app.install_path, PathBuf::from("/games/Foo"));
        assert_eq!(app.save_path.to_string(), "Unknown");
        assert_eq!(app.name_key(), "foo.exe");
    }

    #[test]
    fn test_path_key_ignores_case_and_separator() {
        assert_eq!(
            path_key(Path::new("C:\\Games\\Foo.exe")),
            path_key(Path::new("c:/games/FOO.EXE"))
        );
    }

    #[test]
    fn test_incomplete_descriptor() {
        let descriptor = KnownGameDescriptor {
            name: "Foo".into(),
            relative_install_path: Some("Games/Foo".into()),
            executable_file_name: Some("  ".into()),
            save_path_template: None,
        };
        assert!(!descriptor.is_complete());
    }
}
