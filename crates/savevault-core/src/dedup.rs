use crate::model::{path_key, DiscoveredApplication};
use ahash::AHashSet;
use std::path::Path;

/// Executable paths already classified during the current scan.
///
/// Write-once per path; dropped with the scan.
#[derive(Debug, Default)]
pub struct ProcessedPathSet {
    paths: AHashSet<String>,
}

impl ProcessedPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`; returns false when it had already been processed.
    pub fn insert(&mut self, path: &Path) -> bool {
        self.paths.insert(path_key(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&path_key(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Why a record was refused by the [`DeduplicationIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DuplicatePath,
    NameClaimed,
}

/// Paths emitted and executable names claimed during one scan.
///
/// The first source to claim an executable file name keeps it; later
/// records with the same name are refused even from a different folder.
#[derive(Debug, Default)]
pub struct DeduplicationIndex {
    paths: AHashSet<String>,
    names: AHashSet<String>,
}

impl DeduplicationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, app: &DiscoveredApplication) -> Result<(), Rejection> {
        let path = app.path_key();
        if self.paths.contains(&path) {
            return Err(Rejection::DuplicatePath);
        }
        let name = app.name_key();
        if self.names.contains(&name) {
            return Err(Rejection::NameClaimed);
        }
        self.paths.insert(path);
        self.names.insert(name);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use std::path::PathBuf;

    fn app(path: &str, source: Source) -> DiscoveredApplication {
        DiscoveredApplication::from_executable(PathBuf::from(path), source)
    }

    #[test]
    fn test_same_path_different_case_rejected() {
        let mut index = DeduplicationIndex::new();
        assert!(index.claim(&app("C:\\Games\\Foo\\Foo.exe", Source::Registry)).is_ok());
        assert_eq!(
            index.claim(&app("c:\\games\\foo\\FOO.EXE", Source::FilesystemHeuristic)),
            Err(Rejection::DuplicatePath)
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_first_name_claim_wins() {
        let mut index = DeduplicationIndex::new();
        assert!(index.claim(&app("C:\\Games\\Foo\\Foo.exe", Source::KnownCatalog)).is_ok());
        assert_eq!(
            index.claim(&app("D:\\Backup\\Foo\\foo.exe", Source::FilesystemHeuristic)),
            Err(Rejection::NameClaimed)
        );
        assert!(index.claim(&app("D:\\Games\\Bar\\Bar.exe", Source::FilesystemHeuristic)).is_ok());
    }

    #[test]
    fn test_processed_set_write_once() {
        let mut processed = ProcessedPathSet::new();
        assert!(processed.insert(Path::new("/games/foo.exe")));
        assert!(!processed.insert(Path::new("/GAMES/foo.exe")));
        assert!(processed.contains(Path::new("/games/FOO.exe")));
        assert_eq!(processed.len(), 1);
    }
}
