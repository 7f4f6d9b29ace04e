#[cfg(target_os = "windows")]
pub mod windows;

use crate::error::Error;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// A mounted, ready, local volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub root: PathBuf,
}

impl Volume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Enumerates the volumes the engine may probe and crawl.
pub trait VolumeSource: Send + Sync {
    fn volumes(&self) -> Result<Vec<Volume>, Error>;
}

/// Volumes of the running machine. Network and not-ready drives are left out.
pub struct SystemVolumes;

impl VolumeSource for SystemVolumes {
    #[cfg(target_os = "windows")]
    fn volumes(&self) -> Result<Vec<Volume>, Error> {
        Ok(windows::local_volumes())
    }

    #[cfg(not(target_os = "windows"))]
    fn volumes(&self) -> Result<Vec<Volume>, Error> {
        Ok(vec![Volume::new("/")])
    }
}

/// Fixed volume list, for configured setups and tests.
pub struct StaticVolumes(pub Vec<Volume>);

impl VolumeSource for StaticVolumes {
    fn volumes(&self) -> Result<Vec<Volume>, Error> {
        Ok(self
            .0
            .iter()
            .filter(|v| v.root.is_dir())
            .cloned()
            .collect())
    }
}

/// Hidden or system entries are never crawled.
#[cfg(target_os = "windows")]
pub fn is_hidden_or_system(_name: &str, metadata: &Metadata) -> bool {
    windows::is_hidden_or_system(metadata)
}

#[cfg(not(target_os = "windows"))]
pub fn is_hidden_or_system(name: &str, _metadata: &Metadata) -> bool {
    name.starts_with('.')
}

/// Canonicalize, dropping the `\\?\` prefix Windows adds to local paths.
pub fn canonicalize(path: &Path) -> std::io::Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)?;
    #[cfg(target_os = "windows")]
    {
        Ok(windows::strip_verbatim_prefix(&canonical))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Ok(canonical)
    }
}
