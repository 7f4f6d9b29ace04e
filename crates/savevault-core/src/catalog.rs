use crate::env::{expand_env_vars, Environment};
use crate::error::Error;
use crate::model::{KnownGameDescriptor, SavePath};
use crate::platform::Volume;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "game")]
    games: Vec<KnownGameDescriptor>,
}

/// Parse a TOML catalog made of `[[game]]` tables.
pub fn parse_catalog(text: &str) -> Result<Vec<KnownGameDescriptor>, Error> {
    let file: CatalogFile = toml::from_str(text)?;
    Ok(file.games)
}

pub fn load_catalog(path: &Path) -> Result<Vec<KnownGameDescriptor>, Error> {
    let text = fs::read_to_string(path)?;
    let games = parse_catalog(&text)?;
    info!("Loaded {} known games from {}", games.len(), path.display());
    Ok(games)
}

/// Resolves catalog descriptors against the mounted volumes.
pub struct KnownCatalogMatcher<'a> {
    env: &'a dyn Environment,
}

impl<'a> KnownCatalogMatcher<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// Candidate executable location of `descriptor` on `volume`, or `None`
    /// for descriptors missing an install path or executable name.
    pub fn candidate(&self, descriptor: &KnownGameDescriptor, volume: &Volume) -> Option<PathBuf> {
        if !descriptor.is_complete() {
            return None;
        }
        let relative = descriptor.relative_install_path.as_deref()?;
        let executable = descriptor.executable_file_name.as_deref()?;

        let mut path = volume.root.clone();
        for segment in relative.split(['/', '\\']).filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(executable.trim());
        Some(path)
    }

    /// Expanded save directory when it exists on disk, `Unknown` otherwise.
    pub fn resolve_save_path(&self, descriptor: &KnownGameDescriptor) -> SavePath {
        let Some(template) = descriptor.save_path_template.as_deref() else {
            return SavePath::Unknown;
        };
        // Catalog templates are written with Windows separators.
        let expanded = expand_env_vars(template, self.env).map(|path| {
            if cfg!(target_os = "windows") {
                path
            } else {
                path.replace('\\', "/")
            }
        });
        match expanded {
            Some(expanded) if Path::new(&expanded).is_dir() => {
                SavePath::Resolved(PathBuf::from(expanded))
            }
            Some(expanded) => {
                debug!("Save path {} for {} does not exist", expanded, descriptor.name);
                SavePath::Unknown
            }
            None => {
                debug!("Unresolved placeholder in save path for {}", descriptor.name);
                SavePath::Unknown
            }
        }
    }
}
