use crate::config::{dedupe_roots, DiscoveryConfig};
use crate::env::Environment;
use crate::platform::Volume;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Common install folders directly below a volume root.
const VOLUME_INSTALL_DIRS: &[&str] = &[
    "Program Files",
    "Program Files (x86)",
    "Games",
    "Steam",
    "SteamLibrary",
    "Epic Games",
    "GOG Games",
    "GOG Galaxy/Games",
    "XboxGames",
    "Origin Games",
    "EA Games",
    "Ubisoft",
    "Riot Games",
    "Rockstar Games",
];

/// Game-related folders inside each user profile.
const USER_GAME_DIRS: &[&str] = &[
    "Games",
    "Saved Games",
    "Documents/My Games",
    "AppData/Local/Programs",
    ".local/share/Steam/steamapps/common",
    ".steam/steam/steamapps/common",
    ".local/share/lutris",
];

/// Profiles that never belong to a person.
const SKIPPED_PROFILES: &[&str] = &["public", "default", "default user", "all users"];

/// Environment-backed shell folders, with an optional sub-path.
const SHELL_FOLDERS: &[(&str, &str)] = &[
    ("ProgramFiles", ""),
    ("ProgramFiles(x86)", ""),
    ("ProgramW6432", ""),
    ("LOCALAPPDATA", "Programs"),
    ("PUBLIC", "Games"),
];

/// Launcher game libraries relative to a program-files folder.
const LAUNCHER_DIRS: &[&str] = &[
    "Steam/steamapps/common",
    "Epic Games",
    "GOG Galaxy/Games",
    "Ubisoft/Ubisoft Game Launcher/games",
    "EA Games",
    "Origin Games",
];

/// Build the ordered, de-duplicated list of roots the crawler walks.
///
/// Only directories that exist are returned. `config.search_roots` are
/// always included, after the system roots.
pub fn build_search_roots(
    volumes: &[Volume],
    env: &dyn Environment,
    config: &DiscoveryConfig,
) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if config.include_system_roots {
        for volume in volumes {
            candidates.extend(VOLUME_INSTALL_DIRS.iter().map(|d| join_rel(&volume.root, d)));
        }
        for profile in user_profiles(env) {
            candidates.extend(USER_GAME_DIRS.iter().map(|d| join_rel(&profile, d)));
        }
        candidates.extend(shell_folders(env));
        candidates.extend(launcher_dirs(env));
    }
    candidates.extend(config.search_roots.iter().map(PathBuf::from));

    let existing: Vec<String> = candidates
        .into_iter()
        .filter(|p| p.is_dir())
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let roots: Vec<PathBuf> = dedupe_roots(existing).into_iter().map(PathBuf::from).collect();
    debug!("{} search roots", roots.len());
    roots
}

fn join_rel(base: &Path, rel: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in rel.split('/') {
        path.push(segment);
    }
    path
}

/// The current profile plus every sibling profile under the same parent.
fn user_profiles(env: &dyn Environment) -> Vec<PathBuf> {
    let Some(home) = env.var("USERPROFILE").or_else(|| env.var("HOME")) else {
        return Vec::new();
    };
    let home = PathBuf::from(home);
    let mut profiles = vec![home.clone()];

    if let Some(parent) = home.parent() {
        match fs::read_dir(parent) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let name = entry.file_name().to_string_lossy().to_lowercase();
                    if path.is_dir() && path != home && !SKIPPED_PROFILES.contains(&name.as_str()) {
                        profiles.push(path);
                    }
                }
            }
            Err(e) => debug!("Cannot list user profiles in {}: {}", parent.display(), e),
        }
    }
    profiles
}

fn shell_folders(env: &dyn Environment) -> Vec<PathBuf> {
    SHELL_FOLDERS
        .iter()
        .filter_map(|(var, sub)| {
            let base = PathBuf::from(env.var(var)?);
            Some(if sub.is_empty() { base } else { join_rel(&base, sub) })
        })
        .collect()
}

/// Launcher libraries, including every extra Steam library listed in
/// `libraryfolders.vdf`.
fn launcher_dirs(env: &dyn Environment) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for var in ["ProgramFiles(x86)", "ProgramFiles"] {
        let Some(base) = env.var(var).map(PathBuf::from) else {
            continue;
        };
        dirs.extend(LAUNCHER_DIRS.iter().map(|d| join_rel(&base, d)));

        let vdf = join_rel(&base, "Steam/steamapps/libraryfolders.vdf");
        if let Ok(text) = fs::read_to_string(&vdf) {
            dirs.extend(
                parse_steam_library_folders(&text)
                    .into_iter()
                    .map(|lib| join_rel(&lib, "steamapps/common")),
            );
        }
    }
    dirs
}

/// Extract library paths from Steam's `libraryfolders.vdf`.
///
/// Handles both the current `"path" "D:\\SteamLibrary"` layout and the
/// older numbered `"1" "D:\\SteamLibrary"` entries.
pub fn parse_steam_library_folders(text: &str) -> Vec<PathBuf> {
    let mut libraries = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line
            .split('"')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        let [key, value] = fields.as_slice() else {
            continue;
        };
        let looks_like_path = value.contains(['/', '\\', ':']);
        if looks_like_path && (key.eq_ignore_ascii_case("path") || key.parse::<u32>().is_ok()) {
            libraries.push(PathBuf::from(value.replace("\\\\", "\\")));
        }
    }
    libraries
}
