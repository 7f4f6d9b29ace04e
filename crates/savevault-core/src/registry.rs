use crate::env::{expand_env_vars, Environment};
use crate::error::Error;
use tracing::debug;

/// Installed-program records of the operating system, reduced to executable paths.
pub trait RegistrySource: Send + Sync {
    fn executable_paths(&self) -> Result<Vec<String>, Error>;
}

/// Fixed path list, for tests and hosts without a registry.
pub struct StaticRegistry(pub Vec<String>);

impl RegistrySource for StaticRegistry {
    fn executable_paths(&self) -> Result<Vec<String>, Error> {
        Ok(self.0.clone())
    }
}

/// Uninstall entries under HKLM and HKCU, 64- and 32-bit views.
pub struct InstalledProgramsRegistry;

impl RegistrySource for InstalledProgramsRegistry {
    #[cfg(target_os = "windows")]
    fn executable_paths(&self) -> Result<Vec<String>, Error> {
        let env = crate::env::ProcessEnvironment;
        let entries = uninstall::entries()?;
        debug!("{} uninstall entries with an icon or location", entries.len());
        Ok(entries.iter().flat_map(|entry| entry.executables(&env)).collect())
    }

    #[cfg(not(target_os = "windows"))]
    fn executable_paths(&self) -> Result<Vec<String>, Error> {
        Ok(Vec::new())
    }
}

#[cfg(target_os = "windows")]
mod uninstall {
    use super::UninstallEntry;
    use crate::error::Error;
    use tracing::debug;
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    const UNINSTALL: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    const UNINSTALL_WOW64: &str = r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

    /// Every subkey of the three Uninstall roots that names an icon or a location.
    pub fn entries() -> Result<Vec<UninstallEntry>, Error> {
        let roots = [
            (RegKey::predef(HKEY_LOCAL_MACHINE), "HKLM", UNINSTALL),
            (RegKey::predef(HKEY_LOCAL_MACHINE), "HKLM", UNINSTALL_WOW64),
            (RegKey::predef(HKEY_CURRENT_USER), "HKCU", UNINSTALL),
        ];
        let mut entries = Vec::new();
        let mut failures = 0;

        for (hive, label, path) in &roots {
            let root = match hive.open_subkey(path) {
                Ok(key) => key,
                Err(e) => {
                    debug!("Cannot open {}\\{}: {}", label, path, e);
                    failures += 1;
                    continue;
                }
            };
            for name in root.enum_keys().flatten() {
                let key = match root.open_subkey(&name) {
                    Ok(key) => key,
                    Err(e) => {
                        debug!("Cannot open uninstall key {}: {}", name, e);
                        continue;
                    }
                };
                // REG_SZ and REG_EXPAND_SZ both read as String, unexpanded.
                let value = |field: &str| {
                    key.get_value::<String, _>(field)
                        .ok()
                        .filter(|v| !v.trim().is_empty())
                };
                let entry = UninstallEntry {
                    key: format!("{}\\{}\\{}", label, path, name),
                    display_icon: value("DisplayIcon"),
                    install_location: value("InstallLocation"),
                };
                if entry.display_icon.is_some() || entry.install_location.is_some() {
                    entries.push(entry);
                }
            }
        }

        if failures == roots.len() {
            return Err(Error::Registry(
                "no uninstall registry key could be read".to_string(),
            ));
        }
        Ok(entries)
    }
}

/// The values of one uninstall key the engine cares about, as stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UninstallEntry {
    pub key: String,
    pub display_icon: Option<String>,
    pub install_location: Option<String>,
}

impl UninstallEntry {
    /// `DisplayIcon` when it names an executable, otherwise the top-level
    /// executables inside `InstallLocation`. `%VAR%` placeholders are
    /// expanded first; values with unknown variables are dropped.
    pub fn executables(&self, env: &dyn Environment) -> Vec<String> {
        let icon = self
            .display_icon
            .as_deref()
            .and_then(|raw| expand_value(raw, env))
            .and_then(|icon| icon_executable(&icon));
        if let Some(icon) = icon {
            return vec![icon];
        }

        let Some(location) = self
            .install_location
            .as_deref()
            .and_then(|raw| expand_value(raw, env))
        else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(location.trim().trim_matches('"')) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
            })
            .map(|path| path.to_string_lossy().into_owned())
            .collect()
    }
}

fn expand_value(raw: &str, env: &dyn Environment) -> Option<String> {
    if !raw.contains('%') {
        return Some(raw.to_string());
    }
    let expanded = expand_env_vars(raw, env);
    if expanded.is_none() {
        debug!("Unresolved placeholder in registry value {}", raw);
    }
    expanded
}

/// `"C:\Foo\foo.exe",0` → `C:\Foo\foo.exe`; non-executables yield `None`.
pub fn icon_executable(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = match trimmed.strip_prefix('"') {
        Some(rest) => rest.split('"').next().unwrap_or(rest),
        None => trimmed
            .rsplit_once(',')
            .filter(|(_, index)| index.trim().parse::<i32>().is_ok())
            .map(|(path, _)| path)
            .unwrap_or(trimmed),
    };
    let path = unquoted.trim();
    if path.to_lowercase().ends_with(".exe") {
        Some(path.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env() -> HashMap<String, String> {
        HashMap::from([("ProgramFiles".to_string(), "C:\\Program Files".to_string())])
    }

    #[test]
    fn test_icon_executable() {
        assert_eq!(
            icon_executable("\"C:\\Games\\Foo Quest\\FooQuest.exe\",0").as_deref(),
            Some("C:\\Games\\Foo Quest\\FooQuest.exe")
        );
        assert_eq!(
            icon_executable("C:\\Games\\Bar\\bar.exe,-101").as_deref(),
            Some("C:\\Games\\Bar\\bar.exe")
        );
        assert_eq!(icon_executable("C:\\Bar\\bar.ico"), None);
    }

    #[test]
    fn test_expandable_icon_is_expanded() {
        let entry = UninstallEntry {
            key: "Foo".into(),
            display_icon: Some("%ProgramFiles%\\Foo\\foo.exe,0".into()),
            install_location: None,
        };
        assert_eq!(
            entry.executables(&env()),
            vec!["C:\\Program Files\\Foo\\foo.exe".to_string()]
        );
    }

    #[test]
    fn test_unknown_placeholder_dropped() {
        let entry = UninstallEntry {
            key: "Foo".into(),
            display_icon: Some("%NOPE%\\Foo\\foo.exe".into()),
            install_location: None,
        };
        assert!(entry.executables(&env()).is_empty());
    }

    #[test]
    fn test_entry_lists_install_location_executables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bar.exe"), b"MZ").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hi").unwrap();
        let env = HashMap::from([(
            "BAR_HOME".to_string(),
            dir.path().to_string_lossy().into_owned(),
        )]);
        let entry = UninstallEntry {
            key: "Bar".into(),
            display_icon: Some("C:\\Bar\\bar.ico".into()),
            install_location: Some("%BAR_HOME%".into()),
        };
        let exes = entry.executables(&env);
        assert_eq!(exes.len(), 1);
        assert!(exes[0].ends_with("bar.exe"));
    }
}
