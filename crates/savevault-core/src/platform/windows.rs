use super::Volume;
use std::fs::Metadata;
use std::os::windows::fs::MetadataExt;
use std::path::{Component, Path, PathBuf, Prefix};
use winapi::um::fileapi::{GetDriveTypeW, GetLogicalDrives};
use winapi::um::winbase::{DRIVE_FIXED, DRIVE_REMOVABLE};
use winapi::um::winnt::{FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_SYSTEM};

/// Fixed and removable drives that currently answer a directory probe.
pub fn local_volumes() -> Vec<Volume> {
    // SAFETY: plain Win32 queries with no pointers held past the call.
    let mask = unsafe { GetLogicalDrives() };
    let mut volumes = Vec::new();

    for index in 0..26u32 {
        if mask & (1 << index) == 0 {
            continue;
        }
        let letter = (b'A' + index as u8) as char;
        let root = format!("{}:\\", letter);
        let wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
        let drive_type = unsafe { GetDriveTypeW(wide.as_ptr()) };
        if drive_type != DRIVE_FIXED && drive_type != DRIVE_REMOVABLE {
            continue;
        }
        let root = PathBuf::from(root);
        if std::fs::read_dir(&root).is_err() {
            tracing::debug!("Drive {} is not ready, skipping", root.display());
            continue;
        }
        volumes.push(Volume { root });
    }

    volumes
}

pub fn is_hidden_or_system(metadata: &Metadata) -> bool {
    metadata.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0
}

pub fn strip_verbatim_prefix(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Prefix(prefix)) => match prefix.kind() {
            Prefix::VerbatimDisk(letter) => {
                let mut result = PathBuf::from(format!("{}:\\", letter as char));
                for component in components {
                    if !matches!(component, Component::RootDir) {
                        result.push(component.as_os_str());
                    }
                }
                result
            }
            _ => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
