//! Settings location and scratch/sample file handling
//!
//! The scratch directory holds copies of sample configs so that probes which
//! make the daemon write its config back never touch the originals.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Name used for the settings directory
const APP_NAME: &str = "vty-config-check";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/vty-config-check/`
/// - macOS: `~/Library/Application Support/vty-config-check/`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the settings file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Wipe `dir` if it exists and create it empty
pub fn recreate_dir(dir: &Path) -> io::Result<()> {
    remove_dir(dir)?;
    fs::create_dir_all(dir)
}

/// Remove `dir` and everything in it; a missing directory is fine
pub fn remove_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Copy `config` into a freshly recreated `scratch_dir`
///
/// The copy gets a unique name prefixed with the original file name, so the
/// daemon's own diagnostics still show where it came from.
pub fn copy_config(scratch_dir: &Path, config: &Path) -> io::Result<PathBuf> {
    let content = fs::read(config)?;
    recreate_dir(scratch_dir)?;

    let prefix = config
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());

    let (mut file, path) = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(scratch_dir)?
        .keep()
        .map_err(|e| e.error)?;
    file.write_all(&content)?;
    file.flush()?;

    Ok(path)
}

/// Recursively collect files under `root` ending in `.extension`
///
/// A missing root yields no files. Entries that cannot be read are logged
/// and skipped. The result is sorted.
pub fn discover_configs(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if root.is_dir() {
        walk(root, extension, &mut found);
    }
    found.sort();
    found
}

fn walk(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => walk(&path, extension, found),
            Ok(_) => {
                if path.extension().is_some_and(|ext| ext == extension) {
                    found.push(path);
                }
            }
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
}

/// Lexically normalize a path: drop `.` components and fold `dir/..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
