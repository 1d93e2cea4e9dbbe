//! Path helpers shared by the descriptor codec and the orchestrator.
//!
//! Everything except [`write_atomic`] is lexical: project files routinely
//! reference inputs that do not exist yet on the machine loading them.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Separator pandoc expects between `--resource-path` entries.
#[cfg(windows)]
pub const LIST_SEPARATOR: &str = ";";
/// Separator pandoc expects between `--resource-path` entries.
#[cfg(not(windows))]
pub const LIST_SEPARATOR: &str = ":";

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// A `..` that would climb above the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` when it is relative; absolute paths pass through.
pub fn resolve_against(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(base) if !path.is_absolute() => normalize(&base.join(path)),
        _ => path.to_path_buf(),
    }
}

/// Express `path` relative to `base` when it lives underneath it.
///
/// Paths outside `base` (or with no base at all) are returned unchanged.
pub fn relativize(base: Option<&Path>, path: &Path) -> PathBuf {
    let Some(base) = base else {
        return path.to_path_buf();
    };
    let normalized = normalize(path);
    match normalized.strip_prefix(normalize(base)) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

/// Absolute, normalized form of `path` (relative paths are taken from the
/// current directory).
pub fn absolute(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(abs) => normalize(&abs),
        Err(_) => normalize(path),
    }
}

/// Lowercased extension without the dot, if any.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Lossy string form used when a path has to become a command-line token.
pub fn to_token(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Write `content` to `path` through a sibling temp file and a rename.
///
/// Parent directories are created. A failed write leaves any previous file
/// untouched.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}
