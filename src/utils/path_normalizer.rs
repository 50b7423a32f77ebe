//! Path normalization for asset keys
//!
//! Handles:
//! - Lexical absolutization (resolves `.` and `..` without touching the filesystem)
//! - Relative paths between two absolute paths, including parent-relative segments
//! - Windows/Unix separator conversion

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against the current directory and fold `.`/`..` segments.
/// No existence check is performed.
pub fn lexical_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if matches!(resolved.components().last(), Some(Component::Normal(_))) {
                    resolved.pop();
                }
            }
            Component::Normal(part) => resolved.push(part),
        }
    }

    Ok(resolved)
}

/// Compute `path` relative to `base`. Both must already be absolute and folded.
/// Paths outside `base` get leading `..` segments; paths on another drive are
/// returned unchanged.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    if path_parts.first() != base_parts.first() {
        return path.to_path_buf();
    }

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }

    relative
}

/// Normalize a relative path string (for asset keys)
pub fn normalize_relative_path(path: &str) -> String {
    path.replace('\\', "/")
}
