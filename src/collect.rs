//! Input collection - expands CLI inputs into files under one shared base
//!
//! Asset keys are derived against a single base directory per run, so every
//! input is walked relative to the deepest directory containing all of them.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{BlokError, Result};
use crate::utils::path_normalizer::lexical_absolute;

/// Compile exclude patterns into one matcher
pub fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| BlokError::Configuration(format!("invalid glob {}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BlokError::Configuration(format!("invalid exclude set: {}", e)))
}

/// Deepest directory containing every input.
///
/// A directory input contributes itself, a file input its parent. With a
/// single directory input the base is that directory.
pub fn common_base(inputs: &[PathBuf]) -> Result<PathBuf> {
    let mut common: Option<PathBuf> = None;

    for input in inputs {
        let root = if input.is_dir() {
            input.as_path()
        } else {
            match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            }
        };
        let root = lexical_absolute(root)?;

        common = Some(match common {
            None => root,
            Some(prev) => prev
                .components()
                .zip(root.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }

    match common {
        Some(base) => Ok(base),
        None => Ok(std::env::current_dir()?),
    }
}

/// Expand inputs into files in a stable order. Directories are walked sorted
/// by file name; excludes match paths relative to their input directory.
pub fn collect_paths(inputs: &[PathBuf], excludes: &GlobSet) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to access entry during directory walk: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
            if excludes.is_match(relative) {
                debug!("Excluded {}", relative.display());
                continue;
            }

            paths.push(entry.path().to_path_buf());
        }
    }

    paths
}
