//! Utilities for path collection and display formatting.

use crate::error::{Result, StitchError};
use std::path::{Path, PathBuf};

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`.
///
/// A pattern without glob metacharacters is passed through as a literal path
/// even when it does not exist, so the importer can report it as missing.
///
/// Errors:
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if is_literal(pattern) {
            resolved_paths.push(PathBuf::from(pattern));
        } else {
            resolved_paths.extend(collect_paths_for_pattern(pattern)?);
        }
    }

    Ok(resolved_paths)
}

/// Expand a single glob pattern into filesystem paths, sorted.
///
/// Pattern examples:
/// - `"**/*.pdf"`
/// - `"./scans/*.png"`
fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut resolved_paths = Vec::new();

    let paths = glob::glob(pattern).map_err(|err| StitchError::other(err.to_string()))?;

    for entry in paths {
        let path = entry.map_err(|err| StitchError::other(err.to_string()))?;
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    Ok(resolved_paths)
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '['])
}

/// Lower-cased extension of a path, if any.
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// File-name-safe rendition of `name`: alphanumerics, space, `.` and `_`
/// are kept, everything else is dropped.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
