//! Path and object-key helpers.
//!
//! Object keys are always POSIX-style. A file discovered at `<root>/a/b.bin`
//! gets the manifest key `a/b.bin`, and is uploaded under `<prefix>/a/b.bin`.

use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Convert a path to absolute without resolving symlinks.
///
/// # Errors
/// Returns error if current directory cannot be determined.
pub fn to_absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::env::current_dir()
            .map(|cwd: PathBuf| cwd.join(path))
            .map_err(|e: std::io::Error| PathError::from_io(path.display().to_string(), e))
    }
}

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` components lexically.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::ParentDir) | Some(Component::RootDir)
                    )
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Convert a path to POSIX-style string (forward slashes).
pub fn to_posix_path(path: &Path) -> String {
    path.components()
        .map(|c: Component| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute the manifest key of `path` relative to `root`.
///
/// # Arguments
/// * `path` - File path (relative or absolute)
/// * `root` - Directory the manifest is built from
///
/// # Returns
/// POSIX-style relative path, e.g. `sub/file.bin`.
///
/// # Errors
/// Returns error if path is outside the root directory.
pub fn relative_posix_path(path: &Path, root: &Path) -> Result<String, PathError> {
    let normalized: PathBuf = lexical_normalize(&to_absolute(path)?);
    let normalized_root: PathBuf = lexical_normalize(&to_absolute(root)?);

    let relative: &Path = normalized
        .strip_prefix(&normalized_root)
        .map_err(|_| PathError::PathOutsideRoot {
            path: normalized.display().to_string(),
            root: normalized_root.display().to_string(),
        })?;

    Ok(to_posix_path(relative))
}

/// Derive the manifest key for an object key uploaded under `prefix`.
///
/// Everything after the first occurrence of `"{prefix}/"` is the manifest
/// key. Keys that do not contain the prefix yield an empty string, which
/// never matches a manifest entry.
///
/// # Arguments
/// * `key` - Full object key, e.g. `submissions/123/data/file.bin`
/// * `prefix` - Key prefix the uploads were listed under
pub fn relative_object_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    let separator: String = format!("{}/", prefix.trim_end_matches('/'));
    key.split_once(separator.as_str())
        .map(|(_, rest)| rest)
        .unwrap_or("")
}
