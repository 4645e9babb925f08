//! Path utilities for normalization, relative path computation and discovery.
//!
//! All functions here are lexical: they never touch the filesystem except
//! [`find_upward`], which only checks for existence while walking parents.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// Logical resolution only; symbolic links are not followed and the path does
/// not need to exist. Leading `..` components of a relative path are kept.
///
/// # Examples
///
/// ```rust
/// use blockpm_cli::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("/foo/./bar/../baz")), PathBuf::from("/foo/baz"));
/// assert_eq!(normalize_path(Path::new("../src/./lib.rs")), PathBuf::from("../src/lib.rs"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Computes the relative path from `base` (a directory) to `target`.
///
/// Both paths are normalized first and must be either both absolute or both
/// relative to the same origin.
///
/// ```rust
/// use blockpm_cli::utils::fs::relative_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     relative_path(Path::new("src/lib/utils/test"), Path::new("src/lib/utils/math/add")),
///     PathBuf::from("../math/add")
/// );
/// ```
#[must_use]
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = normalize_path(base);
    let target = normalize_path(target);

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let common = base_parts.iter().zip(target_parts.iter()).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &target_parts[common..] {
        result.push(part);
    }
    result
}

/// Renders a path with forward slashes regardless of platform.
#[must_use]
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Walks from `start` up through its ancestors looking for a file named `file_name`.
///
/// Stops after checking `boundary` when one is given and `start` lies inside it.
/// Returns the full path of the first match.
#[must_use]
pub fn find_upward(start: &Path, file_name: &str, boundary: Option<&Path>) -> Option<PathBuf> {
    let boundary = boundary.map(normalize_path);

    for dir in start.ancestors() {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if let Some(boundary) = &boundary
            && normalize_path(dir) == *boundary
        {
            break;
        }
    }

    None
}
