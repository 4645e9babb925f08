//! Destination path resolution.
//!
//! The `[paths]` table of `blockpm.toml` maps categories to destination
//! directories, with `*` as the default for every other category:
//!
//! ```toml
//! [paths]
//! "*" = "./src/blocks"
//! utils = "./src/lib/utils"
//! ui = "$lib/components"
//! ```
//!
//! Relative entries (`./`, `../`, `/`) are directories relative to the project
//! root; rewritten references to them are relative paths. Any other entry is an
//! alias: references use it verbatim, and files are written to wherever the
//! project's alias configuration maps it. A category without an entry goes to
//! `<default>/<category>`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::classify::AliasMatcher;
use crate::constants::DEFAULT_PATH_KEY;
use crate::core::BlockpmError;
use crate::utils::fs::normalize_path;

/// How references to a destination are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBase {
    /// Reference through a path alias, e.g. `$lib/components`
    Alias(String),
    /// Reference by relative path from the importing file
    Relative,
}

/// Where one category is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// How references to blocks of the category are written
    pub import_base: ImportBase,
    /// Directory the category's blocks are written to, when known
    pub dir: Option<PathBuf>,
}

impl ResolvedPath {
    fn join(&self, segment: &str) -> Self {
        Self {
            import_base: match &self.import_base {
                ImportBase::Alias(alias) => ImportBase::Alias(format!("{}/{segment}", alias.trim_end_matches('/'))),
                ImportBase::Relative => ImportBase::Relative,
            },
            dir: self.dir.as_ref().map(|d| d.join(segment)),
        }
    }
}

/// Destination configuration resolved against the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    default: ResolvedPath,
    categories: BTreeMap<String, ResolvedPath>,
}

impl ResolvedPaths {
    /// Destination of `category`, falling back to `<default>/<category>`.
    #[must_use]
    pub fn for_category(&self, category: &str) -> ResolvedPath {
        self.categories.get(category).cloned().unwrap_or_else(|| self.default.join(category))
    }
}

/// Returns `true` when a configured destination is a filesystem path rather than an alias.
#[must_use]
pub fn is_relative_destination(value: &str) -> bool {
    value.starts_with('.') || value.starts_with('/')
}

/// Resolves the `[paths]` table against `project_root`.
///
/// # Errors
///
/// Returns [`BlockpmError::MissingDefaultPath`] when there is no `*` entry.
pub fn resolve_paths(
    config: &BTreeMap<String, String>,
    project_root: &Path,
    alias_matcher: Option<&AliasMatcher>,
) -> Result<ResolvedPaths, BlockpmError> {
    let resolve_one = |value: &str| -> ResolvedPath {
        if is_relative_destination(value) {
            ResolvedPath {
                import_base: ImportBase::Relative,
                dir: Some(normalize_path(&project_root.join(value))),
            }
        } else {
            let dir = alias_matcher.and_then(|m| m.expand(value).into_iter().next());
            if dir.is_none() {
                tracing::debug!("Alias destination '{}' does not map to a directory", value);
            }
            ResolvedPath {
                import_base: ImportBase::Alias(value.trim_end_matches('/').to_string()),
                dir,
            }
        }
    };

    let default = config.get(DEFAULT_PATH_KEY).ok_or(BlockpmError::MissingDefaultPath)?;
    let categories = config
        .iter()
        .filter(|(key, _)| key.as_str() != DEFAULT_PATH_KEY)
        .map(|(key, value)| (key.clone(), resolve_one(value)))
        .collect();

    Ok(ResolvedPaths {
        default: resolve_one(default),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_missing_default() {
        let err = resolve_paths(&config(&[("utils", "./src/utils")]), Path::new("/p"), None).unwrap_err();
        assert!(matches!(err, BlockpmError::MissingDefaultPath));
    }

    #[test]
    fn test_relative_entries_and_fallback() {
        let paths = resolve_paths(
            &config(&[("*", "./src/blocks"), ("utils", "./src/lib/utils/")]),
            Path::new("/p"),
            None,
        )
        .unwrap();

        assert_eq!(paths.for_category("utils").dir, Some(PathBuf::from("/p/src/lib/utils")));
        let ui = paths.for_category("ui");
        assert_eq!(ui.import_base, ImportBase::Relative);
        assert_eq!(ui.dir, Some(PathBuf::from("/p/src/blocks/ui")));
    }

    #[test]
    fn test_alias_entries() {
        let matcher = AliasMatcher::new(
            "/p",
            vec![("$lib".to_string(), vec!["src/lib".to_string()]), ("$lib/*".to_string(), vec!["src/lib/*".to_string()])],
        );
        let paths = resolve_paths(
            &config(&[("*", "$lib/blocks/"), ("ui", "$lib/components")]),
            Path::new("/p"),
            Some(&matcher),
        )
        .unwrap();

        let ui = paths.for_category("ui");
        assert_eq!(ui.import_base, ImportBase::Alias("$lib/components".to_string()));
        assert_eq!(ui.dir, Some(PathBuf::from("/p/src/lib/components")));

        let utils = paths.for_category("utils");
        assert_eq!(utils.import_base, ImportBase::Alias("$lib/blocks/utils".to_string()));
        assert_eq!(utils.dir, Some(PathBuf::from("/p/src/lib/blocks/utils")));
    }

    #[test]
    fn test_alias_without_matcher_has_no_directory() {
        let paths = resolve_paths(&config(&[("*", "@/blocks")]), Path::new("/p"), None).unwrap();
        assert_eq!(paths.for_category("utils").dir, None);
    }
}
