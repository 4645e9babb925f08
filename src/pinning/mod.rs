//! External dependency pinning.
//!
//! External specifiers are reduced to package names and pinned to the version
//! declared by the nearest `package.json` above the referencing file:
//!
//! 1. Builtins (`fs`, `node:path`, `bun:test`) are dropped.
//! 2. Names in the exclude list are dropped. The builder seeds it with the
//!    dialect's own runtime package (`svelte`, `vue`) and `[build] exclude-deps`.
//! 3. Malformed names are skipped with a warning.
//! 4. The name is looked up in `dependencies`, then `devDependencies`, and
//!    recorded as `<name>@<version>` in the matching bucket. A name found in
//!    neither, or with no manifest at all, is recorded bare in `dependencies`.
//!
//! Versions are copied verbatim (`^4.17.21` stays `^4.17.21`). Nothing is
//! resolved against a registry, so the same tree always pins the same way.

pub mod package_name;

pub use package_name::{PackageRef, is_builtin, parse_package};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::PACKAGE_MANIFEST_FILE;
use crate::utils::fs::find_upward;

/// Dependency tables of a `package.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Pinned external dependencies of one file or block, sorted and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedDependencies {
    /// `<name>` or `<name>@<version>`
    pub dependencies: BTreeSet<String>,
    /// `<name>@<version>` from `devDependencies`
    pub dev_dependencies: BTreeSet<String>,
}

impl PinnedDependencies {
    /// Adds all entries of `other`.
    pub fn merge(&mut self, other: Self) {
        self.dependencies.extend(other.dependencies);
        self.dev_dependencies.extend(other.dev_dependencies);
    }
}

/// Nearest-`package.json` lookup with per-directory caching.
///
/// One lookup lives for one build; every directory and manifest is read at most once.
#[derive(Debug, Default)]
pub struct ManifestLookup {
    boundary: Option<PathBuf>,
    nearest: HashMap<PathBuf, Option<PathBuf>>,
    manifests: HashMap<PathBuf, Arc<PackageManifest>>,
}

impl ManifestLookup {
    /// Creates a lookup that never walks above `boundary`.
    #[must_use]
    pub fn new(boundary: Option<PathBuf>) -> Self {
        Self {
            boundary,
            ..Self::default()
        }
    }

    /// Returns the manifest nearest to `dir`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the nearest manifest cannot be read or parsed.
    pub fn nearest(&mut self, dir: &Path) -> Result<Option<Arc<PackageManifest>>> {
        let found = match self.nearest.get(dir) {
            Some(found) => found.clone(),
            None => {
                let found = find_upward(dir, PACKAGE_MANIFEST_FILE, self.boundary.as_deref());
                self.nearest.insert(dir.to_path_buf(), found.clone());
                found
            }
        };

        let Some(path) = found else {
            return Ok(None);
        };
        if let Some(manifest) = self.manifests.get(&path) {
            return Ok(Some(Arc::clone(manifest)));
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest: PackageManifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(
            "Loaded {} ({} dependencies, {} devDependencies)",
            path.display(),
            manifest.dependencies.len(),
            manifest.dev_dependencies.len()
        );

        let manifest = Arc::new(manifest);
        self.manifests.insert(path, Arc::clone(&manifest));
        Ok(Some(manifest))
    }
}

/// Pins the external specifiers of `origin_file`.
///
/// # Errors
///
/// Returns an error when the nearest `package.json` exists but cannot be parsed.
pub fn pin(
    external: &[String],
    origin_file: &Path,
    exclude: &[String],
    lookup: &mut ManifestLookup,
) -> Result<PinnedDependencies> {
    let mut pinned = PinnedDependencies::default();
    let origin_dir = origin_file.parent().unwrap_or_else(|| Path::new("."));

    for specifier in external {
        if is_builtin(specifier) {
            tracing::trace!("Skipping builtin module '{}'", specifier);
            continue;
        }

        let package = match parse_package(specifier) {
            Ok(package) => package,
            Err(reason) => {
                tracing::warn!(
                    "Skipping dependency '{}' in {}: {}",
                    specifier,
                    origin_file.display(),
                    reason
                );
                continue;
            }
        };

        if exclude.iter().any(|excluded| *excluded == package.name || excluded == specifier) {
            continue;
        }

        let manifest = lookup.nearest(origin_dir)?;
        let regular = manifest.as_ref().and_then(|m| m.dependencies.get(&package.name));
        let dev = manifest.as_ref().and_then(|m| m.dev_dependencies.get(&package.name));

        match (regular, dev) {
            (Some(version), _) => {
                pinned.dependencies.insert(format!("{}@{version}", package.name));
            }
            (None, Some(version)) => {
                pinned.dev_dependencies.insert(format!("{}@{version}", package.name));
            }
            (None, None) => {
                pinned.dependencies.insert(package.name);
            }
        }
    }

    Ok(pinned)
}
