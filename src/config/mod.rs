//! Project configuration (`blockpm.toml`).
//!
//! One file serves both sides of blockpm: a tree that publishes blocks uses
//! the `[build]` table, a project that installs them uses `repos`, `[paths]`
//! and `[trees]`.
//!
//! ```toml
//! # Trees searched for bare block identifiers, in order
//! repos = ["github/acme/blocks", "github/acme/extras@next"]
//! include-tests = false
//!
//! # Where installed blocks go, per category
//! [paths]
//! "*" = "./src/blocks"
//! utils = "./src/lib/utils"
//! ui = "$lib/components"
//!
//! # Local directories backing each tree
//! [trees]
//! "github/acme/blocks" = "../acme-blocks"
//! "github/acme/extras" = "../acme-extras"
//!
//! # Publishing
//! [build]
//! dirs = ["./blocks"]
//! exclude-deps = ["react"]
//! strict = false
//! do-not-list-blocks = ["internal-*"]
//! ```
//!
//! Relative paths are relative to the directory containing `blockpm.toml`.
//! The file is found by searching the current directory and its parents, or
//! given explicitly with `--config`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::builder::BuildOptions;
use crate::constants::CONFIG_FILE;
use crate::core::BlockpmError;
use crate::registry::TreeSpec;
use crate::source::DirectorySource;
use crate::utils::fs::{find_upward, normalize_path};

/// Contents of `blockpm.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Trees in resolution order, as `<provider>/<owner>/<repo>[@<ref>]`
    #[serde(default)]
    pub repos: Vec<String>,

    /// Install the test files of each block
    #[serde(default)]
    pub include_tests: bool,

    /// Destination directory per category, `*` for the rest
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    /// Local directory per tree identifier
    #[serde(default)]
    pub trees: BTreeMap<String, String>,

    /// Publishing settings
    #[serde(default)]
    pub build: BuildConfig,
}

/// The `[build]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Block directories, each laid out as `<category>/<block>`
    #[serde(default = "default_block_dirs")]
    pub dirs: Vec<String>,

    /// Package names never recorded as dependencies
    #[serde(default)]
    pub exclude_deps: Vec<String>,

    /// Fail on unsupported layouts instead of warning
    #[serde(default)]
    pub strict: bool,

    /// Only publish blocks matching these patterns
    #[serde(default)]
    pub include_blocks: Vec<String>,

    /// Only publish categories matching these patterns
    #[serde(default)]
    pub include_categories: Vec<String>,

    /// Do not publish blocks matching these patterns
    #[serde(default)]
    pub exclude_blocks: Vec<String>,

    /// Do not publish categories matching these patterns
    #[serde(default)]
    pub exclude_categories: Vec<String>,

    /// Publish but hide from listings
    #[serde(default)]
    pub do_not_list_blocks: Vec<String>,

    /// Publish but hide from listings
    #[serde(default)]
    pub do_not_list_categories: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dirs: default_block_dirs(),
            exclude_deps: Vec::new(),
            strict: false,
            include_blocks: Vec::new(),
            include_categories: Vec::new(),
            exclude_blocks: Vec::new(),
            exclude_categories: Vec::new(),
            do_not_list_blocks: Vec::new(),
            do_not_list_categories: Vec::new(),
        }
    }
}

fn default_block_dirs() -> Vec<String> {
    vec!["./blocks".to_string()]
}

/// A loaded configuration together with the directory it applies to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path of the configuration file
    pub path: PathBuf,
    /// Directory containing the configuration file
    pub root: PathBuf,
    /// Parsed contents
    pub config: ProjectConfig,
}

impl LoadedConfig {
    /// Loads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::ConfigParseError`] when the file is not valid,
    /// or an IO error when it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let path = normalize_path(&absolute(path)?);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: ProjectConfig = toml::from_str(&content).map_err(|e| BlockpmError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.message().to_string(),
        })?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(Self {
            path,
            root,
            config,
        })
    }

    /// Resolves a configured path against the configuration's directory.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        normalize_path(&self.root.join(path))
    }

    /// The configured trees, in resolution order.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::InvalidSpecifier`] for a malformed entry of `repos`.
    pub fn tree_specs(&self) -> Result<Vec<TreeSpec>> {
        self.config.repos.iter().map(|repo| Ok(repo.parse::<TreeSpec>()?)).collect()
    }

    /// A [`DirectorySource`] serving every tree listed under `[trees]`.
    ///
    /// Keys may carry a ref (`github/acme/blocks@next`); the ref is ignored
    /// since a directory holds a single checkout.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::InvalidSpecifier`] for a malformed key.
    pub fn directory_source(&self) -> Result<DirectorySource> {
        let mut source = DirectorySource::new();
        for (tree, dir) in &self.config.trees {
            let spec: TreeSpec = tree.parse()?;
            source.insert(spec.id(), self.resolve(dir));
        }
        Ok(source)
    }

    /// Block directories of the `[build]` table.
    #[must_use]
    pub fn block_dirs(&self) -> Vec<PathBuf> {
        self.config.build.dirs.iter().map(|dir| self.resolve(dir)).collect()
    }

    /// Builder options of the `[build]` table.
    ///
    /// Manifest and alias lookups stop at the configuration directory, and
    /// block directories are recorded relative to it.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        let build = &self.config.build;
        BuildOptions {
            include_blocks: build.include_blocks.clone(),
            include_categories: build.include_categories.clone(),
            exclude_blocks: build.exclude_blocks.clone(),
            exclude_categories: build.exclude_categories.clone(),
            do_not_list_blocks: build.do_not_list_blocks.clone(),
            do_not_list_categories: build.do_not_list_categories.clone(),
            exclude_deps: build.exclude_deps.clone(),
            strict: build.strict,
            search_boundary: Some(self.root.clone()),
            manifest_root: Some(self.root.clone()),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Cannot determine current working directory")?;
        Ok(cwd.join(path))
    }
}

/// Finds `blockpm.toml` in `start` or one of its parents.
///
/// # Errors
///
/// Returns [`BlockpmError::ConfigNotFound`] when no directory up to the
/// filesystem root contains one.
pub fn find_config_from(start: &Path) -> Result<PathBuf> {
    find_upward(start, CONFIG_FILE, None).ok_or_else(|| BlockpmError::ConfigNotFound.into())
}

/// Finds the configuration file, preferring an explicit path.
///
/// # Errors
///
/// Returns [`BlockpmError::ConfigNotFound`] when the explicit path does not
/// exist or the search finds nothing.
pub fn find_config_with_optional(explicit_path: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) => {
            if path.exists() {
                Ok(path)
            } else {
                Err(BlockpmError::ConfigNotFound.into())
            }
        }
        None => {
            let current = std::env::current_dir().context("Cannot determine current working directory")?;
            find_config_from(&current)
        }
    }
}
