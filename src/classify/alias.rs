//! Path aliases from `tsconfig.json` / `jsconfig.json`.
//!
//! `compilerOptions.paths` maps patterns with at most one `*` wildcard to
//! target patterns, resolved against `compilerOptions.baseUrl` (itself relative
//! to the config file's directory, default `.`):
//!
//! ```json
//! {
//!   "compilerOptions": {
//!     "baseUrl": ".",
//!     "paths": {
//!       "$lib": ["src/lib"],
//!       "$lib/*": ["src/lib/*"],
//!       "@/*": ["src/*"]
//!     }
//!   }
//! }
//! ```
//!
//! When several patterns match, the one with the longest literal prefix wins,
//! as in the TypeScript compiler.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::ALIAS_CONFIG_FILES;
use crate::utils::fs::normalize_path;
use crate::utils::jsonc::read_jsonc;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AliasConfigFile {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct AliasPattern {
    prefix: String,
    suffix: Option<String>,
    targets: Vec<String>,
}

impl AliasPattern {
    fn parse(pattern: &str, targets: Vec<String>) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
                targets,
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: None,
                targets,
            },
        }
    }

    /// The text captured by `*`, or `""` for an exact pattern.
    fn capture<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match &self.suffix {
            None => (specifier == self.prefix).then_some(""),
            Some(suffix) => specifier
                .strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str())),
        }
    }
}

/// Expands aliased specifiers into filesystem candidates.
#[derive(Debug, Clone)]
pub struct AliasMatcher {
    base_dir: PathBuf,
    patterns: Vec<AliasPattern>,
}

impl AliasMatcher {
    /// Creates a matcher from `(pattern, targets)` pairs resolved against `base_dir`.
    pub fn new<I>(base_dir: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut patterns: Vec<AliasPattern> =
            paths.into_iter().map(|(pattern, targets)| AliasPattern::parse(&pattern, targets)).collect();
        // Exact patterns before wildcards of the same prefix, longest prefix first
        patterns.sort_by(|a, b| {
            b.prefix.len().cmp(&a.prefix.len()).then(a.suffix.is_some().cmp(&b.suffix.is_some()))
        });

        Self {
            base_dir: normalize_path(&base_dir.into()),
            patterns,
        }
    }

    /// Loads the matcher described by one config file.
    ///
    /// Returns `None` when the file declares no `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_config_file(path: &Path) -> Result<Option<Self>> {
        let config: AliasConfigFile = read_jsonc(path)?;
        let options = config.compiler_options;
        if options.paths.is_empty() {
            return Ok(None);
        }

        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base_dir = config_dir.join(options.base_url.as_deref().unwrap_or("."));
        tracing::debug!(
            "Loaded {} path aliases from {} (base {})",
            options.paths.len(),
            path.display(),
            base_dir.display()
        );
        Ok(Some(Self::new(base_dir, options.paths)))
    }

    /// Finds the nearest alias configuration at or above `start_dir`.
    ///
    /// `tsconfig.json` is preferred over `jsconfig.json` within one directory.
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but cannot be parsed.
    pub fn discover(start_dir: &Path, boundary: Option<&Path>) -> Result<Option<Self>> {
        for dir in start_dir.ancestors() {
            if let Some(found) = ALIAS_CONFIG_FILES.iter().map(|name| dir.join(name)).find(|p| p.is_file()) {
                return Self::from_config_file(&found);
            }
            if boundary.is_some_and(|b| normalize_path(dir) == normalize_path(b)) {
                break;
            }
        }
        Ok(None)
    }

    /// Returns `true` when some pattern matches `specifier`.
    #[must_use]
    pub fn matches(&self, specifier: &str) -> bool {
        self.patterns.iter().any(|p| p.capture(specifier).is_some())
    }

    /// Expands `specifier` with the best matching pattern.
    ///
    /// Candidates are returned in target order; none of them is checked for existence.
    #[must_use]
    pub fn expand(&self, specifier: &str) -> Vec<PathBuf> {
        for pattern in &self.patterns {
            if let Some(captured) = pattern.capture(specifier) {
                return pattern
                    .targets
                    .iter()
                    .map(|target| normalize_path(&self.base_dir.join(target.replacen('*', captured, 1))))
                    .collect();
            }
        }
        Vec::new()
    }
}
