//! Install-time rewriting of block references.
//!
//! A published block records, for every local reference, the literal
//! specifier as written and a position-independent template:
//!
//! ```text
//! "../gcf"             → {{utils/gcf}}
//! "../utils/math/add"  → {{utils/math}}/add
//! "$lib/utils/math.js" → {{utils/math}}.js
//! ```
//!
//! When a block file is installed, each template is turned back into a
//! concrete specifier for the file's new location, and the literal is replaced
//! wherever it appears as a complete quoted string (`'…'`, `"…"` or `` `…` ``).
//! The substitution is textual: the file is not re-parsed.
//!
//! ```rust
//! use blockpm_cli::templating::{resolve_paths, rewrite};
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let config = BTreeMap::from([
//!     ("*".to_string(), "./src/blocks".to_string()),
//!     ("utils".to_string(), "./src/lib/utils".to_string()),
//! ]);
//! let paths = resolve_paths(&config, Path::new("."), None).unwrap();
//! let imports = BTreeMap::from([("../math/add".to_string(), "{{utils/math}}/add".to_string())]);
//!
//! let out = rewrite(
//!     "import { add } from '../math/add';",
//!     &imports,
//!     &paths,
//!     Path::new("./src/lib/utils/print.ts"),
//! )
//! .unwrap();
//! assert_eq!(out, "import { add } from './math/add';");
//! ```

pub mod paths;

pub use paths::{ImportBase, ResolvedPath, ResolvedPaths, resolve_paths};

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use crate::constants::{TEMPLATE_CLOSE, TEMPLATE_OPEN};
use crate::core::BlockpmError;
use crate::utils::fs::{normalize_path, relative_path, to_forward_slashes};

/// A parsed rewrite template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Category of the referenced block
    pub category: String,
    /// Name of the referenced block
    pub name: String,
    /// Extension or sub-path following the block, e.g. `/add` or `.ts`
    pub suffix: String,
}

impl FromStr for Template {
    type Err = BlockpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BlockpmError::InvalidTemplate {
            template: s.to_string(),
        };

        let rest = s.strip_prefix(TEMPLATE_OPEN).ok_or_else(invalid)?;
        let (id, suffix) = rest.split_once(TEMPLATE_CLOSE).ok_or_else(invalid)?;
        let (category, name) = id.split_once('/').ok_or_else(invalid)?;

        if category.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        if !(suffix.is_empty() || suffix.starts_with('.') || suffix.starts_with('/')) {
            return Err(invalid());
        }

        Ok(Self {
            category: category.to_string(),
            name: name.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

/// Resolves one template to the specifier used from `dest_file`.
#[must_use]
pub fn resolve_template(template: &Template, paths: &ResolvedPaths, dest_file: &Path) -> String {
    let destination = paths.for_category(&template.category);
    let target = format!("{}{}", template.name, template.suffix);

    match destination.import_base {
        ImportBase::Alias(alias) => format!("{alias}/{target}"),
        ImportBase::Relative => {
            let Some(dir) = destination.dir else {
                return target;
            };
            let dest_dir = normalize_path(dest_file);
            let dest_dir = dest_dir.parent().unwrap_or_else(|| Path::new(""));
            let relative = to_forward_slashes(&relative_path(dest_dir, &dir.join(&target)));

            if relative.starts_with('.') || relative.starts_with('/') {
                relative
            } else {
                format!("./{relative}")
            }
        }
    }
}

/// Rewrites the local references of one installed file.
///
/// Every literal of `imports` is replaced in a single pass, so a replacement
/// is never itself rewritten by another entry.
///
/// # Errors
///
/// Returns [`BlockpmError::InvalidTemplate`] when a template is malformed.
pub fn rewrite(
    content: &str,
    imports: &BTreeMap<String, String>,
    paths: &ResolvedPaths,
    dest_file: &Path,
) -> Result<String, BlockpmError> {
    if imports.is_empty() {
        return Ok(content.to_string());
    }

    let mut replacements: HashMap<&str, String> = HashMap::new();
    for (literal, template) in imports {
        let template: Template = template.parse()?;
        replacements.insert(literal.as_str(), resolve_template(&template, paths, dest_file));
    }

    // Longest first so that `../a/b` wins over `../a`
    let mut literals: Vec<&str> = replacements.keys().copied().collect();
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternatives = literals.iter().map(|l| regex::escape(l)).collect::<Vec<_>>().join("|");
    let pattern = format!("'({alternatives})'|\"({alternatives})\"|`({alternatives})`");

    let quoted = Regex::new(&pattern).map_err(|e| BlockpmError::Other {
        message: format!("Failed to build rewrite pattern: {e}"),
    })?;

    let rewritten = quoted.replace_all(content, |caps: &regex::Captures<'_>| {
        let whole = &caps[0];
        let quote = &whole[..1];
        let literal = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        match replacements.get(literal) {
            Some(replacement) => format!("{quote}{replacement}{quote}"),
            None => whole.to_string(),
        }
    });

    Ok(rewritten.into_owned())
}
