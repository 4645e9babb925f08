//! Reference classification and local block resolution.
//!
//! Every raw specifier found in a block file is one of:
//!
//! - [`Classification::Skip`]: a sibling reference inside a multi-file block
//!   (`./add` from `utils/math/index.ts`), or a reference back into the
//!   originating block. Neither is a dependency.
//! - [`Classification::Local`]: a reference into another block of one of the
//!   tree roots, carrying the block identifier and a rewrite template.
//! - [`Classification::External`]: a registry package, pinned later.
//!
//! Rules are applied in this order:
//!
//! 1. Multi-file block and a `./x` or `.` specifier that resolves inside the
//!    origin file's directory → skip. `./../x` is not a sibling and falls
//!    through to rule 2.
//! 2. Relative specifier → resolved lexically against the origin file's
//!    directory. Below a tree root the first two segments give
//!    `<category>/<name>`; the rest becomes the template suffix. Anything that
//!    leaves every tree root is an [`BlockpmError::UnresolvableReference`].
//! 3. Aliased specifier (see [`AliasMatcher`]) → expanded, checked for an
//!    existing file, then derived like rule 2.
//! 4. Anything else → external.
//!
//! ```rust
//! use blockpm_cli::classify::{Classification, classify};
//! use std::path::{Path, PathBuf};
//!
//! let roots = vec![PathBuf::from("/tree/blocks")];
//! let result = classify(
//!     "../../format/print",
//!     Path::new("/tree/blocks/utils/math/index.ts"),
//!     true,
//!     &roots,
//!     None,
//! )
//! .unwrap();
//!
//! match result {
//!     Classification::Local(local) => {
//!         assert_eq!(local.block_id, "format/print");
//!         assert_eq!(local.template, "{{format/print}}");
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod alias;

pub use alias::AliasMatcher;

use std::path::{Component, Path, PathBuf};

use crate::core::BlockpmError;
use crate::utils::fs::{normalize_path, to_forward_slashes};

/// A reference into another block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMatch {
    /// `<category>/<name>` of the referenced block
    pub block_id: String,
    /// Rewrite template, `{{<category>/<name>}}` plus suffix
    pub template: String,
}

/// Outcome of classifying one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Structural or self reference, not a dependency
    Skip,
    /// Reference to another block
    Local(LocalMatch),
    /// Registry package
    External,
}

/// Classifies `specifier` found in `origin_file`.
///
/// `tree_roots` are the block directories of the tree being built; paths are
/// compared lexically, so they must be expressed the same way as `origin_file`
/// (both absolute, or both relative to the same directory).
///
/// # Errors
///
/// Returns [`BlockpmError::UnresolvableReference`] when a relative or aliased
/// specifier points outside every tree root, or at a tree root or category
/// directory rather than a block.
pub fn classify(
    specifier: &str,
    origin_file: &Path,
    is_multi_file: bool,
    tree_roots: &[PathBuf],
    alias_matcher: Option<&AliasMatcher>,
) -> Result<Classification, BlockpmError> {
    let origin_dir = origin_file.parent().unwrap_or_else(|| Path::new(""));

    if is_multi_file
        && (specifier == "." || specifier.starts_with("./"))
        && normalize_path(&origin_dir.join(specifier)).starts_with(normalize_path(origin_dir))
    {
        return Ok(Classification::Skip);
    }

    let local = if is_relative(specifier) {
        let resolved = normalize_path(&origin_dir.join(specifier));
        derive_local(specifier, &resolved, origin_file, tree_roots)?
    } else if let Some(matcher) = alias_matcher.filter(|m| m.matches(specifier)) {
        let Some(candidate) = matcher.expand(specifier).into_iter().find(|c| locate(c).is_some())
        else {
            tracing::debug!("Alias '{}' in {} matches no file", specifier, origin_file.display());
            return Ok(Classification::External);
        };
        derive_local(specifier, &candidate, origin_file, tree_roots)?
    } else {
        return Ok(Classification::External);
    };

    let origin_block = block_of(origin_file, tree_roots);
    if origin_block.as_deref() == Some(local.block_id.as_str()) {
        return Ok(Classification::Skip);
    }

    Ok(Classification::Local(local))
}

/// `./`, `../`, `.` and `..`.
#[must_use]
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Maps a resolved path below a tree root to a block identifier and template.
fn derive_local(
    specifier: &str,
    resolved: &Path,
    origin_file: &Path,
    tree_roots: &[PathBuf],
) -> Result<LocalMatch, BlockpmError> {
    let unresolvable = |reason: String| BlockpmError::UnresolvableReference {
        specifier: specifier.to_string(),
        file: to_forward_slashes(origin_file),
        reason,
    };

    let Some(segments) = segments_below_root(resolved, tree_roots) else {
        return Err(unresolvable(format!(
            "resolves to {}, outside every block directory",
            to_forward_slashes(resolved)
        )));
    };

    let (name, suffix) = match segments.as_slice() {
        [_category, second, rest @ ..] => {
            let (name, ext) = split_extension(second);
            let mut suffix = ext.map(|e| format!(".{e}")).unwrap_or_default();
            for segment in rest {
                suffix.push('/');
                suffix.push_str(segment);
            }
            (name, suffix)
        }
        _ => {
            return Err(unresolvable(format!(
                "resolves to {}, which is not inside a block",
                to_forward_slashes(resolved)
            )));
        }
    };

    let block_id = format!("{}/{name}", segments[0]);
    Ok(LocalMatch {
        template: format!("{{{{{block_id}}}}}{suffix}"),
        block_id,
    })
}

/// Block identifier of a file inside one of the tree roots.
fn block_of(file: &Path, tree_roots: &[PathBuf]) -> Option<String> {
    let segments = segments_below_root(&normalize_path(file), tree_roots)?;
    match segments.as_slice() {
        [category, second, ..] => Some(format!("{category}/{}", split_extension(second).0)),
        _ => None,
    }
}

fn segments_below_root(path: &Path, tree_roots: &[PathBuf]) -> Option<Vec<String>> {
    tree_roots.iter().find_map(|root| {
        let relative = path.strip_prefix(normalize_path(root)).ok()?;
        Some(
            relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect(),
        )
    })
}

/// Splits `math.ts` into `("math", Some("ts"))`. Dotfiles keep their name.
fn split_extension(segment: &str) -> (&str, Option<&str>) {
    match segment.rfind('.') {
        Some(i) if i > 0 && i + 1 < segment.len() => (&segment[..i], Some(&segment[i + 1..])),
        _ => (segment, None),
    }
}

/// Finds an existing file or directory for an alias candidate.
///
/// Tries the path as written, then the TypeScript source of a `.js`-style
/// extension, then a file with the same stem in the containing directory.
fn locate(candidate: &Path) -> Option<PathBuf> {
    if candidate.exists() {
        return Some(candidate.to_path_buf());
    }

    let swapped = candidate.extension().and_then(|e| e.to_str()).and_then(|ext| match ext {
        "js" => Some("ts"),
        "jsx" => Some("tsx"),
        "mjs" => Some("mts"),
        "cjs" => Some("cts"),
        _ => None,
    });
    if let Some(ext) = swapped {
        let source = candidate.with_extension(ext);
        if source.is_file() {
            return Some(source);
        }
    }

    let stem = candidate.file_stem()?;
    let parent = candidate.parent()?;
    let entries = std::fs::read_dir(parent).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.is_file() && path.file_stem() == Some(stem))
}
