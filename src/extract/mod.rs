//! Reference extraction from block source files.
//!
//! Each file is assigned a [`Dialect`] by the first matching entry of a fixed
//! table, and the dialect decides how references are found:
//!
//! | Dialect      | Files                                   | References                          |
//! |--------------|-----------------------------------------|-------------------------------------|
//! | `script`     | `.js .jsx .mjs .cjs .ts .tsx .mts .cts` | parsed `import`/`export`/`require`  |
//! | `svelte`     | `.svelte`                               | `<script>` regions, parsed          |
//! | `vue`        | `.vue`                                  | `<script>` regions, parsed          |
//! | `stylesheet` | `.css .scss`                            | `@import`, `@use`, `@forward`       |
//! | `data`       | anything else                           | none                                |
//!
//! Extraction never guesses: a file whose script does not parse yields a
//! [`BlockpmError::ParseError`] tagged with the file path and line.
//!
//! # Examples
//!
//! ```rust
//! use blockpm_cli::extract::{Dialect, extract};
//! use std::path::Path;
//!
//! let source = "import { gcf } from '../gcf';\nimport lodash from 'lodash';\n";
//! let path = Path::new("blocks/utils/math.ts");
//! let specifiers = extract(Dialect::for_path(path), source, path).unwrap();
//! assert_eq!(specifiers, vec!["../gcf", "lodash"]);
//! ```

mod embedded;
mod script;
mod stylesheet;

use std::path::Path;

use crate::core::BlockpmError;

pub use script::ScriptFlavor;

/// Source dialect of a block file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// JavaScript and TypeScript modules
    Script(ScriptFlavor),
    /// Svelte components
    Svelte,
    /// Vue single-file components
    Vue,
    /// CSS and SCSS
    Stylesheet,
    /// Anything without references
    Data,
}

struct DialectRecord {
    extensions: &'static [&'static str],
    dialect: Dialect,
    reserved: &'static [&'static str],
}

const DIALECTS: &[DialectRecord] = &[
    DialectRecord {
        extensions: &["js", "jsx", "mjs", "cjs"],
        dialect: Dialect::Script(ScriptFlavor::JavaScript),
        reserved: &[],
    },
    DialectRecord {
        extensions: &["ts", "mts", "cts"],
        dialect: Dialect::Script(ScriptFlavor::TypeScript),
        reserved: &[],
    },
    DialectRecord {
        extensions: &["tsx"],
        dialect: Dialect::Script(ScriptFlavor::Tsx),
        reserved: &[],
    },
    DialectRecord {
        extensions: &["svelte"],
        dialect: Dialect::Svelte,
        reserved: &["svelte"],
    },
    DialectRecord {
        extensions: &["vue"],
        dialect: Dialect::Vue,
        reserved: &["vue"],
    },
    DialectRecord {
        extensions: &["css", "scss"],
        dialect: Dialect::Stylesheet,
        reserved: &[],
    },
];

impl Dialect {
    /// Picks the dialect of `path` from its extension. First match wins.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Data;
        };
        let ext = ext.to_ascii_lowercase();

        DIALECTS
            .iter()
            .find(|record| record.extensions.contains(&ext.as_str()))
            .map_or(Self::Data, |record| record.dialect)
    }

    /// Package names provided by the dialect's own runtime.
    ///
    /// They are never pinned as external dependencies of a block.
    #[must_use]
    pub fn reserved_packages(self) -> &'static [&'static str] {
        DIALECTS
            .iter()
            .find(|record| record.dialect == self)
            .map_or(&[], |record| record.reserved)
    }
}

/// Extracts the raw reference specifiers of one file.
///
/// Specifiers are returned once each, in order of first occurrence.
///
/// # Errors
///
/// Returns [`BlockpmError::ParseError`] when the script portion of the file has
/// a syntax error, or a component's `<script>` element is never closed.
pub fn extract(dialect: Dialect, content: &str, path: &Path) -> Result<Vec<String>, BlockpmError> {
    let to_parse_error = |err: SyntaxError| BlockpmError::ParseError {
        path: path.display().to_string(),
        line: err.line,
        message: err.message,
    };

    let specifiers = match dialect {
        Dialect::Script(flavor) => script::extract(content, flavor).map_err(to_parse_error)?,
        Dialect::Svelte | Dialect::Vue => embedded::extract(content).map_err(to_parse_error)?,
        Dialect::Stylesheet => {
            let scss = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("scss"));
            stylesheet::extract(content, scss).map_err(to_parse_error)?
        }
        Dialect::Data => Vec::new(),
    };

    tracing::trace!("Extracted {} references from {}", specifiers.len(), path.display());
    Ok(specifiers)
}

/// Syntax problem found while scanning, before it is tied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Pushes `value` unless it was already collected.
pub(crate) fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|existing| existing == value) {
        out.push(value.to_string());
    }
}

/// 1-based line number of byte offset `pos`.
pub(crate) fn line_at(content: &str, pos: usize) -> usize {
    content[..pos.min(content.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_table() {
        assert_eq!(Dialect::for_path(Path::new("a.js")), Dialect::Script(ScriptFlavor::JavaScript));
        assert_eq!(Dialect::for_path(Path::new("a.jsx")), Dialect::Script(ScriptFlavor::JavaScript));
        assert_eq!(Dialect::for_path(Path::new("a.ts")), Dialect::Script(ScriptFlavor::TypeScript));
        assert_eq!(Dialect::for_path(Path::new("a.tsx")), Dialect::Script(ScriptFlavor::Tsx));
        assert_eq!(Dialect::for_path(Path::new("a.svelte")), Dialect::Svelte);
        assert_eq!(Dialect::for_path(Path::new("a.vue")), Dialect::Vue);
        assert_eq!(Dialect::for_path(Path::new("a.scss")), Dialect::Stylesheet);
        assert_eq!(Dialect::for_path(Path::new("a.json")), Dialect::Data);
        assert_eq!(Dialect::for_path(Path::new("Makefile")), Dialect::Data);
    }

    #[test]
    fn test_reserved_packages() {
        assert_eq!(Dialect::Svelte.reserved_packages(), &["svelte"]);
        assert_eq!(Dialect::Vue.reserved_packages(), &["vue"]);
        assert!(Dialect::Data.reserved_packages().is_empty());
    }

    #[test]
    fn test_data_files_have_no_references() {
        let specifiers =
            extract(Dialect::Data, "{\"import\": \"x\"}", Path::new("data.json")).unwrap();
        assert!(specifiers.is_empty());
    }

    #[test]
    fn test_markup_in_js_file() {
        let path = Path::new("blocks/ui/button.js");
        let specifiers = extract(
            Dialect::for_path(path),
            "import { cx } from 'clsx';\nexport const B = () => <p className={cx('b')}>Don't click</p>;\n",
            path,
        )
        .unwrap();
        assert_eq!(specifiers, vec!["clsx"]);
    }

    #[test]
    fn test_parse_error_carries_path_and_line() {
        let err = extract(
            Dialect::Script(ScriptFlavor::TypeScript),
            "import a from './a';\nconst s = 'oops;\n",
            Path::new("blocks/utils/bad.ts"),
        )
        .unwrap_err();

        match err {
            BlockpmError::ParseError {
                path,
                line,
                ..
            } => {
                assert_eq!(path, "blocks/utils/bad.ts");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
