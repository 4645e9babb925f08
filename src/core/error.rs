//! Error handling for blockpm
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`BlockpmError`]) for precise handling in code
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions at the CLI boundary
//!
//! # Error Categories
//!
//! - **Extraction**: [`BlockpmError::ParseError`] for malformed source files
//! - **Classification**: [`BlockpmError::UnresolvableReference`] for references that
//!   cannot be mapped into any tree root
//! - **Resolution**: [`BlockpmError::BlockNotFound`] for requested or transitively
//!   required blocks that no configured tree publishes
//! - **Publishing**: [`BlockpmError::DuplicateBlock`], [`BlockpmError::UnsupportedLayout`]
//! - **Configuration**: [`BlockpmError::ConfigNotFound`], [`BlockpmError::ConfigParseError`],
//!   [`BlockpmError::MissingDefaultPath`], [`BlockpmError::TreeNotConfigured`]
//!
//! Dependency cycles are not errors. A block reachable from itself is resolved once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use blockpm_cli::core::{BlockpmError, user_friendly_error};
//!
//! let error = BlockpmError::BlockNotFound {
//!     specifier: "utils/math".to_string(),
//!     suggestions: vec!["utils/maths".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for blockpm operations.
///
/// Every variant carries enough context (file path, specifier, block identifier)
/// for the user to act on it without re-running with debug logging.
#[derive(Error, Debug, Clone)]
pub enum BlockpmError {
    /// A source file could not be parsed for references.
    ///
    /// Raised by the reference extractor. The manifest builder turns it into a
    /// build failure rather than publishing a partial result.
    #[error("Failed to parse {path}:{line}: {message}")]
    ParseError {
        /// File that failed to parse
        path: String,
        /// 1-based line where the problem was detected
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A relative or aliased reference resolves outside every configured tree root.
    #[error("Cannot resolve '{specifier}' in {file}: {reason}")]
    UnresolvableReference {
        /// The literal specifier as written in source
        specifier: String,
        /// File containing the reference
        file: String,
        /// Why the reference cannot be mapped to a block
        reason: String,
    },

    /// A requested or transitively required block is not published by any configured tree.
    #[error("Block '{specifier}' not found in any configured tree")]
    BlockNotFound {
        /// The specifier that could not be found
        specifier: String,
        /// Similar block identifiers, closest first
        suggestions: Vec<String>,
    },

    /// The same `<category>/<name>` was produced twice while building a manifest.
    #[error("Duplicate block '{id}' found in {first} and {second}")]
    DuplicateBlock {
        /// Block identifier
        id: String,
        /// Directory of the first occurrence
        first: String,
        /// Directory of the second occurrence
        second: String,
    },

    /// A block directory contains a layout the builder does not support.
    #[error("Unsupported layout in block '{block}': {reason}")]
    UnsupportedLayout {
        /// Block identifier
        block: String,
        /// Description of the unsupported layout
        reason: String,
    },

    /// A rewrite template does not have the `{{category/name}}` form.
    #[error("Invalid rewrite template '{template}'")]
    InvalidTemplate {
        /// The malformed template
        template: String,
    },

    /// A block or tree specifier is malformed.
    #[error("Invalid specifier '{specifier}': {reason}")]
    InvalidSpecifier {
        /// The malformed specifier
        specifier: String,
        /// Expected format
        reason: String,
    },

    /// The destination path configuration has no `*` entry.
    #[error("Destination paths must define a default \"*\" entry")]
    MissingDefaultPath,

    /// A tree named in the configuration has no local directory backing it.
    #[error("Tree '{tree}' is not configured")]
    TreeNotConfigured {
        /// Tree identifier
        tree: String,
    },

    /// Project configuration file not found.
    #[error("Configuration file blockpm.toml not found in current directory or any parent directory")]
    ConfigNotFound,

    /// Project configuration file failed to parse.
    #[error("Invalid configuration file syntax in {file}")]
    ConfigParseError {
        /// Path to the configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A published manifest failed to parse.
    #[error("Invalid published manifest for tree '{tree}'")]
    ManifestParseError {
        /// Tree identifier
        tree: String,
        /// Parser message
        reason: String,
    },

    /// File system operation failed.
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// Operation that failed
        operation: String,
        /// Path involved
        path: String,
    },

    /// Catch-all.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// User-facing wrapper around a [`BlockpmError`] with optional suggestion and details.
///
/// Displayed at the CLI boundary with colors: error in red, details in yellow,
/// suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: BlockpmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: BlockpmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Walks the error chain looking for a [`BlockpmError`]; anything else is
/// reported with the full chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(blockpm_error) = cause.downcast_ref::<BlockpmError>() {
            let mut ctx = create_error_context(blockpm_error);
            // Keep outer context messages; they name the operation that failed.
            let outer: Vec<String> = error
                .chain()
                .take_while(|c| c.downcast_ref::<BlockpmError>().is_none())
                .map(ToString::to_string)
                .collect();
            if ctx.details.is_none() && !outer.is_empty() {
                ctx.details = Some(outer.join(": "));
            }
            return ctx;
        }
    }

    // The outermost message names the file; the IO error only says what happened to it.
    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return ErrorContext::new(BlockpmError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Check file permissions and that the path exists")
        .with_details(format!("IO error: {io_error}"));
    }

    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let ctx = ErrorContext::new(BlockpmError::Other {
        message: error.to_string(),
    });
    if chain.is_empty() {
        ctx
    } else {
        ctx.with_details(chain.join("\n  caused by: "))
    }
}

fn create_error_context(error: &BlockpmError) -> ErrorContext {
    match error {
        BlockpmError::ParseError {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Fix the syntax error in the source file and rebuild the manifest"),
        BlockpmError::UnresolvableReference {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion(
                "Only reference files inside the configured block directories, or add the \
                 target directory to [build] dirs",
            )
            .with_details(
                "A published block cannot reproduce a path outside its tree at install time",
            ),
        BlockpmError::BlockNotFound {
            suggestions,
            ..
        } => {
            let ctx = ErrorContext::new(error.clone());
            if suggestions.is_empty() {
                ctx.with_suggestion("Run 'blockpm list' to see the blocks each tree publishes")
            } else {
                ctx.with_suggestion(format!("Did you mean: {}?", suggestions.join(", ")))
            }
        }
        BlockpmError::DuplicateBlock {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Rename one of the blocks or exclude it from the build"),
        BlockpmError::UnsupportedLayout {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Flatten the block directory or disable strict mode")
            .with_details("Multi-file blocks may only contain files, not nested directories"),
        BlockpmError::InvalidTemplate {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Rebuild the published manifest with 'blockpm build'"),
        BlockpmError::InvalidSpecifier {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Use '<category>/<name>' or '<provider>/<owner>/<repo>/<category>/<name>'",
        ),
        BlockpmError::MissingDefaultPath => ErrorContext::new(error.clone())
            .with_suggestion("Add a \"*\" entry under [paths] in blockpm.toml, e.g. \"*\" = \"./src/blocks\""),
        BlockpmError::TreeNotConfigured {
            tree,
        } => ErrorContext::new(error.clone()).with_suggestion(format!(
            "Add a local directory for it under [trees], e.g. \"{tree}\" = \"../path/to/tree\""
        )),
        BlockpmError::ConfigNotFound => ErrorContext::new(error.clone())
            .with_suggestion("Create a blockpm.toml in your project directory")
            .with_details("blockpm searches the current directory and its parents"),
        BlockpmError::ConfigParseError {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Check that blockpm.toml contains valid TOML syntax")
            .with_details(reason.clone()),
        BlockpmError::ManifestParseError {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Republish the tree with 'blockpm build'")
            .with_details(reason.clone()),
        _ => ErrorContext::new(error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_block_not_found_suggestions() {
        let error = BlockpmError::BlockNotFound {
            specifier: "utils/mth".to_string(),
            suggestions: vec!["utils/math".to_string()],
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));
        assert!(ctx.suggestion.as_deref().unwrap_or_default().contains("utils/math"));
        assert!(ctx.to_string().contains("Block 'utils/mth' not found"));
    }

    #[test]
    fn test_context_chain_preserved_as_details() {
        let result: anyhow::Result<()> = Err(BlockpmError::ParseError {
            path: "utils/math.ts".to_string(),
            line: 3,
            message: "unterminated string literal".to_string(),
        })
        .context("Failed to build block 'utils/math'");

        let ctx = user_friendly_error(result.unwrap_err());
        assert!(matches!(ctx.error, BlockpmError::ParseError { line: 3, .. }));
        assert!(ctx.details.unwrap().contains("utils/math"));
    }

    #[test]
    fn test_plain_anyhow_error() {
        let ctx = user_friendly_error(anyhow::anyhow!("something odd"));
        assert_eq!(ctx.error.to_string(), "something odd");
        assert!(ctx.suggestion.is_none());
    }

    #[test]
    fn test_unresolvable_reference_message() {
        let error = BlockpmError::UnresolvableReference {
            specifier: "../../outside".to_string(),
            file: "blocks/utils/math.ts".to_string(),
            reason: "resolves outside every tree root".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("../../outside"));
        assert!(msg.contains("blocks/utils/math.ts"));
    }

    #[test]
    fn test_io_error_keeps_its_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "blocks/utils/math.ts: not found");
        let ctx = user_friendly_error(anyhow::Error::from(io));
        assert!(matches!(ctx.error, BlockpmError::Other { ref message } if message.contains("blocks/utils/math.ts")));
    }
}
