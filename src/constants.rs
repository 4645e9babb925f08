//! Global constants used throughout the blockpm codebase.
//!
//! File names, template delimiters and naming rules that several modules
//! need to agree on are defined here.

/// File name of the published manifest written at the root of a tree.
pub const PUBLISHED_MANIFEST_FILE: &str = "blockpm-manifest.json";

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "blockpm.toml";

/// Package manifest consulted when pinning external dependencies.
pub const PACKAGE_MANIFEST_FILE: &str = "package.json";

/// Alias configuration files, in lookup order within a directory.
pub const ALIAS_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// Opening delimiter of a rewrite template.
pub const TEMPLATE_OPEN: &str = "{{";

/// Closing delimiter of a rewrite template.
pub const TEMPLATE_CLOSE: &str = "}}";

/// Key of the wildcard entry in the destination path configuration.
pub const DEFAULT_PATH_KEY: &str = "*";

/// Infixes marking a file as the test companion of a block (`math.test.ts`).
pub const TEST_FILE_INFIXES: &[&str] = &[".test.", ".spec."];

/// Git ref used when a tree specifier does not name one.
pub const DEFAULT_TREE_REF: &str = "main";

/// Maximum length of a registry package name.
pub const MAX_PACKAGE_NAME_LENGTH: usize = 214;

/// Number of "did you mean" suggestions attached to a missing block.
pub const MAX_SUGGESTIONS: usize = 3;

/// Maximum edit distance, as a percentage of the requested identifier's length,
/// for a block identifier to be suggested.
pub const SIMILARITY_THRESHOLD_PERCENT: usize = 40;
