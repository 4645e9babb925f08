//! Cross-platform utilities and helpers.
//!
//! - [`fs`] - atomic writes and lexical path helpers
//! - [`jsonc`] - reading JSON-with-comments configuration files such as `tsconfig.json`

pub mod fs;
pub mod jsonc;

pub use fs::{atomic_write, ensure_dir, normalize_path, relative_path, safe_write};
