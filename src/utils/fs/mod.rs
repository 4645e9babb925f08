//! File system utilities.
//!
//! - [`atomic`] - temp-and-rename writes so readers never see partial files
//! - [`paths`] - lexical path normalization, relative paths and upward discovery

pub mod atomic;
pub mod paths;

pub use atomic::{atomic_write, ensure_dir, safe_write};
pub use paths::{find_upward, normalize_path, relative_path, to_forward_slashes};
