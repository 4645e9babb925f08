//! Core types for blockpm
//!
//! Error handling lives here; the block data model lives in [`crate::registry`].
//!
//! - [`BlockpmError`] - typed failures of every stage (extraction, classification,
//!   resolution, publishing, configuration)
//! - [`ErrorContext`] - user-facing wrapper with suggestions and details
//! - [`user_friendly_error`] - converts any `anyhow::Error` into an [`ErrorContext`]

pub mod error;

pub use error::{BlockpmError, ErrorContext, user_friendly_error};
