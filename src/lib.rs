//! blockpm - Block package manager
//!
//! A source tree organizes reusable source files ("blocks") into categories.
//! blockpm publishes a manifest describing every block of a tree and lets other
//! projects install a block together with everything it transitively needs,
//! rewriting references between blocks so they stay valid in the new location.
//!
//! # Architecture Overview
//!
//! Publishing (once per tree):
//!
//! 1. [`extract`] lists the references of each block file, per dialect
//! 2. [`classify`] decides whether a reference points at another block of the
//!    tree or at a registry package, and turns block references into
//!    position-independent rewrite templates
//! 3. [`pinning`] pins registry packages to the version of the nearest
//!    `package.json`
//! 4. [`builder`] walks `<root>/<category>/<block>` and assembles the
//!    [`registry::Category`] list written as `blockpm-manifest.json`
//!
//! Installing (per request):
//!
//! 1. [`source`] loads the published indexes of the configured trees
//! 2. [`resolver`] computes the transitive closure of the requested blocks
//! 3. [`templating`] turns each template back into a concrete reference for
//!    the file's destination
//! 4. [`installer`] plans every file, then writes them all
//!
//! # Configuration (blockpm.toml)
//!
//! ```toml
//! repos = ["github/acme/blocks"]
//!
//! [paths]
//! "*" = "./src/blocks"
//! utils = "./src/lib/utils"
//!
//! [trees]
//! "github/acme/blocks" = "../acme-blocks"
//! ```
//!
//! See [`config`] for every key.

// Publishing
pub mod builder;
pub mod classify;
pub mod extract;
pub mod pinning;

// Installing
pub mod installer;
pub mod resolver;
pub mod source;
pub mod templating;

// Shared
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod registry;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
