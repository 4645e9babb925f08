//! Integration test suite for blockpm
//!
//! End-to-end runs of the `blockpm` binary against a block tree and a
//! consuming project laid out side by side in a temporary directory.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **add**: installing blocks and rewriting their references
//! - **build**: publishing a tree's manifest
//! - **list**: listing published blocks
//! - **tree**: dependency tree display

mod common;

mod add;
mod build;
mod list;
mod tree;
