//! git
//!
//! Single interface for all Git operations.
//!
//! # Design
//!
//! All Git interactions flow through [`Git`]. No other module imports
//! `git2` directly, which keeps error normalization and object-kind
//! checking in one place.

pub mod interface;

pub use interface::{EntryMode, Git, GitError, ObjectKind, Resolved, TreeEntry};
