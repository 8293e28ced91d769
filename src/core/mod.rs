//! core
//!
//! Core domain types for gitmeta.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, StreamName
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Validation happens once, at construction

pub mod types;
