//! meta
//!
//! The metadata engine: everything between the CLI and the Git doorway.
//!
//! # Modules
//!
//! - [`path`] - Path-expression parsing and canonical blob paths
//! - [`provenance`] - Backward walks locating the commit that introduced
//!   an object
//! - [`synthesis`] - Incremental tree-hierarchy rebuilds on the metadata
//!   reference
//! - [`store`] - The engine orchestrating read/write/copy/list/log
//! - [`values`] - JSON key/value view over metadata blobs
//! - [`error`] - The user-facing error taxonomy
//!
//! # Data model
//!
//! Metadata for `(logical path, stream, data commit)` lives at the
//! canonical tree path
//! `<path>/<sentinel>/<stream>/<data commit id>` on a dedicated
//! reference, where the sentinel is a fixed UUID that no user path
//! segment can collide with. Data history is never touched; the metadata
//! chain is linear and append-only.

pub mod error;
pub mod path;
pub mod provenance;
pub mod store;
pub mod synthesis;
pub mod values;

pub use error::MetaError;
pub use path::{metadata_sentinel, MetadataPath, SearchMode};
pub use store::{MetadataStore, METADATA_REF_DEFAULT};
