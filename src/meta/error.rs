//! meta::error
//!
//! The error taxonomy for metadata operations.
//!
//! Every user-visible failure is one of these tagged kinds. The CLI prints
//! `<ErrorKind>: <message>`, so each variant knows its kind name via
//! [`MetaError::kind`]. Structured detail (paths, ref names, expected
//! kinds) lives in variant fields rather than pre-formatted strings.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::TypeError;
use crate::git::GitError;

/// Errors from metadata operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// No Git repository located from the requested path upward.
    #[error("could not find a Git repository from {}", path.display())]
    RepositoryNotFound {
        /// Where the search started
        path: PathBuf,
    },

    /// The repository is bare (no working directory).
    #[error("bare repositories are not supported")]
    RepositoryUnsupported,

    /// The metadata reference does not exist (read-only contexts only).
    #[error("no metadata reference {refname}")]
    NoMetadataReference {
        /// The reference that was looked up
        refname: String,
    },

    /// The requested blob is absent at the canonical metadata path.
    #[error("no metadata found at {path}")]
    BlobNotFound {
        /// The canonical blob path that was probed
        path: String,
    },

    /// A referenced data revision, commit, or object does not exist.
    #[error("could not find matching data: {spec}")]
    DataNotFound {
        /// The revision or `<rev>:<path>` expression that failed
        spec: String,
    },

    /// Structural violation during a walk (e.g. a merge commit).
    #[error("{message}")]
    Read {
        /// What went wrong
        message: String,
    },

    /// Write blocked by an existing non-tree entry without `--force`.
    #[error("{message}")]
    Write {
        /// What went wrong
        message: String,
    },

    /// A consumer requested JSON parsing and the blob is not valid JSON.
    #[error("{message}")]
    Format {
        /// What went wrong
        message: String,
    },

    /// Malformed path expression, missing argument, or path outside the
    /// repository.
    #[error("{message}")]
    Parameter {
        /// What went wrong
        message: String,
    },

    /// The working-tree copy differs from its committed version and no
    /// explicit data revision was given.
    #[error("{message}")]
    Invalid {
        /// What went wrong
        message: String,
    },

    /// A host-store failure no taxonomy entry describes.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl MetaError {
    /// The taxonomy name printed before the message on stderr.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaError::RepositoryNotFound { .. } => "RepositoryNotFound",
            MetaError::RepositoryUnsupported => "RepositoryUnsupported",
            MetaError::NoMetadataReference { .. } => "NoMetadataReference",
            MetaError::BlobNotFound { .. } => "MetadataBlobNotFound",
            MetaError::DataNotFound { .. } => "DataNotFound",
            MetaError::Read { .. } => "MetadataReadError",
            MetaError::Write { .. } => "MetadataWriteError",
            MetaError::Format { .. } => "MetadataFormatError",
            MetaError::Parameter { .. } => "ParameterError",
            MetaError::Invalid { .. } => "MetadataInvalid",
            MetaError::Git(_) => "GitError",
        }
    }

    /// Shorthand for a parameter error.
    pub fn parameter(message: impl Into<String>) -> Self {
        MetaError::Parameter {
            message: message.into(),
        }
    }
}

impl From<TypeError> for MetaError {
    fn from(err: TypeError) -> Self {
        MetaError::Parameter {
            message: err.to_string(),
        }
    }
}
