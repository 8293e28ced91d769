//! cli
//!
//! Command-line interface layer for gitmeta.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT perform repository operations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the [`crate::meta`] engine. All repository access flows through the
//! engine and the [`crate::git`] doorway.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::Result;

use crate::core::types::RefName;
use crate::meta::MetaError;
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Global settings derived from CLI flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// The metadata reference all operations bind to.
    pub metadata_ref: RefName,
}

/// Run a parsed CLI invocation.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let metadata_ref = RefName::qualified(&cli.metadataref).map_err(MetaError::from)?;

    let ctx = Context {
        verbosity: Verbosity::from_flag(cli.verbose),
        metadata_ref,
    };

    commands::dispatch(cli.command, &ctx)
}
