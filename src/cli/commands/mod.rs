//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the metadata engine
//! 3. Formats and displays output
//!
//! Handlers do NOT touch the repository directly; everything goes through
//! [`crate::meta::MetadataStore`].

mod copy;
mod get;
mod getvalue;
mod list;
mod log_cmd;
mod ls;
mod set;
mod setvalue;

pub use copy::copy;
pub use get::get;
pub use getvalue::getvalue;
pub use list::list;
pub use log_cmd::log;
pub use ls::ls;
pub use set::set;
pub use setvalue::setvalue;

use std::path::Path;

use anyhow::Result;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::meta::{MetadataPath, MetadataStore};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Get { path, dump, json } => get::get(ctx, &path, dump, json),
        Command::Set { path, file, force } => set::set(ctx, &path, &file, force),
        Command::Setvalue {
            path,
            keyvalue,
            force,
        } => setvalue::setvalue(ctx, &path, &keyvalue, force),
        Command::Getvalue { path, key, value } => {
            getvalue::getvalue(ctx, &path, key.as_deref(), value.as_deref())
        }
        Command::List { path } => list::list(ctx, &path),
        Command::Log { path } => log_cmd::log(ctx, &path),
        Command::Copy {
            source,
            dest,
            force,
        } => copy::copy(ctx, &source, &dest, force),
        Command::Ls { path } => ls::ls(ctx, &path),
    }
}

/// Open the metadata store for a path expression.
///
/// The expression's logical path (which may not exist on disk) seeds the
/// repository discovery walk, so commands work from anywhere inside the
/// repository and on repository-only paths.
pub(crate) fn open_store(ctx: &Context, pathspec: &str) -> Result<MetadataStore> {
    // A preliminary parse with no repository: relative paths resolve
    // against the process working directory and stay absolute.
    let probe = MetadataPath::parse(pathspec, false, None, None)?;

    let store = MetadataStore::open(
        Path::new(&probe.path),
        ctx.metadata_ref.clone(),
        ctx.verbosity,
    )?;

    Ok(store)
}
