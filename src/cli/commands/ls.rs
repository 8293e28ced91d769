//! ls command - enumerate annotated paths on the metadata reference

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;

/// Print every logical path at or below the given path that carries
/// metadata, together with its streams.
pub fn ls(ctx: &Context, pathspec: &str) -> Result<()> {
    let store = open_store(ctx, pathspec)?;
    let paths = store.ls(pathspec, None)?;

    if paths.is_empty() {
        println!("no annotated paths found");
        return Ok(());
    }

    for annotated in paths {
        println!("{:<50} [{}]", annotated.path, annotated.streams.join(", "));
    }

    Ok(())
}
