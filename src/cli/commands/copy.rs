//! copy command - copy a metadata blob between object versions

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;

/// Copy the metadata blob at the source path expression to the
/// destination path expression. Both expressions must carry explicit
/// data revisions.
pub fn copy(ctx: &Context, source: &str, dest: &str, force: bool) -> Result<()> {
    let store = open_store(ctx, source)?;
    let receipt = store.copy(source, dest, force, None)?;

    println!(
        "metadata copied to '{} ({})' in stream '{}' in '{}'",
        receipt.path, receipt.data_commit, receipt.stream, ctx.metadata_ref
    );

    Ok(())
}
