//! setvalue command - merge a key=value pair into JSON metadata

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;
use crate::meta::MetaError;

/// Merge one `key=value` pair into the JSON metadata blob for a path
/// expression, creating `{}` first if no blob exists yet.
pub fn setvalue(ctx: &Context, pathspec: &str, keyvalue: &str, force: bool) -> Result<()> {
    let Some((key, value)) = keyvalue.split_once('=') else {
        return Err(MetaError::parameter(format!(
            "'{}' is not in key=value format",
            keyvalue
        ))
        .into());
    };

    let store = open_store(ctx, pathspec)?;
    let receipt = store.set_value(pathspec, key, value, force, None)?;

    println!(
        "metadata for '{} ({})' saved to stream '{}' in '{}'",
        receipt.path, receipt.data_commit, receipt.stream, ctx.metadata_ref
    );

    Ok(())
}
