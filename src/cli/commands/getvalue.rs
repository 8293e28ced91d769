//! getvalue command - print keys and values of JSON metadata

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;

/// Print aligned `key value` rows from the JSON metadata blob for a path
/// expression, optionally filtered by key and/or value.
pub fn getvalue(
    ctx: &Context,
    pathspec: &str,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<()> {
    let store = open_store(ctx, pathspec)?;
    let rows = store.read_values(pathspec, key, value, None)?;

    for (k, v) in rows {
        println!("{:<20} {:<20}", k, v);
    }

    Ok(())
}
