//! get command - print the metadata blob for an object version

use std::io::Write;

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;
use crate::meta::values;

/// Print the metadata blob for a path expression.
///
/// The payload is written verbatim (so `get` round-trips with `set`)
/// unless `--json` asks for pretty-printing, which fails on non-JSON
/// content. `--dump` names the verbatim form explicitly; it exists to
/// conflict with `--json`.
pub fn get(ctx: &Context, pathspec: &str, _dump: bool, json: bool) -> Result<()> {
    let store = open_store(ctx, pathspec)?;
    let bytes = store.read(pathspec, None)?;

    if json {
        println!("{}", values::pretty(&bytes)?);
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    if !bytes.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }

    Ok(())
}
