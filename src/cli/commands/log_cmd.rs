//! log command - walk a revision's history marking annotated commits

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;

/// Walk the data revision's ancestors in time order; commits carrying
/// metadata for the requested path are marked with `M` and their streams
/// listed.
pub fn log(ctx: &Context, pathspec: &str) -> Result<()> {
    let store = open_store(ctx, pathspec)?;
    let rows = store.log(pathspec, None)?;

    let mut found = false;
    for row in &rows {
        let info = format!("{}, {}", row.commit, row.time.format("%Y-%m-%d %H:%M:%S"));
        if row.streams.is_empty() {
            println!("  {}", info);
        } else {
            found = true;
            println!("M {}", info);
            println!(" \\");
            for stream in &row.streams {
                println!("  * stream: {}", stream);
            }
        }
    }

    if !found {
        println!();
        println!("no metadata was found");
        println!();
    }

    Ok(())
}
