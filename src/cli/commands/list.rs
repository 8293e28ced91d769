//! list command - list metadata entries in a stream

use anyhow::Result;

use crate::cli::commands::open_store;
use crate::cli::Context;
use crate::meta::store::ListEntry;

const COL_WIDTHS: (usize, usize, usize, usize, usize) = (40, 40, 12, 11, 19);

/// List the per-commit metadata entries in one stream for a logical
/// path, split into entries matching the requested object version and
/// other versions for the same path.
pub fn list(ctx: &Context, pathspec: &str) -> Result<()> {
    let store = open_store(ctx, pathspec)?;
    let listing = store.list(pathspec, None)?;

    println!();
    println!("* listing metadata for path '{}'", listing.path);
    println!(
        "* data revision specified: '{}'",
        listing.datarev.as_deref().unwrap_or("none")
    );
    println!("* stream specified: {}", listing.stream);
    println!();

    rule('=');
    row(
        "Data commit ID containing metadata",
        "Data in commit",
        "Data matches",
        "Inheritable",
        "Committed",
    );
    rule('-');

    if listing.matching.is_empty() {
        println!("none found");
    } else {
        for entry in &listing.matching {
            entry_row(entry);
        }
    }

    rule('-');
    println!("other versions of metadata for same path:");
    if listing.others.is_empty() {
        println!("none found");
    } else {
        for entry in &listing.others {
            entry_row(entry);
        }
    }
    rule('=');
    println!();

    Ok(())
}

fn entry_row(entry: &ListEntry) {
    let committed = entry
        .committed
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    row(
        &entry.data_commit,
        &entry.data_in_commit,
        if entry.matches { "YES" } else { "NO" },
        if entry.inheritable { "YES" } else { "NO" },
        &committed,
    );
}

fn row(c1: &str, c2: &str, c3: &str, c4: &str, c5: &str) {
    let (w1, w2, w3, w4, w5) = COL_WIDTHS;
    println!(
        "{:<w1$} {:<w2$} {:<w3$} {:<w4$} {:<w5$}",
        c1, c2, c3, c4, c5
    );
}

fn rule(c: char) {
    let (w1, w2, w3, w4, w5) = COL_WIDTHS;
    let line = |w: usize| c.to_string().repeat(w);
    println!(
        "{} {} {} {} {}",
        line(w1),
        line(w2),
        line(w3),
        line(w4),
        line(w5)
    );
}
