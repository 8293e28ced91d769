//! set command - store a file's contents as a metadata blob

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::commands::open_store;
use crate::cli::Context;
use crate::meta::MetaError;

/// Write the contents of `file` as the metadata blob for a path
/// expression. `-` reads the payload from stdin.
pub fn set(ctx: &Context, pathspec: &str, file: &Path, force: bool) -> Result<()> {
    let payload = if file == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read metadata from stdin")?;
        buf
    } else {
        if !file.exists() && file.to_string_lossy().contains('=') {
            return Err(MetaError::parameter(format!(
                "'{}' is not a file; to merge a key=value pair use 'setvalue'",
                file.display()
            ))
            .into());
        }
        std::fs::read(file)
            .with_context(|| format!("failed to read metadata file {}", file.display()))?
    };

    let store = open_store(ctx, pathspec)?;
    let receipt = store.write(pathspec, &payload, force, None)?;

    println!(
        "metadata for '{} ({})' saved to stream '{}' in '{}'",
        receipt.path, receipt.data_commit, receipt.stream, ctx.metadata_ref
    );

    Ok(())
}
