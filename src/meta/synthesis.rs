//! meta::synthesis
//!
//! Incremental rebuild of the metadata tree hierarchy.
//!
//! Writing one blob at a deep canonical path means rewriting every
//! enclosing tree up to the root: each level gets a new tree that is the
//! old one with a single entry replaced. Everything is expressed as new
//! objects in the store; existing trees are never mutated, and untouched
//! sibling entries are carried over bit-identically.

use crate::core::types::Oid;
use crate::git::{EntryMode, Git, ObjectKind};
use crate::meta::error::MetaError;

/// Rebuild the chain of enclosing trees for one leaf entry.
///
/// `segments` is the full path of the leaf, root to leaf. `base` is the
/// metadata commit whose trees are reused where they exist (`None` when
/// the metadata reference has no commit yet). Returns the id of the new
/// top-level tree.
///
/// At each level the existing tree at the corresponding prefix is looked
/// up under `base`:
/// - a tree: rebuilt with the new entry inserted (replacing any same-named
///   entry),
/// - a non-tree entry: refused with [`MetaError::Write`] unless `force`,
///   which discards it and builds from empty,
/// - absent: built from empty.
///
/// The leaf keeps the mode of the object it names (blob or tree); every
/// synthesized enclosing level is a directory.
pub fn write_tree_hierarchy(
    git: &Git,
    base: Option<&Oid>,
    segments: &[String],
    leaf: &Oid,
    force: bool,
) -> Result<Oid, MetaError> {
    if segments.is_empty() {
        return Err(MetaError::Write {
            message: "cannot synthesize an empty tree path".to_string(),
        });
    }

    let mut entry_oid = leaf.clone();
    let mut entry_mode = match git.lookup(leaf)?.kind {
        ObjectKind::Blob => EntryMode::Blob,
        ObjectKind::Tree => EntryMode::Tree,
        other => {
            return Err(MetaError::Write {
                message: format!("expected blob or tree for new entry, got {}", other),
            })
        }
    };

    // Leaf to root: each new tree becomes the entry inserted one level up.
    for depth in (0..segments.len()).rev() {
        let name = &segments[depth];
        let prefix = segments[..depth].join("/");

        let base_tree = match base {
            Some(commit) => match git.resolve_at(commit.as_str(), &prefix) {
                Ok(resolved) if resolved.kind == ObjectKind::Tree => Some(resolved.oid),
                Ok(resolved) => {
                    if force {
                        None
                    } else {
                        return Err(MetaError::Write {
                            message: format!(
                                "existing entry at '{}' is a {}, not a tree (use force to replace)",
                                display_prefix(&prefix),
                                resolved.kind
                            ),
                        });
                    }
                }
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        entry_oid = git.write_tree_update(base_tree.as_ref(), name, &entry_oid, entry_mode)?;
        entry_mode = EntryMode::Tree;
    }

    Ok(entry_oid)
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        "."
    } else {
        prefix
    }
}
