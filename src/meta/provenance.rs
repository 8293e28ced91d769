//! meta::provenance
//!
//! Backward walks over the data history.
//!
//! Metadata is keyed by the commit that *introduced* an object, not by
//! whichever descendant the user happens to name. These walks locate that
//! commit: for blobs by content identity (the commit whose tree diff
//! against its parent added an entry with the blob's exact id), for
//! directories by path (the earliest ancestor in which the path still
//! resolves to a tree).
//!
//! Both walks follow single-parent chains only. A merge commit aborts the
//! walk: metadata inheritance across merge bases is undefined.

use crate::core::types::Oid;
use crate::git::{Git, GitError, ObjectKind};
use crate::meta::error::MetaError;

/// Find the data commit that introduced the object at `path` in `datarev`.
///
/// Resolves the object at `datarev:path` and dispatches on its kind:
/// blobs are traced by content id, trees by path. Fails with
/// [`MetaError::DataNotFound`] when the object does not exist at the
/// starting revision or its introduction cannot be located on the
/// first-parent chain.
pub fn find_data_commit(git: &Git, datarev: &str, path: &str) -> Result<Oid, MetaError> {
    let start = git
        .resolve_commit(datarev)
        .map_err(|e| data_not_found(e, datarev))?;

    let object = git
        .resolve_at(datarev, path)
        .map_err(|e| data_not_found(e, &format!("{}:{}", datarev, path)))?;

    let found = match object.kind {
        ObjectKind::Blob => first_commit_with_blob(git, &object.oid, &start)?,
        ObjectKind::Tree => Some(first_commit_with_tree(git, path, &start)?),
        ObjectKind::Commit | ObjectKind::Tag => {
            return Err(MetaError::DataNotFound {
                spec: format!("{}:{}", datarev, path),
            })
        }
    };

    found.ok_or_else(|| MetaError::DataNotFound {
        spec: format!("{}:{}", datarev, path),
    })
}

/// Walk parents of `start` looking for the commit that added `blob`.
///
/// At each step the commit's root tree is diffed against its parent's
/// (or the empty tree at a root commit); an `Added` delta whose new id
/// equals `blob` marks the introducing commit. Returns `None` when the
/// chain is exhausted without a hit.
///
/// # Errors
///
/// - [`MetaError::Read`] on a commit with more than one parent
pub fn first_commit_with_blob(
    git: &Git,
    blob: &Oid,
    start: &Oid,
) -> Result<Option<Oid>, MetaError> {
    let mut current = start.clone();

    loop {
        let parents = git.commit_parents(&current)?;
        if parents.len() > 1 {
            return Err(merges_not_supported(&current));
        }

        let tree = git.commit_tree(&current)?;
        let parent_tree = match parents.first() {
            Some(parent) => Some(git.commit_tree(parent)?),
            None => None,
        };

        let added = git.tree_added_entries(parent_tree.as_ref(), &tree)?;
        if added.iter().any(|(_, oid)| oid == blob) {
            return Ok(Some(current));
        }

        match parents.into_iter().next() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

/// Walk parents of `start` for the earliest ancestor in which `path`
/// still resolves to a tree.
///
/// The walk stops at the commit whose parent no longer has a tree at
/// `path` (missing, or a non-tree entry): that commit introduced the
/// directory. Provenance is by path, not by tree id, so a directory
/// keeps its identity across content changes.
///
/// # Errors
///
/// - [`MetaError::Read`] on a commit with more than one parent
pub fn first_commit_with_tree(git: &Git, path: &str, start: &Oid) -> Result<Oid, MetaError> {
    let mut current = start.clone();

    loop {
        let parents = git.commit_parents(&current)?;
        if parents.len() > 1 {
            return Err(merges_not_supported(&current));
        }

        let Some(parent) = parents.into_iter().next() else {
            // Root commit: nothing earlier can contain the tree.
            return Ok(current);
        };

        match git.resolve_at(parent.as_str(), path) {
            Ok(resolved) if resolved.kind == ObjectKind::Tree => current = parent,
            // Missing in the parent, or the path used to be something
            // else: `current` introduced the tree.
            Ok(_) => return Ok(current),
            Err(e) if e.is_not_found() => return Ok(current),
            Err(e) => return Err(e.into()),
        }
    }
}

fn merges_not_supported(commit: &Oid) -> MetaError {
    MetaError::Read {
        message: format!("merges not supported (commit {})", commit.short(12)),
    }
}

fn data_not_found(err: GitError, spec: &str) -> MetaError {
    if err.is_not_found() {
        MetaError::DataNotFound {
            spec: spec.to_string(),
        }
    } else if let GitError::WrongKind { .. } = err {
        MetaError::DataNotFound {
            spec: spec.to_string(),
        }
    } else {
        MetaError::Git(err)
    }
}
