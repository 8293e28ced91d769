//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! gitmeta. All repository interactions flow through this interface, which
//! provides structured results and normalizes errors into typed failure
//! categories.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a Git repository.
//! No other module should import `git2` directly. This ensures:
//!
//! - Consistent error handling across all Git operations
//! - Strong type guarantees at the boundary
//! - Sum-typed object lookups; a wrong-kind object is never returned
//!   silently
//!
//! # Example
//!
//! ```ignore
//! use gitmeta::git::Git;
//! use std::path::Path;
//!
//! let git = Git::discover(Path::new("."))?;
//! let head = git.resolve_commit("HEAD")?;
//! println!("HEAD is at {}", head.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Oid, TypeError};

/// Errors from Git operations.
///
/// These error types cover the categories of Git failures that the
/// metadata engine needs to handle distinctly. "Not found" variants are
/// recoverable at higher layers (e.g. the read fallback path); the rest
/// surface as-is.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found for a revision or `<rev>:<path>` expression.
    #[error("object not found: {spec}")]
    ObjectNotFound {
        /// The revision expression that failed to resolve
        spec: String,
    },

    /// An object resolved, but to the wrong kind.
    #[error("{spec} is a {actual}, expected {expected}")]
    WrongKind {
        /// The revision expression that was resolved
        spec: String,
        /// The kind the caller required
        expected: ObjectKind,
        /// The kind actually found
        actual: ObjectKind,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        spec: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Whether this error means "the object simply is not there".
    ///
    /// Used by callers with a fallback path (e.g. metadata reads that are
    /// allowed to search backwards).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. }
        )
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                spec: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidStreamName(msg) => GitError::Internal { message: msg },
        }
    }
}

/// The kind of a resolved Git object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        };
        write!(f, "{}", s)
    }
}

/// A resolved object: its id plus what it turned out to be.
///
/// Consumers match on `kind` exhaustively; there is no way to obtain an
/// object without also learning its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The object id
    pub oid: Oid,
    /// The object kind
    pub kind: ObjectKind,
}

/// File mode for a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Regular blob (0o100644)
    Blob,
    /// Subtree (0o040000)
    Tree,
}

impl EntryMode {
    fn filemode(self) -> i32 {
        match self {
            EntryMode::Blob => 0o100644,
            EntryMode::Tree => 0o040000,
        }
    }
}

/// An entry read out of a tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Entry name within the tree
    pub name: String,
    /// Object the entry points at
    pub oid: Oid,
    /// Kind of that object
    pub kind: ObjectKind,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All repository
/// reads and writes flow through this interface. No other module should
/// import `git2` directly.
///
/// All object-creating operations (`create_blob`, `write_tree_update`,
/// `create_commit`) are purely additive: they write new objects into the
/// store and never mutate existing ones. The only mutating operation is
/// `set_reference`.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Discover and open a repository from the given path.
    ///
    /// Walks parent directories until a repository is found or the
    /// filesystem root is reached. Unlike `git2::Repository::discover`,
    /// this also works when `path` itself does not exist on disk (the
    /// path may only exist inside the repository), by retrying from each
    /// ancestor in turn.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let mut search = path.to_path_buf();
        loop {
            match git2::Repository::discover(&search) {
                Ok(repo) => {
                    if repo.is_bare() {
                        return Err(GitError::BareRepo);
                    }
                    return Ok(Self { repo });
                }
                Err(_) => {
                    if !search.pop() {
                        return Err(GitError::NotARepo {
                            path: path.to_path_buf(),
                        });
                    }
                }
            }
        }
    }

    /// Path to the repository's working directory.
    pub fn workdir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Path to the .git directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Object Resolution
    // =========================================================================

    /// Resolve a revision expression to a commit id.
    ///
    /// The expression may be a ref name, an abbreviated or full OID, or
    /// anything else `revparse` accepts.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] / [`GitError::RefNotFound`] if the
    ///   expression does not resolve
    /// - [`GitError::WrongKind`] if it resolves to a non-commit
    pub fn resolve_commit(&self, rev: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;

        match object.kind() {
            Some(git2::ObjectType::Commit) => Ok(Oid::new(object.id().to_string())?),
            Some(other) => Err(GitError::WrongKind {
                spec: rev.to_string(),
                expected: ObjectKind::Commit,
                actual: object_kind(other, rev)?,
            }),
            None => Err(GitError::ObjectNotFound {
                spec: rev.to_string(),
            }),
        }
    }

    /// Resolve a `<rev>:<path>` expression to a sum-typed object.
    ///
    /// An empty `path` resolves to the revision's root tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the expression does not resolve
    pub fn resolve_at(&self, rev: &str, path: &str) -> Result<Resolved, GitError> {
        let spec = format!("{}:{}", rev, path);
        let object = self
            .repo
            .revparse_single(&spec)
            .map_err(|e| GitError::from_git2(e, &spec))?;

        resolved_from(&object, &spec)
    }

    /// Look up an object by raw id.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if no such object exists
    pub fn lookup(&self, oid: &Oid) -> Result<Resolved, GitError> {
        let git_oid = self.raw_oid(oid)?;
        let object = self
            .repo
            .find_object(git_oid, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        resolved_from(&object, oid.as_str())
    }

    /// Check whether a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    // =========================================================================
    // Blob Operations
    // =========================================================================

    /// Write content as a blob and return its OID.
    pub fn create_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        let oid = self.repo.blob(content).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Read a blob by OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the blob doesn't exist
    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let git_oid = self.raw_oid(oid)?;

        let blob = self
            .repo
            .find_blob(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        Ok(blob.content().to_vec())
    }

    /// Hash a file on disk into the blob id it would have in the store.
    ///
    /// Does not write anything; pair with [`Git::contains_object`] to check
    /// whether the working-tree copy matches a stored blob.
    pub fn hash_file(&self, path: &Path) -> Result<Oid, GitError> {
        let oid = git2::Oid::hash_file(git2::ObjectType::Blob, path).map_err(|e| {
            GitError::AccessError {
                message: format!("could not hash {}: {}", path.display(), e.message()),
            }
        })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Check whether an object with the given id exists in the store.
    pub fn contains_object(&self, oid: &Oid) -> Result<bool, GitError> {
        let git_oid = self.raw_oid(oid)?;
        let odb = self.repo.odb().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        Ok(odb.exists(git_oid))
    }

    // =========================================================================
    // Tree Operations
    // =========================================================================

    /// Enumerate the entries of a tree.
    ///
    /// Entries whose names are not valid UTF-8 or whose kind cannot be
    /// determined are skipped.
    pub fn tree_entries(&self, tree: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        let tree = self.find_tree_raw(tree)?;

        let mut entries = Vec::new();
        for entry in tree.iter() {
            let name = match entry.name() {
                Some(n) => n.to_string(),
                None => continue,
            };
            let kind = match entry.kind() {
                Some(k) => match object_kind(k, &name) {
                    Ok(k) => k,
                    Err(_) => continue,
                },
                None => continue,
            };
            entries.push(TreeEntry {
                name,
                oid: Oid::new(entry.id().to_string())?,
                kind,
            });
        }

        Ok(entries)
    }

    /// Write a tree that is `base` with one entry inserted or replaced.
    ///
    /// With `base == None`, writes a fresh single-entry tree. The base tree
    /// is never mutated; unmodified sibling entries are carried over
    /// bit-identically.
    pub fn write_tree_update(
        &self,
        base: Option<&Oid>,
        name: &str,
        entry: &Oid,
        mode: EntryMode,
    ) -> Result<Oid, GitError> {
        let base_tree = match base {
            Some(oid) => Some(self.find_tree_raw(oid)?),
            None => None,
        };

        let mut builder = self
            .repo
            .treebuilder(base_tree.as_ref())
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        builder
            .insert(name, self.raw_oid(entry)?, mode.filemode())
            .map_err(|e| GitError::from_git2(e, name))?;

        let oid = builder.write().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Entries *added* between a parent tree and a child tree.
    ///
    /// Computes the tree-to-tree diff with the parent as the old side and
    /// returns `(path, new object id)` for each `Added` delta. A `None`
    /// parent diffs against the empty tree, so every entry counts as added.
    pub fn tree_added_entries(
        &self,
        parent: Option<&Oid>,
        child: &Oid,
    ) -> Result<Vec<(String, Oid)>, GitError> {
        let old_tree = match parent {
            Some(oid) => Some(self.find_tree_raw(oid)?),
            None => None,
        };
        let new_tree = self.find_tree_raw(child)?;

        let diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut added = Vec::new();
        for delta in diff.deltas() {
            if delta.status() != git2::Delta::Added {
                continue;
            }
            let path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            added.push((path, Oid::new(delta.new_file().id().to_string())?));
        }

        Ok(added)
    }

    // =========================================================================
    // Commit Operations
    // =========================================================================

    /// Root tree id of a commit.
    pub fn commit_tree(&self, commit: &Oid) -> Result<Oid, GitError> {
        let commit = self.find_commit_raw(commit)?;
        Oid::new(commit.tree_id().to_string()).map_err(|e| e.into())
    }

    /// Parent ids of a commit.
    ///
    /// Returns an empty vec for root commits, multiple OIDs for merges.
    pub fn commit_parents(&self, commit: &Oid) -> Result<Vec<Oid>, GitError> {
        let commit = self.find_commit_raw(commit)?;

        let mut parents = Vec::new();
        for parent in commit.parent_ids() {
            parents.push(Oid::new(parent.to_string())?);
        }

        Ok(parents)
    }

    /// Commit time as a UTC timestamp.
    pub fn commit_time(&self, commit: &Oid) -> Result<chrono::DateTime<chrono::Utc>, GitError> {
        let commit = self.find_commit_raw(commit)?;
        Ok(
            chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH),
        )
    }

    /// Walk all ancestors of a commit, the commit itself included, in
    /// commit-time order (newest first).
    pub fn walk_ancestors(&self, start: &Oid) -> Result<Vec<Oid>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        revwalk
            .set_sorting(git2::Sort::TIME)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
        revwalk
            .push(self.raw_oid(start)?)
            .map_err(|e| GitError::from_git2(e, start.as_str()))?;

        let mut ancestors = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            ancestors.push(Oid::new(oid.to_string())?);
        }

        Ok(ancestors)
    }

    /// Create a commit from a tree and parents.
    ///
    /// Author and committer come from the repository's configured identity
    /// (`user.name` / `user.email`). If `update_ref` is given, that ref is
    /// advanced to the new commit (it must currently point at the first
    /// parent).
    pub fn create_commit(
        &self,
        update_ref: Option<&str>,
        message: &str,
        tree: &Oid,
        parents: &[Oid],
    ) -> Result<Oid, GitError> {
        let tree = self.find_tree_raw(tree)?;

        let signature = self.repo.signature().map_err(|e| GitError::Internal {
            message: format!("no committer identity configured: {}", e.message()),
        })?;

        let parent_commits = parents
            .iter()
            .map(|oid| self.find_commit_raw(oid))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();

        let oid = self
            .repo
            .commit(update_ref, &signature, &signature, message, &tree, &parent_refs)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    // =========================================================================
    // Reference Operations
    // =========================================================================

    /// Create or move a direct reference to the given commit.
    pub fn set_reference(
        &self,
        refname: &str,
        target: &Oid,
        log_message: &str,
    ) -> Result<(), GitError> {
        self.repo
            .reference(refname, self.raw_oid(target)?, true, log_message)
            .map_err(|e| GitError::from_git2(e, refname))?;

        Ok(())
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Check whether a tracked file differs from its committed version.
    ///
    /// `path` is relative to the working directory. Any status flag at all
    /// (staged, unstaged, untracked) counts as modified.
    pub fn is_file_modified(&self, path: &str) -> Result<bool, GitError> {
        let status = self
            .repo
            .status_file(Path::new(path))
            .map_err(|e| GitError::from_git2(e, path))?;

        Ok(!status.is_empty())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn raw_oid(&self, oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn find_tree_raw(&self, oid: &Oid) -> Result<git2::Tree<'_>, GitError> {
        self.repo
            .find_tree(self.raw_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn find_commit_raw(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(self.raw_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

/// Map a git2 object type to our sum type.
fn object_kind(kind: git2::ObjectType, spec: &str) -> Result<ObjectKind, GitError> {
    match kind {
        git2::ObjectType::Blob => Ok(ObjectKind::Blob),
        git2::ObjectType::Tree => Ok(ObjectKind::Tree),
        git2::ObjectType::Commit => Ok(ObjectKind::Commit),
        git2::ObjectType::Tag => Ok(ObjectKind::Tag),
        git2::ObjectType::Any => Err(GitError::Internal {
            message: format!("indeterminate object type for {}", spec),
        }),
    }
}

fn resolved_from(object: &git2::Object<'_>, spec: &str) -> Result<Resolved, GitError> {
    let kind = match object.kind() {
        Some(k) => object_kind(k, spec)?,
        None => {
            return Err(GitError::ObjectNotFound {
                spec: spec.to_string(),
            })
        }
    };

    Ok(Resolved {
        oid: Oid::new(object.id().to_string())?,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn not_found_classification() {
            let err = GitError::ObjectNotFound {
                spec: "HEAD:missing".to_string(),
            };
            assert!(err.is_not_found());

            let err = GitError::RefNotFound {
                refname: "refs/heads/metadata".to_string(),
            };
            assert!(err.is_not_found());

            let err = GitError::BareRepo;
            assert!(!err.is_not_found());
        }

        #[test]
        fn wrong_kind_display() {
            let err = GitError::WrongKind {
                spec: "HEAD:docs".to_string(),
                expected: ObjectKind::Blob,
                actual: ObjectKind::Tree,
            };
            let s = err.to_string();
            assert!(s.contains("HEAD:docs"));
            assert!(s.contains("tree"));
            assert!(s.contains("blob"));
        }
    }

    mod entry_mode {
        use super::*;

        #[test]
        fn filemodes_match_git_constants() {
            assert_eq!(EntryMode::Blob.filemode(), 0o100644);
            assert_eq!(EntryMode::Tree.filemode(), 0o040000);
        }
    }

    mod object_kind_display {
        use super::*;

        #[test]
        fn lowercase_names() {
            assert_eq!(ObjectKind::Blob.to_string(), "blob");
            assert_eq!(ObjectKind::Tree.to_string(), "tree");
            assert_eq!(ObjectKind::Commit.to_string(), "commit");
            assert_eq!(ObjectKind::Tag.to_string(), "tag");
        }
    }
}
