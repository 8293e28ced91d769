//! meta::store
//!
//! The metadata engine.
//!
//! [`MetadataStore`] orchestrates every operation over the metadata
//! reference: it computes canonical blob paths, reads blobs back out of
//! the metadata tree, synthesizes new trees for writes, and extends the
//! metadata commit chain.
//!
//! # The metadata reference
//!
//! All state lives on a single mutable reference (default
//! `refs/heads/metadata`) inside the same repository as the data it
//! annotates. The chain is strictly linear: each successful write adds
//! exactly one commit whose sole parent is the previous head, and the
//! first write creates the reference with a parentless commit. Reads
//! never mutate anything.
//!
//! Within one write, objects are created bottom-up (blob, trees leaf to
//! root, commit) before the reference moves, so a reader that observes
//! the new head sees every object it references. Failures before the
//! reference update leave only unreachable garbage behind.
//!
//! # Concurrency
//!
//! The engine is single-threaded and synchronous and assumes exclusive
//! logical access to the metadata reference for the duration of a write;
//! concurrent writers must be serialized by the caller.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::core::types::{Oid, RefName};
use crate::git::{Git, GitError, ObjectKind, Resolved};
use crate::meta::error::MetaError;
use crate::meta::path::{MetadataPath, SearchMode};
use crate::meta::{provenance, synthesis, values};
use crate::ui::output::{self, Verbosity};

/// Default data revision when none is specified and the working tree is
/// clean.
const DATAREV_DEFAULT: &str = "HEAD";

/// The default metadata reference.
pub const METADATA_REF_DEFAULT: &str = "refs/heads/metadata";

/// Result of a successful write: where the metadata went.
#[derive(Debug, Clone)]
pub struct WriteReceipt {
    /// The new head of the metadata reference
    pub metadata_commit: Oid,
    /// The data commit the blob is keyed by
    pub data_commit: Oid,
    /// Logical path the metadata is attached to
    pub path: String,
    /// Stream the blob was written into
    pub stream: String,
}

/// One row of `list` output.
#[derive(Debug, Clone)]
pub struct ListEntry {
    /// Tree entry name: the data commit id the metadata is keyed by
    pub data_commit: String,
    /// Description of the object found at the logical path in that commit
    pub data_in_commit: String,
    /// Whether that object matches the requested one
    pub matches: bool,
    /// Whether the requested revision reaches this commit via ancestry
    pub inheritable: bool,
    /// Commit time of the data commit, when it resolves
    pub committed: Option<DateTime<Utc>>,
}

/// Classified `list` output for one (path, stream).
#[derive(Debug, Clone)]
pub struct StreamListing {
    /// Logical path the listing is for
    pub path: String,
    /// The data revision specified, if any
    pub datarev: Option<String>,
    /// The stream listed
    pub stream: String,
    /// Entries whose object matches the requested one
    pub matching: Vec<ListEntry>,
    /// Other versions of metadata for the same path
    pub others: Vec<ListEntry>,
}

/// One row of `log` output: a data commit and the streams annotating it.
#[derive(Debug, Clone)]
pub struct LogRow {
    /// The data commit
    pub commit: Oid,
    /// Its commit time
    pub time: DateTime<Utc>,
    /// Streams carrying metadata for the requested path at this commit
    pub streams: Vec<String>,
}

/// One row of `ls` output: a logical path with metadata attached.
#[derive(Debug, Clone)]
pub struct AnnotatedPath {
    /// Logical path relative to the repository root
    pub path: String,
    /// Streams present under the path's sentinel node
    pub streams: Vec<String>,
}

/// The metadata engine.
///
/// Owns the repository handle and the metadata reference name for its
/// lifetime. See the module docs for the commit-chain invariants.
#[derive(Debug)]
pub struct MetadataStore {
    git: Git,
    metadata_ref: RefName,
    verbosity: Verbosity,
}

impl MetadataStore {
    /// Open the repository containing `path` and bind to `metadata_ref`.
    ///
    /// # Errors
    ///
    /// - [`MetaError::RepositoryNotFound`] when no repository is found
    ///   from `path` upward
    /// - [`MetaError::RepositoryUnsupported`] for bare repositories
    pub fn open(
        path: &Path,
        metadata_ref: RefName,
        verbosity: Verbosity,
    ) -> Result<Self, MetaError> {
        let git = Git::discover(path).map_err(|e| match e {
            GitError::NotARepo { path } => MetaError::RepositoryNotFound { path },
            GitError::BareRepo => MetaError::RepositoryUnsupported,
            other => MetaError::Git(other),
        })?;

        let store = Self {
            git,
            metadata_ref,
            verbosity,
        };

        store.debug(format!("repo = {}", store.git.git_dir().display()));
        store.debug(format!("metadata ref = {}", store.metadata_ref));

        Ok(store)
    }

    /// The repository working directory.
    pub fn workdir(&self) -> Result<PathBuf, MetaError> {
        Ok(self.git.workdir()?.to_path_buf())
    }

    /// Access the underlying Git interface (read-only helper for tests).
    pub fn git(&self) -> &Git {
        &self.git
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Read the metadata blob for a request.
    ///
    /// With [`SearchMode::SearchBackward`], a miss at the named revision
    /// falls back to the commit that introduced the object; with
    /// [`SearchMode::RevisionOnly`] a miss is final.
    pub fn read(&self, raw: &str, base_dir: Option<&Path>) -> Result<Vec<u8>, MetaError> {
        let path = self.parse_request(raw, true, base_dir)?;
        let datarev = self.effective_datarev(&path)?;
        let head = self.metadata_head()?;
        let data_commit = self.resolve_exact_commit(&datarev)?;

        match self.read_blob_at(&head, &path, &data_commit) {
            Err(MetaError::BlobNotFound { .. })
                if path.mode == SearchMode::SearchBackward =>
            {
                let introduced = provenance::find_data_commit(&self.git, &datarev, &path.path)?;
                self.debug(format!(
                    "'{}' introduced in data commit {}",
                    path.display_path(),
                    introduced
                ));
                self.read_blob_at(&head, &path, &introduced)
            }
            result => result,
        }
    }

    /// Read the metadata blob and list its `(key, value)` pairs,
    /// optionally filtered.
    pub fn read_values(
        &self,
        raw: &str,
        key: Option<&str>,
        value: Option<&str>,
        base_dir: Option<&Path>,
    ) -> Result<Vec<(String, String)>, MetaError> {
        let bytes = self.read(raw, base_dir)?;
        values::filter_values(&bytes, key, value)
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Write a metadata payload for a request.
    ///
    /// Resolves the data commit per the request's search mode, synthesizes
    /// the new metadata tree, and extends the metadata reference by one
    /// commit (creating it if absent).
    pub fn write(
        &self,
        raw: &str,
        payload: &[u8],
        force: bool,
        base_dir: Option<&Path>,
    ) -> Result<WriteReceipt, MetaError> {
        let path = self.parse_request(raw, true, base_dir)?;
        let datarev = self.effective_datarev(&path)?;
        let data_commit = self.resolve_data_commit(&path, &datarev)?;

        self.write_at(&path, &data_commit, payload, force)
    }

    /// Merge one `key = value` pair into the JSON metadata for a request.
    ///
    /// Reads the existing blob at the resolved data commit (an absent blob
    /// or reference starts from `{}`), merges, and writes the result back.
    pub fn set_value(
        &self,
        raw: &str,
        key: &str,
        value: &str,
        force: bool,
        base_dir: Option<&Path>,
    ) -> Result<WriteReceipt, MetaError> {
        let path = self.parse_request(raw, true, base_dir)?;
        let datarev = self.effective_datarev(&path)?;
        let data_commit = self.resolve_data_commit(&path, &datarev)?;

        let existing = match self.metadata_head() {
            Ok(head) => match self.read_blob_at(&head, &path, &data_commit) {
                Ok(bytes) => Some(bytes),
                Err(MetaError::BlobNotFound { .. }) => None,
                Err(e) => return Err(e),
            },
            Err(MetaError::NoMetadataReference { .. }) => None,
            Err(e) => return Err(e),
        };

        let payload = values::merge_value(existing.as_deref(), key, value)?;
        self.write_at(&path, &data_commit, &payload, force)
    }

    /// Copy a metadata blob between two canonical paths.
    ///
    /// Both requests must carry explicit data revisions; each is resolved
    /// per its own search mode.
    pub fn copy(
        &self,
        src_raw: &str,
        dest_raw: &str,
        force: bool,
        base_dir: Option<&Path>,
    ) -> Result<WriteReceipt, MetaError> {
        let src = self.parse_request(src_raw, true, base_dir)?;
        let dest = self.parse_request(dest_raw, true, base_dir)?;

        let (Some(src_rev), Some(dest_rev)) = (src.datarev.as_deref(), dest.datarev.as_deref())
        else {
            return Err(MetaError::parameter(
                "source and destination data revisions must be specified for copy",
            ));
        };

        let src_commit = self.resolve_data_commit(&src, src_rev)?;
        let dest_commit = self.resolve_data_commit(&dest, dest_rev)?;

        self.debug(format!(
            "copying metadata from '{}' to '{}'",
            src.blob_path(&src_commit),
            dest.blob_path(&dest_commit)
        ));

        let head = self.metadata_head()?;
        let payload = self.read_blob_at(&head, &src, &src_commit)?;

        self.write_at(&dest, &dest_commit, &payload, force)
    }

    // =========================================================================
    // List / Log / Ls
    // =========================================================================

    /// List the metadata entries in one stream for a logical path,
    /// classified against the requested data revision.
    pub fn list(&self, raw: &str, base_dir: Option<&Path>) -> Result<StreamListing, MetaError> {
        let path = self.parse_request(raw, false, base_dir)?;

        // Ancestors of the requested revision, for the inheritable flag.
        let ancestors: Vec<Oid> = match path.datarev.as_deref() {
            Some(rev) => {
                let start = self.resolve_exact_commit(rev)?;
                self.git.walk_ancestors(&start)?
            }
            None => Vec::new(),
        };

        let requested = self.find_requested_object(&path)?;
        let stream_tree = self.metadata_tree(&path.stream_path())?;

        let mut matching = Vec::new();
        let mut others = Vec::new();

        for entry in self.git.tree_entries(&stream_tree)? {
            let row = self.classify_entry(&path, requested.as_ref(), &ancestors, &entry.name);
            if row.matches {
                matching.push(row);
            } else {
                others.push(row);
            }
        }

        Ok(StreamListing {
            path: path.display_path().to_string(),
            datarev: path.datarev.clone(),
            stream: path.stream.as_str().to_string(),
            matching,
            others,
        })
    }

    /// Walk the data revision's ancestors and report which streams carry
    /// metadata for the requested path at each commit.
    pub fn log(&self, raw: &str, base_dir: Option<&Path>) -> Result<Vec<LogRow>, MetaError> {
        let path = self.parse_request(raw, false, base_dir)?;
        let datarev = self.effective_datarev(&path)?;

        let start = self.resolve_exact_commit(&datarev)?;
        let ancestors = self.git.walk_ancestors(&start)?;

        // Map of data commit id -> streams that annotate it.
        let mut annotated: std::collections::HashMap<String, Vec<String>> =
            std::collections::HashMap::new();

        match self.metadata_tree(&path.node_path()) {
            Ok(node) => {
                for stream in self.git.tree_entries(&node)? {
                    if stream.kind != ObjectKind::Tree {
                        continue;
                    }
                    for entry in self.git.tree_entries(&stream.oid)? {
                        annotated
                            .entry(entry.name)
                            .or_default()
                            .push(stream.name.clone());
                    }
                }
            }
            Err(MetaError::BlobNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut rows = Vec::new();
        for commit in ancestors {
            let time = self.git.commit_time(&commit)?;
            let streams = annotated.remove(commit.as_str()).unwrap_or_default();
            rows.push(LogRow {
                commit,
                time,
                streams,
            });
        }

        Ok(rows)
    }

    /// Enumerate every logical path at or below the request's path that
    /// carries metadata on the metadata reference.
    pub fn ls(&self, raw: &str, base_dir: Option<&Path>) -> Result<Vec<AnnotatedPath>, MetaError> {
        let path = self.parse_request(raw, false, base_dir)?;
        let head = self.metadata_head()?;

        let root = match self.git.resolve_at(head.as_str(), &path.path) {
            Ok(Resolved {
                oid,
                kind: ObjectKind::Tree,
            }) => oid,
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let sentinel = crate::meta::path::metadata_sentinel();
        let mut found = Vec::new();

        // Depth-first over the metadata tree with an explicit work list;
        // sentinel subtrees are recorded, not descended into.
        let mut work: Vec<(String, Oid)> = vec![(path.path.clone(), root)];
        while let Some((prefix, tree)) = work.pop() {
            for entry in self.git.tree_entries(&tree)? {
                if entry.kind != ObjectKind::Tree {
                    continue;
                }
                if entry.name == sentinel {
                    let streams = self
                        .git
                        .tree_entries(&entry.oid)?
                        .into_iter()
                        .map(|stream| stream.name)
                        .collect();
                    found.push(AnnotatedPath {
                        path: if prefix.is_empty() {
                            ".".to_string()
                        } else {
                            prefix.clone()
                        },
                        streams,
                    });
                } else {
                    let child = if prefix.is_empty() {
                        entry.name.clone()
                    } else {
                        format!("{}/{}", prefix, entry.name)
                    };
                    work.push((child, entry.oid));
                }
            }
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn parse_request(
        &self,
        raw: &str,
        requires_search: bool,
        base_dir: Option<&Path>,
    ) -> Result<MetadataPath, MetaError> {
        let workdir = self.git.workdir()?.to_path_buf();
        let path = MetadataPath::parse(raw, requires_search, base_dir, Some(&workdir))?;

        if path.prefix_ignored {
            output::notice("search method will be ignored");
        }

        self.debug(format!(
            "datarev: {}",
            path.datarev.as_deref().unwrap_or("NONE")
        ));
        self.debug(format!("metadata path: {}", path.display_path()));
        self.debug(format!("stream: {}", path.stream));

        Ok(path)
    }

    /// The data revision for a request, applying the default policy when
    /// none was given.
    ///
    /// The policy is deliberately asymmetric: with no explicit revision, a
    /// file must be identical to its committed version (anything else is
    /// [`MetaError::Invalid`]), a directory must exist as a tree in
    /// `HEAD`, and a path that is neither is a parameter error.
    fn effective_datarev(&self, path: &MetadataPath) -> Result<String, MetaError> {
        if let Some(rev) = &path.datarev {
            return Ok(rev.clone());
        }

        let datarev = self.default_datarev(path)?;
        output::notice(format!(
            "data revision not specified, assuming '{}'",
            datarev
        ));
        Ok(datarev)
    }

    fn default_datarev(&self, path: &MetadataPath) -> Result<String, MetaError> {
        let abs = self.git.workdir()?.join(&path.path);

        if abs.is_file() {
            if self.git.is_file_modified(&path.path)? {
                return Err(MetaError::Invalid {
                    message: format!(
                        "'{}' has been modified but not committed, so this metadata is not \
                         valid; use an explicit '{}:{}' revision to see metadata",
                        path.display_path(),
                        DATAREV_DEFAULT,
                        path.display_path()
                    ),
                });
            }
        } else if abs.is_dir() {
            match self.git.resolve_at(DATAREV_DEFAULT, &path.path) {
                Ok(Resolved {
                    kind: ObjectKind::Tree,
                    ..
                }) => {}
                _ => {
                    return Err(MetaError::parameter(
                        "path does not exist and data revision not specified",
                    ))
                }
            }
        } else {
            return Err(MetaError::parameter(
                "path does not exist and data revision not specified",
            ));
        }

        Ok(DATAREV_DEFAULT.to_string())
    }

    /// Resolve the data commit a request applies to, honoring its search
    /// mode.
    fn resolve_data_commit(&self, path: &MetadataPath, datarev: &str) -> Result<Oid, MetaError> {
        match path.mode {
            SearchMode::SearchBackward => {
                let commit = provenance::find_data_commit(&self.git, datarev, &path.path)?;
                self.debug(format!(
                    "'{}' has been found in data commit {}",
                    path.display_path(),
                    commit
                ));
                Ok(commit)
            }
            SearchMode::RevisionOnly => self.resolve_exact_commit(datarev),
            SearchMode::NoSearch => Err(MetaError::parameter(
                "data revision search method required",
            )),
        }
    }

    /// Resolve a revision to a commit, mapping misses to
    /// [`MetaError::DataNotFound`].
    fn resolve_exact_commit(&self, datarev: &str) -> Result<Oid, MetaError> {
        self.git.resolve_commit(datarev).map_err(|e| {
            if e.is_not_found() || matches!(e, GitError::WrongKind { .. }) {
                MetaError::DataNotFound {
                    spec: datarev.to_string(),
                }
            } else {
                MetaError::Git(e)
            }
        })
    }

    // =========================================================================
    // Metadata tree plumbing
    // =========================================================================

    /// Head commit of the metadata reference.
    fn metadata_head(&self) -> Result<Oid, MetaError> {
        self.git
            .resolve_commit(self.metadata_ref.as_str())
            .map_err(|e| match e {
                e if e.is_not_found() => MetaError::NoMetadataReference {
                    refname: self.metadata_ref.as_str().to_string(),
                },
                GitError::WrongKind { actual, .. } => MetaError::Read {
                    message: format!(
                        "metadata reference {} names a {}, expected a commit",
                        self.metadata_ref, actual
                    ),
                },
                other => MetaError::Git(other),
            })
    }

    /// Resolve a tree under the metadata head, failing with
    /// [`MetaError::BlobNotFound`] when absent or not a tree.
    fn metadata_tree(&self, tree_path: &str) -> Result<Oid, MetaError> {
        let head = self.metadata_head()?;
        match self.git.resolve_at(head.as_str(), tree_path) {
            Ok(Resolved {
                oid,
                kind: ObjectKind::Tree,
            }) => Ok(oid),
            Ok(_) => Err(MetaError::BlobNotFound {
                path: tree_path.to_string(),
            }),
            Err(e) if e.is_not_found() => Err(MetaError::BlobNotFound {
                path: tree_path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the blob at the canonical path for `(path, stream, commit)`
    /// under the given metadata head.
    fn read_blob_at(
        &self,
        head: &Oid,
        path: &MetadataPath,
        data_commit: &Oid,
    ) -> Result<Vec<u8>, MetaError> {
        let blob_path = path.blob_path(data_commit);
        self.debug(format!("metadata blob path = {}", blob_path));

        match self.git.resolve_at(head.as_str(), &blob_path) {
            Ok(Resolved {
                oid,
                kind: ObjectKind::Blob,
            }) => Ok(self.git.read_blob(&oid)?),
            Ok(_) => Err(MetaError::BlobNotFound { path: blob_path }),
            Err(e) if e.is_not_found() => Err(MetaError::BlobNotFound { path: blob_path }),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a payload at the canonical path for `(path, stream, commit)`
    /// and advance (or create) the metadata reference.
    ///
    /// Object creation order is blob, trees leaf to root, commit; the
    /// reference moves last.
    fn write_at(
        &self,
        path: &MetadataPath,
        data_commit: &Oid,
        payload: &[u8],
        force: bool,
    ) -> Result<WriteReceipt, MetaError> {
        let head = match self.metadata_head() {
            Ok(head) => Some(head),
            Err(MetaError::NoMetadataReference { .. }) => None,
            Err(e) => return Err(e),
        };

        let blob = self.git.create_blob(payload)?;
        let segments = path.blob_segments(data_commit);
        let tree = synthesis::write_tree_hierarchy(&self.git, head.as_ref(), &segments, &blob, force)?;

        let message = format!("Updated metadata for {}", path.display_path());

        let metadata_commit = match &head {
            Some(parent) => self.git.create_commit(
                Some(self.metadata_ref.as_str()),
                &message,
                &tree,
                std::slice::from_ref(parent),
            )?,
            None => {
                // First write: parentless commit, then create the reference.
                let commit = self.git.create_commit(None, &message, &tree, &[])?;
                self.git
                    .set_reference(self.metadata_ref.as_str(), &commit, &message)?;
                commit
            }
        };

        self.debug(format!("metadata commit {} created", metadata_commit));

        Ok(WriteReceipt {
            metadata_commit,
            data_commit: data_commit.clone(),
            path: path.display_path().to_string(),
            stream: path.stream.as_str().to_string(),
        })
    }

    // =========================================================================
    // List internals
    // =========================================================================

    /// Locate the data object the user is asking about, if it exists.
    ///
    /// With a data revision this is the object at `<rev>:<path>`. Without
    /// one, only a clean working-tree file can be matched, by hashing it
    /// and checking the store; directories and missing paths yield `None`.
    fn find_requested_object(&self, path: &MetadataPath) -> Result<Option<Resolved>, MetaError> {
        match path.datarev.as_deref() {
            Some(rev) => match self.git.resolve_at(rev, &path.path) {
                Ok(
                    resolved @ Resolved {
                        kind: ObjectKind::Blob | ObjectKind::Tree,
                        ..
                    },
                ) => Ok(Some(resolved)),
                Ok(_) => Ok(None),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e.into()),
            },
            None => {
                let abs = self.git.workdir()?.join(&path.path);
                if !abs.is_file() {
                    return Ok(None);
                }
                let oid = self.git.hash_file(&abs)?;
                if self.git.contains_object(&oid)? {
                    self.debug(format!("blob specified has id {}", oid));
                    Ok(Some(Resolved {
                        oid,
                        kind: ObjectKind::Blob,
                    }))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn classify_entry(
        &self,
        path: &MetadataPath,
        requested: Option<&Resolved>,
        ancestors: &[Oid],
        entry_name: &str,
    ) -> ListEntry {
        const NOT_FOUND: &str = "matching data could not be found";

        let Some(requested) = requested else {
            return ListEntry {
                data_commit: entry_name.to_string(),
                data_in_commit: NOT_FOUND.to_string(),
                matches: false,
                inheritable: false,
                committed: None,
            };
        };

        // The entry name is a data commit id; resolve it and the object at
        // the logical path within it.
        let resolved = self
            .git
            .resolve_commit(entry_name)
            .ok()
            .and_then(|commit| {
                let time = self.git.commit_time(&commit).ok()?;
                let object = self.git.resolve_at(entry_name, &path.path).ok()?;
                Some((time, object))
            });

        let Some((time, object)) = resolved else {
            return ListEntry {
                data_commit: entry_name.to_string(),
                data_in_commit: NOT_FOUND.to_string(),
                matches: false,
                inheritable: false,
                committed: None,
            };
        };

        let (matches, data_in_commit) = if requested.kind == ObjectKind::Tree {
            (
                object.kind == ObjectKind::Tree,
                format!("path '{}'", path.display_path()),
            )
        } else {
            (object.oid == requested.oid, object.oid.to_string())
        };

        let inheritable = matches
            && path.datarev.is_some()
            && ancestors.iter().any(|a| a.as_str() == entry_name);

        ListEntry {
            data_commit: entry_name.to_string(),
            data_in_commit,
            matches,
            inheritable,
            committed: Some(time),
        }
    }

    fn debug(&self, message: impl std::fmt::Display) {
        output::debug(message, self.verbosity);
    }
}
