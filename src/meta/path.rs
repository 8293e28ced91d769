//! meta::path
//!
//! Parsing of user path expressions.
//!
//! A path expression selects the metadata attached to one object version:
//!
//! ```text
//! [s+|s-]<datarev>:<path>[:<stream>]
//! [s+|s-]<path>
//! ```
//!
//! `s+` (or `search+`) allows the engine to walk the data history
//! backwards to the commit that introduced the object; `s-` (or
//! `search-`) pins the revision exactly as given. Commands that never
//! search (`list`, `log`, `ls`) accept the prefix but ignore it.
//!
//! Empty segments fall back to defaults: no data revision (resolved later
//! by policy), the current working directory as the path, and the
//! `"metadata"` stream.
//!
//! After parsing, the logical path is normalized, resolved against a base
//! directory if relative, and rewritten relative to the repository's
//! working directory.

use std::path::Path;
use std::sync::OnceLock;

use uuid::Uuid;

use crate::core::types::{Oid, StreamName};
use crate::meta::error::MetaError;

/// The sentinel path segment separating user path space from metadata
/// subtrees.
///
/// Derived once from the literal word "metadata" as a name-based UUID in
/// the X.500 namespace, so it can never collide with a user-chosen path
/// component. The value is stable across runs and releases:
/// `92df1d6a-b6da-5ddb-9055-44349d03203e`.
pub fn metadata_sentinel() -> &'static str {
    static SENTINEL: OnceLock<String> = OnceLock::new();
    SENTINEL.get_or_init(|| Uuid::new_v5(&Uuid::NAMESPACE_X500, b"metadata").to_string())
}

/// Default stream name when the expression omits one.
pub const STREAM_DEFAULT: &str = "metadata";

/// How the engine is allowed to locate the data commit for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// `s+`: walk back through the data history for the commit that
    /// introduced the object.
    SearchBackward,
    /// `s-`: use exactly the revision specified.
    RevisionOnly,
    /// No search semantics (list/log contexts).
    NoSearch,
}

/// A parsed and rewritten path expression.
#[derive(Debug, Clone)]
pub struct MetadataPath {
    /// The data revision as written, if any. `None` is resolved later by
    /// policy (see `MetadataStore::default_datarev`).
    pub datarev: Option<String>,
    /// Logical path relative to the repository working directory, with
    /// `/` separators. Empty means the repository root.
    pub path: String,
    /// The metadata stream.
    pub stream: StreamName,
    /// The search mode requested (or [`SearchMode::NoSearch`]).
    pub mode: SearchMode,
    /// True when a search prefix was given in a context that ignores it.
    pub prefix_ignored: bool,
}

impl MetadataPath {
    /// Parse a path expression.
    ///
    /// * `requires_search` - whether the expression must carry `s+`/`s-`.
    /// * `base_dir` - base for relative paths; must be absolute. Defaults
    ///   to the process working directory.
    /// * `workdir` - the repository working directory. When given, the
    ///   absolute logical path must live under it and is stored relative
    ///   to it; otherwise the absolute path is kept.
    pub fn parse(
        raw: &str,
        requires_search: bool,
        base_dir: Option<&Path>,
        workdir: Option<&Path>,
    ) -> Result<Self, MetaError> {
        if raw.contains(';') || raw.contains('\r') || raw.contains('\n') {
            return Err(syntax_error(raw, requires_search));
        }

        // Optional search prefix, longest spelling first.
        let (prefix, rest) = strip_search_prefix(raw);

        let (datarev, path_seg, stream_seg) = match rest.split(':').collect::<Vec<_>>()[..] {
            [path] => (None, path, None),
            [rev, path] => (non_empty(rev), path, None),
            [rev, path, stream] => (non_empty(rev), path, non_empty(stream)),
            // Tolerated spelling with a colon right after the search
            // prefix: `s-:<datarev>:<path>:<stream>`.
            ["", rev, path, stream] if prefix.is_some() => {
                (non_empty(rev), path, non_empty(stream))
            }
            _ => return Err(syntax_error(raw, requires_search)),
        };

        let stream = StreamName::new(stream_seg.unwrap_or(STREAM_DEFAULT))?;

        let (mode, prefix_ignored) = if requires_search {
            match prefix {
                Some('+') => (SearchMode::SearchBackward, false),
                Some('-') => (SearchMode::RevisionOnly, false),
                None => {
                    return Err(MetaError::parameter(
                        "please specify 's+' (search back) or 's-' (this revision only)",
                    ))
                }
                Some(_) => unreachable!("strip_search_prefix only returns '+', '-', or None"),
            }
        } else {
            (SearchMode::NoSearch, prefix.is_some())
        };

        let path = rewrite_path(path_seg, base_dir, workdir)?;

        Ok(Self {
            datarev: datarev.map(str::to_string),
            path,
            stream,
            mode,
            prefix_ignored,
        })
    }

    /// The logical path for display: `.` for the repository root.
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "."
        } else {
            &self.path
        }
    }

    /// Tree path of the metadata node: `<path>/<sentinel>`.
    ///
    /// Children of this tree are streams.
    pub fn node_path(&self) -> String {
        join_segments(&self.path, &[metadata_sentinel()])
    }

    /// Tree path of the metadata stream: `<path>/<sentinel>/<stream>`.
    ///
    /// Children of this tree are per-data-commit blobs.
    pub fn stream_path(&self) -> String {
        join_segments(&self.path, &[metadata_sentinel(), self.stream.as_str()])
    }

    /// Canonical blob path for a specific data commit:
    /// `<path>/<sentinel>/<stream>/<data_commit_id>`.
    pub fn blob_path(&self, data_commit: &Oid) -> String {
        join_segments(
            &self.path,
            &[metadata_sentinel(), self.stream.as_str(), data_commit.as_str()],
        )
    }

    /// The blob path as an ordered segment list, root to leaf, for tree
    /// synthesis.
    pub fn blob_segments(&self, data_commit: &Oid) -> Vec<String> {
        let mut segments: Vec<String> = self
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        segments.push(metadata_sentinel().to_string());
        segments.push(self.stream.as_str().to_string());
        segments.push(data_commit.as_str().to_string());
        segments
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn strip_search_prefix(raw: &str) -> (Option<char>, &str) {
    for spelling in ["search+", "search-", "s+", "s-"] {
        if let Some(rest) = raw.strip_prefix(spelling) {
            let sign = spelling.chars().last();
            return (sign, rest);
        }
    }
    (None, raw)
}

fn syntax_error(raw: &str, requires_search: bool) -> MetaError {
    let prefix = if requires_search { "(s+|s-)" } else { "" };
    MetaError::parameter(format!(
        "could not parse '{}': use syntax {}datarev:metadatapath[:stream]",
        raw, prefix
    ))
}

/// Normalize a path lexically: collapse separators and resolve `.`/`..`
/// components without touching the filesystem.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();

    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&"..") => stack.push(".."),
                Some(_) => {
                    stack.pop();
                }
                None => {
                    if !absolute {
                        stack.push("..");
                    }
                }
            },
            c => stack.push(c),
        }
    }

    let joined = stack.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Resolve the raw path segment to an absolute path, then rewrite it
/// relative to the repository working directory if one was supplied.
fn rewrite_path(
    path_seg: &str,
    base_dir: Option<&Path>,
    workdir: Option<&Path>,
) -> Result<String, MetaError> {
    if let Some(base) = base_dir {
        if !base.is_absolute() {
            return Err(MetaError::parameter("base path needs to be absolute"));
        }
    }

    let base = match base_dir {
        Some(b) => b.to_path_buf(),
        None => std::env::current_dir().map_err(|e| MetaError::Parameter {
            message: format!("could not determine working directory: {}", e),
        })?,
    };

    let absolute = if path_seg.is_empty() {
        normalize(&base.to_string_lossy())
    } else {
        let normalized = normalize(path_seg);
        if normalized.starts_with('/') {
            normalized
        } else {
            normalize(&format!("{}/{}", base.to_string_lossy(), normalized))
        }
    };

    let Some(workdir) = workdir else {
        return Ok(absolute);
    };

    let wd = normalize(&workdir.to_string_lossy());
    if let Some(rel) = strip_dir_prefix(&absolute, &wd) {
        return Ok(rel.to_string());
    }

    // The workdir may reach the same directory through a symlink (e.g.
    // /tmp on macOS); retry with the canonicalized form.
    if let Ok(canonical) = workdir.canonicalize() {
        let wd = normalize(&canonical.to_string_lossy());
        if let Some(rel) = strip_dir_prefix(&absolute, &wd) {
            return Ok(rel.to_string());
        }
    }

    Err(MetaError::parameter(format!(
        "absolute path '{}' not within repository",
        absolute
    )))
}

/// Strip `dir` (no trailing slash) from the front of `path`, returning
/// the remainder without a leading slash. Whole-component matches only.
fn strip_dir_prefix<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if path == dir {
        return Some("");
    }
    let dir = dir.trim_end_matches('/');
    path.strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
}

/// Join a (possibly empty) relative path with further segments.
fn join_segments(path: &str, segments: &[&str]) -> String {
    let mut out = String::from(path);
    for segment in segments {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const WD: &str = "/repo";

    fn parse_in_repo(raw: &str, requires_search: bool) -> Result<MetadataPath, MetaError> {
        MetadataPath::parse(
            raw,
            requires_search,
            Some(Path::new("/repo/sub")),
            Some(Path::new(WD)),
        )
    }

    mod sentinel {
        use super::*;

        #[test]
        fn stable_value() {
            // uuid5(NAMESPACE_X500, "metadata"); pinned so the on-disk
            // layout can never silently change.
            assert_eq!(metadata_sentinel(), "92df1d6a-b6da-5ddb-9055-44349d03203e");
        }
    }

    mod grammar {
        use super::*;

        #[test]
        fn full_expression() {
            let p = parse_in_repo("s+HEAD:docs/a.txt:notes", true).unwrap();
            assert_eq!(p.datarev.as_deref(), Some("HEAD"));
            assert_eq!(p.path, "docs/a.txt");
            assert_eq!(p.stream.as_str(), "notes");
            assert_eq!(p.mode, SearchMode::SearchBackward);
        }

        #[test]
        fn long_prefix_spelling() {
            let p = parse_in_repo("search-HEAD:docs/a.txt", true).unwrap();
            assert_eq!(p.mode, SearchMode::RevisionOnly);

            let p = parse_in_repo("search+HEAD:docs/a.txt", true).unwrap();
            assert_eq!(p.mode, SearchMode::SearchBackward);
        }

        #[test]
        fn omitted_stream_defaults() {
            let p = parse_in_repo("s-HEAD:docs/a.txt", true).unwrap();
            assert_eq!(p.stream.as_str(), "metadata");
        }

        #[test]
        fn omitted_datarev_is_none() {
            let p = parse_in_repo("s-:docs/a.txt:notes", true).unwrap();
            assert_eq!(p.datarev, None);
        }

        #[test]
        fn colonless_shorthand() {
            let p = parse_in_repo("docs/a.txt", false).unwrap();
            assert_eq!(p.datarev, None);
            assert_eq!(p.path, "sub/docs/a.txt");
            assert_eq!(p.stream.as_str(), "metadata");
            assert_eq!(p.mode, SearchMode::NoSearch);
        }

        #[test]
        fn empty_path_is_base_dir() {
            let p = parse_in_repo("s-HEAD::notes", true).unwrap();
            assert_eq!(p.path, "sub");
        }

        #[test]
        fn too_many_colons_rejected() {
            let err = parse_in_repo("a:b:c:d", true).unwrap_err();
            assert_eq!(err.kind(), "ParameterError");
            assert!(err.to_string().contains("datarev:metadatapath[:stream]"));

            // Even with a prefix, only the leading-empty spelling is
            // tolerated.
            assert!(parse_in_repo("s-a:b:c:d", true).is_err());
        }

        #[test]
        fn colon_after_prefix_is_tolerated() {
            let p = parse_in_repo("s-:HEAD:docs/a.txt:notes", true).unwrap();
            assert_eq!(p.datarev.as_deref(), Some("HEAD"));
            assert_eq!(p.path, "docs/a.txt");
            assert_eq!(p.stream.as_str(), "notes");

            let p = parse_in_repo("s+::docs/a.txt:notes", true).unwrap();
            assert_eq!(p.datarev, None);
            assert_eq!(p.path, "docs/a.txt");
            assert_eq!(p.mode, SearchMode::SearchBackward);
        }

        #[test]
        fn newlines_and_semicolons_rejected() {
            assert!(parse_in_repo("a:b\nc", false).is_err());
            assert!(parse_in_repo("a;b", false).is_err());
        }

        #[test]
        fn missing_required_prefix_rejected() {
            let err = parse_in_repo("HEAD:docs/a.txt", true).unwrap_err();
            assert!(err.to_string().contains("s+"));
        }

        #[test]
        fn prefix_ignored_when_not_required() {
            let p = parse_in_repo("s+HEAD:docs/a.txt", false).unwrap();
            assert_eq!(p.mode, SearchMode::NoSearch);
            assert!(p.prefix_ignored);
        }

        #[test]
        fn stream_with_separator_rejected() {
            assert!(parse_in_repo("s-HEAD:docs/a.txt:a/b", true).is_err());
        }
    }

    mod rewriting {
        use super::*;

        #[test]
        fn relative_path_joined_to_base() {
            let p = parse_in_repo("s-HEAD:x/y.txt", true).unwrap();
            assert_eq!(p.path, "sub/x/y.txt");
        }

        #[test]
        fn absolute_path_inside_repo() {
            let p = parse_in_repo("s-HEAD:/repo/docs/a.txt", true).unwrap();
            assert_eq!(p.path, "docs/a.txt");
        }

        #[test]
        fn workdir_itself_is_empty_path() {
            let p = parse_in_repo("s-HEAD:/repo", true).unwrap();
            assert_eq!(p.path, "");
            assert_eq!(p.display_path(), ".");
        }

        #[test]
        fn dotdot_resolved_lexically() {
            let p = parse_in_repo("s-HEAD:../docs/a.txt", true).unwrap();
            assert_eq!(p.path, "docs/a.txt");
        }

        #[test]
        fn path_outside_repo_rejected() {
            let err = parse_in_repo("s-HEAD:/elsewhere/a.txt", true).unwrap_err();
            assert_eq!(err.kind(), "ParameterError");
            assert!(err.to_string().contains("not within repository"));
        }

        #[test]
        fn prefix_match_is_per_component() {
            // /repository is not inside /repo
            let err = parse_in_repo("s-HEAD:/repository/a.txt", true).unwrap_err();
            assert_eq!(err.kind(), "ParameterError");
        }

        #[test]
        fn relative_base_rejected() {
            let err = MetadataPath::parse(
                "s-HEAD:a.txt",
                true,
                Some(Path::new("relative/base")),
                Some(Path::new(WD)),
            )
            .unwrap_err();
            assert!(err.to_string().contains("absolute"));
        }

        #[test]
        fn no_workdir_keeps_absolute_path() {
            let p =
                MetadataPath::parse("s-HEAD:a.txt", true, Some(Path::new("/base")), None).unwrap();
            assert_eq!(p.path, "/base/a.txt");
        }
    }

    mod canonical_paths {
        use super::*;

        fn oid() -> Oid {
            Oid::new("abc123def4567890abc123def4567890abc12345").unwrap()
        }

        #[test]
        fn blob_path_layout() {
            let p = parse_in_repo("s-HEAD:/repo/docs/a.txt:notes", true).unwrap();
            assert_eq!(
                p.blob_path(&oid()),
                format!(
                    "docs/a.txt/{}/notes/abc123def4567890abc123def4567890abc12345",
                    metadata_sentinel()
                )
            );
        }

        #[test]
        fn root_path_has_no_leading_slash() {
            let p = parse_in_repo("s-HEAD:/repo", true).unwrap();
            assert_eq!(p.node_path(), metadata_sentinel());
            assert!(p.stream_path().starts_with(metadata_sentinel()));
        }

        #[test]
        fn segments_root_to_leaf() {
            let p = parse_in_repo("s-HEAD:/repo/docs/a.txt:notes", true).unwrap();
            let segments = p.blob_segments(&oid());
            assert_eq!(
                segments,
                vec![
                    "docs".to_string(),
                    "a.txt".to_string(),
                    metadata_sentinel().to_string(),
                    "notes".to_string(),
                    "abc123def4567890abc123def4567890abc12345".to_string(),
                ]
            );
        }
    }

    mod normalization {
        use super::*;

        #[test]
        fn collapses_dots_and_slashes() {
            assert_eq!(normalize("a/./b//c"), "a/b/c");
            assert_eq!(normalize("a/b/../c"), "a/c");
            assert_eq!(normalize("/a/../.."), "/");
            assert_eq!(normalize("../a"), "../a");
            assert_eq!(normalize(""), ".");
        }

        #[test]
        fn idempotent() {
            for p in ["a/b/c", "/x/y", ".", "../a", "/"] {
                assert_eq!(normalize(&normalize(p)), normalize(p));
            }
        }
    }
}
