//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Validated Git reference name
//! - [`StreamName`] - Validated metadata stream name
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use gitmeta::core::types::{Oid, RefName, StreamName};
//!
//! // Valid constructions
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::new("refs/heads/metadata").unwrap();
//! let stream = StreamName::new("provenance").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(RefName::new("refs/heads/bad..ref").is_err());
//! assert!(StreamName::new("a/b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid stream name: {0}")]
    InvalidStreamName(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use gitmeta::core::types::Oid;
///
/// // Create from hex string (normalized to lowercase)
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
///
/// // Get abbreviated form
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters. If `len` exceeds the OID length,
    /// returns the full OID.
    ///
    /// # Example
    ///
    /// ```
    /// use gitmeta::core::types::Oid;
    ///
    /// let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
    /// assert_eq!(oid.short(7), "abc123d");
    /// assert_eq!(oid.short(4), "abc1");
    /// ```
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Validate an object id.
    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name.
///
/// Reference names must conform to Git's refname rules (see
/// `git check-ref-format`).
///
/// # Example
///
/// ```
/// use gitmeta::core::types::RefName;
///
/// // Fully qualified names pass through unchanged
/// let refname = RefName::qualified("refs/notes/meta").unwrap();
/// assert_eq!(refname.as_str(), "refs/notes/meta");
///
/// // Bare names become branch refs
/// let refname = RefName::qualified("metadata").unwrap();
/// assert_eq!(refname.as_str(), "refs/heads/metadata");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Create a ref name from user input, qualifying bare names.
    ///
    /// Names already under `refs/` are used as-is; anything else is
    /// rewritten to `refs/heads/<name>`.
    ///
    /// # Example
    ///
    /// ```
    /// use gitmeta::core::types::RefName;
    ///
    /// assert_eq!(
    ///     RefName::qualified("annotations").unwrap().as_str(),
    ///     "refs/heads/annotations"
    /// );
    /// assert_eq!(
    ///     RefName::qualified("refs/meta/annotations").unwrap().as_str(),
    ///     "refs/meta/annotations"
    /// );
    /// ```
    pub fn qualified(name: &str) -> Result<Self, TypeError> {
        if name.starts_with("refs/") {
            Self::new(name)
        } else {
            Self::new(format!("refs/heads/{name}"))
        }
    }

    /// Validate a ref name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        // Cannot be empty
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        // Cannot start or end with "/"
        if name.starts_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start with '/'".into(),
            ));
        }
        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }

        // Cannot end with ".lock"
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }

        // Cannot contain "..", "@{", or "//"
        if name.contains("..") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain '..'".into(),
            ));
        }
        if name.contains("@{") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain '@{'".into(),
            ));
        }
        if name.contains("//") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain '//'".into(),
            ));
        }

        // Cannot contain certain special characters
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }

        // Cannot contain ASCII control characters (0x00-0x1F or 0x7F)
        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidRefName(
                    "ref name cannot contain control characters".into(),
                ));
            }
        }

        // Check each component (split by /) for component-specific rules
        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated metadata stream name.
///
/// Streams are single tree entries under the sentinel segment, so they can
/// never collide with user paths, but they must not smuggle in path
/// separators of their own.
///
/// # Example
///
/// ```
/// use gitmeta::core::types::StreamName;
///
/// let stream = StreamName::new("metadata").unwrap();
/// assert_eq!(stream.as_str(), "metadata");
///
/// assert!(StreamName::new("a/b").is_err());
/// assert!(StreamName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamName(String);

impl StreamName {
    /// Create a new validated stream name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidStreamName` if the name is empty,
    /// contains a path separator, or contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidStreamName(
                "stream name cannot be empty".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(TypeError::InvalidStreamName(
                "stream name cannot contain path separators".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidStreamName(
                "stream name cannot be '.' or '..'".into(),
            ));
        }
        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidStreamName(
                    "stream name cannot contain control characters".into(),
                ));
            }
        }
        Ok(())
    }

    /// Get the stream name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StreamName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<StreamName> for String {
    fn from(name: StreamName) -> Self {
        name.0
    }
}

impl AsRef<str> for StreamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod oid {
        use super::*;

        #[test]
        fn valid_sha1() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.as_str().len(), 40);
        }

        #[test]
        fn valid_sha256() {
            let hex64 = "a".repeat(64);
            assert!(Oid::new(hex64).is_ok());
        }

        #[test]
        fn normalized_to_lowercase() {
            let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
            assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(Oid::new("abc123").is_err());
            assert!(Oid::new("").is_err());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(Oid::new("zzz123def4567890abc123def4567890abc12345").is_err());
        }

        #[test]
        fn short_form() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.short(7), "abc123d");
            assert_eq!(oid.short(100).len(), 40);
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(RefName::new("refs/heads/metadata").is_ok());
            assert!(RefName::new("refs/meta/annotations").is_ok());
            assert!(RefName::new("HEAD").is_ok());
        }

        #[test]
        fn qualified_bare_name() {
            let r = RefName::qualified("annotations").unwrap();
            assert_eq!(r.as_str(), "refs/heads/annotations");
        }

        #[test]
        fn qualified_full_name_unchanged() {
            let r = RefName::qualified("refs/notes/meta").unwrap();
            assert_eq!(r.as_str(), "refs/notes/meta");
        }

        #[test]
        fn rejects_invalid() {
            assert!(RefName::new("").is_err());
            assert!(RefName::new("/leading").is_err());
            assert!(RefName::new("trailing/").is_err());
            assert!(RefName::new("refs/heads/a..b").is_err());
            assert!(RefName::new("refs/heads/a b").is_err());
            assert!(RefName::new("refs/heads/x.lock").is_err());
            assert!(RefName::new("refs/heads/.hidden").is_err());
        }
    }

    mod stream_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(StreamName::new("metadata").is_ok());
            assert!(StreamName::new("provenance-v2").is_ok());
        }

        #[test]
        fn rejects_separators() {
            assert!(StreamName::new("a/b").is_err());
            assert!(StreamName::new("a\\b").is_err());
        }

        #[test]
        fn rejects_empty_and_dots() {
            assert!(StreamName::new("").is_err());
            assert!(StreamName::new(".").is_err());
            assert!(StreamName::new("..").is_err());
        }
    }
}
