//! Key paths and listed children.

use std::fmt;

/// The segment delimiter used by every backend.
pub const DELIMITER: char = '/';

/// Errors related to key path parsing and listing classification.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment of the path is empty (`a//b`, or a leading `/`).
    #[error("empty segment at position {position} in key path '{path}'")]
    EmptySegment { path: String, position: usize },

    /// A listed name cannot be turned into a child of its parent.
    #[error("invalid listed name '{name}': {message}")]
    InvalidListedName { name: String, message: String },
}

/// A location in a hierarchical key/value namespace.
///
/// Segments are non-empty strings. The empty path is the namespace root.
/// The textual form joins segments with `/`, so `KeyPath::parse("b/c")`
/// addresses the leaf `c` inside the subtree `b`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The namespace root.
    pub fn root() -> Self {
        KeyPath::default()
    }

    /// Parse a `/`-delimited key path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vault_migrator_backend::KeyPath;
    ///
    /// let key = KeyPath::parse("sys/token/accessor").unwrap();
    /// assert_eq!(key.len(), 3);
    /// assert_eq!(key.to_string(), "sys/token/accessor");
    ///
    /// assert!(KeyPath::parse("").unwrap().is_root());
    /// assert!(KeyPath::parse("a//b").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Ok(KeyPath::root());
        }

        let mut segments = Vec::new();
        for (position, segment) in s.split(DELIMITER).enumerate() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    path: s.to_string(),
                    position,
                });
            }
            segments.push(segment.to_string());
        }

        Ok(KeyPath { segments })
    }

    /// Check if this is the namespace root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path has no segments. Same as [`KeyPath::is_root`].
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate over segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment, or `None` for the root.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.is_root() {
            return None;
        }
        Some(KeyPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Join this path with a relative one.
    #[must_use]
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }

    /// Check if this path starts with `prefix`.
    pub fn has_prefix(&self, prefix: &KeyPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix.segments == self.segments[..prefix.segments.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &KeyPath) -> Option<KeyPath> {
        if self.has_prefix(prefix) {
            Some(KeyPath {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

/// One immediate child of a listed path.
///
/// Backends report subtrees by suffixing the listed name with `/`. That
/// string convention is resolved once here so the copy walk never inspects
/// raw names again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Child {
    /// An intermediate node; its relative path has the marker stripped.
    Subtree(KeyPath),
    /// A key holding a value.
    Leaf(KeyPath),
}

impl Child {
    /// Classify one raw name returned by [`Backend::list`](crate::Backend::list).
    ///
    /// ```rust
    /// use vault_migrator_backend::{Child, KeyPath};
    ///
    /// let child = Child::from_listed("logical/").unwrap();
    /// assert_eq!(child, Child::Subtree(KeyPath::parse("logical").unwrap()));
    ///
    /// let child = Child::from_listed("core").unwrap();
    /// assert_eq!(child, Child::Leaf(KeyPath::parse("core").unwrap()));
    /// ```
    pub fn from_listed(name: &str) -> Result<Self, PathError> {
        let invalid = |message: &str| PathError::InvalidListedName {
            name: name.to_string(),
            message: message.to_string(),
        };

        match name.strip_suffix(DELIMITER) {
            Some("") => Err(invalid("a bare delimiter names the parent itself")),
            Some(subtree) => KeyPath::parse(subtree)
                .map(Child::Subtree)
                .map_err(|e| invalid(&e.to_string())),
            None if name.is_empty() => Err(invalid("empty name")),
            None => KeyPath::parse(name)
                .map(Child::Leaf)
                .map_err(|e| invalid(&e.to_string())),
        }
    }

    /// The child's path relative to the listed parent.
    pub fn relative(&self) -> &KeyPath {
        match self {
            Child::Subtree(path) | Child::Leaf(path) => path,
        }
    }

    /// The child's full path under `parent`.
    pub fn under(&self, parent: &KeyPath) -> KeyPath {
        parent.join(self.relative())
    }

}

/// Macro for creating key paths from literals.
///
/// # Example
///
/// ```rust
/// use vault_migrator_backend::key;
///
/// let k = key!("core/mounts");
/// assert_eq!(k.len(), 2);
/// ```
#[macro_export]
macro_rules! key {
    ($s:expr) => {
        $crate::KeyPath::parse($s).expect("invalid key path literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(KeyPath::parse("").unwrap().len(), 0);
        assert_eq!(KeyPath::parse("foo").unwrap().len(), 1);
        assert_eq!(KeyPath::parse("foo/bar").unwrap().len(), 2);
        assert_eq!(KeyPath::parse("foo/bar/baz").unwrap().len(), 3);
    }

    #[test]
    fn segments_keep_arbitrary_characters() {
        let k = KeyPath::parse("sys/policy/my policy.v2-final").unwrap();
        assert_eq!(k.name(), Some("my policy.v2-final"));
    }

    #[test]
    fn empty_segments_rejected() {
        assert_eq!(
            KeyPath::parse("a//b"),
            Err(PathError::EmptySegment {
                path: "a//b".to_string(),
                position: 1,
            })
        );
        assert!(KeyPath::parse("/a").is_err());
        assert!(KeyPath::parse("a/").is_err());
    }

    #[test]
    fn display_round_trips() {
        let k = key!("b/c");
        assert_eq!(k.to_string(), "b/c");
        assert_eq!(KeyPath::root().to_string(), "");
    }

    #[test]
    fn parent_and_name() {
        let k = key!("a/b/c");
        assert_eq!(k.parent(), Some(key!("a/b")));
        assert_eq!(k.name(), Some("c"));
        assert_eq!(KeyPath::root().parent(), None);
        assert_eq!(key!("a").parent(), Some(KeyPath::root()));
    }

    #[test]
    fn has_prefix_works() {
        let p = key!("foo/bar/baz");
        assert!(p.has_prefix(&KeyPath::root()));
        assert!(p.has_prefix(&key!("foo")));
        assert!(p.has_prefix(&key!("foo/bar/baz")));
        assert!(!p.has_prefix(&key!("bar")));
        assert!(!p.has_prefix(&key!("foo/bar/baz/qux")));
        assert_eq!(p.strip_prefix(&key!("foo")), Some(key!("bar/baz")));
        assert_eq!(p.strip_prefix(&key!("bar")), None);
    }

    #[test]
    fn classify_listed_names() {
        assert_eq!(
            Child::from_listed("b/").unwrap(),
            Child::Subtree(key!("b"))
        );
        assert_eq!(Child::from_listed("a").unwrap(), Child::Leaf(key!("a")));
    }

    #[test]
    fn degenerate_listed_names_rejected() {
        assert!(matches!(
            Child::from_listed(""),
            Err(PathError::InvalidListedName { .. })
        ));
        assert!(matches!(
            Child::from_listed("/"),
            Err(PathError::InvalidListedName { .. })
        ));
        assert!(Child::from_listed("a//").is_err());
    }

    #[test]
    fn child_under_parent() {
        let parent = key!("secret");
        assert_eq!(
            Child::from_listed("foo/").unwrap().under(&parent),
            key!("secret/foo")
        );
        assert_eq!(
            Child::from_listed("bar").unwrap().under(&KeyPath::root()),
            key!("bar")
        );
    }
}
