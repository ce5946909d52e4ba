use derive_more::Display;
use thiserror::Error;

use crate::storage::StorePrefix;

/// A Zarr hierarchy node path.
///
/// A node path is stored in canonical form: `/`-separated non-empty ASCII segments with no
/// leading or trailing `/`. The root path is the empty string.
///
/// [`NodePath::new`] canonicalises a raw path before validation:
/// - each `\` is replaced with `/`,
/// - leading and trailing `/` are stripped, and
/// - runs of `/` are collapsed.
///
/// Canonicalisation is idempotent. A path with a `.` or `..` segment, or with non-ASCII
/// characters, is invalid.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("/{_0}")]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new Zarr node path from `path`, canonicalising it.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if any canonical segment is `.` or `..` or contains non-ASCII
    /// characters.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        let path = path.replace('\\', "/");
        let mut canonical = String::with_capacity(path.len());
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            if segment == "." || segment == ".." || !segment.is_ascii() {
                return Err(NodePathError(path.clone()));
            }
            if !canonical.is_empty() {
                canonical.push('/');
            }
            canonical.push_str(segment);
        }
        Ok(Self(canonical))
    }

    /// The root node path.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice containing the canonical path.
    ///
    /// The root path is the empty string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the key prefix of this path: the canonical path followed by `/`, or the empty
    /// prefix at the root.
    #[must_use]
    pub fn prefix(&self) -> StorePrefix {
        if self.is_root() {
            StorePrefix::root()
        } else {
            StorePrefix::new_unvalidated(format!("{}/", self.0))
        }
    }

    /// Return the name of the node: the last path segment, or an empty string at the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Return the parent path, or [`None`] at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let parent = self.0.rfind('/').map_or("", |pos| &self.0[..pos]);
            Some(Self(parent.to_string()))
        }
    }

    /// Return the proper ancestors of this path, nearest first, ending with the root.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            ancestors.push(parent.clone());
            current = parent;
        }
        ancestors
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_canonicalisation() {
        assert_eq!(NodePath::new("").unwrap(), NodePath::root());
        assert_eq!(NodePath::new("/").unwrap(), NodePath::root());
        assert_eq!(NodePath::new("a/b").unwrap().as_str(), "a/b");
        assert_eq!(NodePath::new("/a/b/").unwrap().as_str(), "a/b");
        assert_eq!(NodePath::new("a//b").unwrap().as_str(), "a/b");
        assert_eq!(NodePath::new("\\foo\\\\bar/").unwrap().as_str(), "foo/bar");
        assert_eq!(
            NodePath::new("\\foo\\\\bar/").unwrap().prefix(),
            StorePrefix::new("foo/bar/").unwrap()
        );
    }

    #[test]
    fn node_path_idempotent() {
        for raw in ["", "/", "a/b", "/a//b\\c/", "\\foo\\\\bar/"] {
            let canonical = NodePath::new(raw).unwrap();
            assert_eq!(NodePath::new(canonical.as_str()).unwrap(), canonical);
        }
    }

    #[test]
    fn node_path_invalid() {
        assert!(NodePath::new("foo/../bar").is_err());
        assert!(NodePath::new("./foo").is_err());
        assert!(NodePath::new("..").is_err());
        assert!(NodePath::new("a/ü").is_err());
        assert_eq!(
            NodePath::new("foo/../bar").unwrap_err().to_string(),
            "invalid node path foo/../bar"
        );
    }

    #[test]
    fn node_path_relations() {
        let path = NodePath::new("a/b/c").unwrap();
        assert_eq!(path.name(), "c");
        assert_eq!(path.parent(), Some(NodePath::new("a/b").unwrap()));
        assert_eq!(
            path.ancestors(),
            vec![
                NodePath::new("a/b").unwrap(),
                NodePath::new("a").unwrap(),
                NodePath::root()
            ]
        );
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().prefix(), StorePrefix::root());
        assert_eq!(path.to_string(), "/a/b/c");
    }
}
