//! Store keys and key prefixes.
//!
//! A [`StoreKey`] addresses one value in a store; a [`StorePrefix`] addresses the subtree of
//! keys sharing a leading path. Both are restricted to ASCII, and the `/` separator carries
//! the hierarchy: keys never start or end with it, prefixes always end with it (the root
//! prefix is the empty string).

use derive_more::{Display, From};
use thiserror::Error;

/// A store key: a non-empty ASCII string that neither starts nor ends with `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StoreKey(String);

/// A store key prefix: the empty root prefix, or an ASCII string of non-empty `/`-separated
/// parts ending with a trailing `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StorePrefix(String);

/// An invalid store key.
#[derive(Debug, From, Error)]
#[error("invalid store key {0}")]
pub struct StoreKeyError(String);

/// An invalid store prefix.
#[derive(Debug, From, Error)]
#[error("invalid store prefix {0}")]
pub struct StorePrefixError(String);

/// A list of [`StoreKey`].
pub type StoreKeys = Vec<StoreKey>;

fn key_is_valid(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.first().is_some_and(|&first| first != b'/')
        && bytes.last().is_some_and(|&last| last != b'/')
        && key.is_ascii()
}

fn prefix_is_valid(prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if !prefix.is_ascii() || !prefix.ends_with('/') {
        return false;
    }
    // Every part before the trailing separator must be non-empty, which also rules out a
    // leading `/` and any `//`.
    let mut parts = prefix.split('/');
    parts.next_back();
    parts.all(|part| !part.is_empty())
}

impl StoreKey {
    /// Create a store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is empty, contains non-ASCII characters, or starts
    /// or ends with `/`.
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if key_is_valid(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// Create a store key from a `key` already known to be valid.
    pub(crate) fn new_unvalidated(key: String) -> Self {
        debug_assert!(key_is_valid(&key));
        Self(key)
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

impl StorePrefix {
    /// The root prefix, under which every key lies.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Create a store prefix from `prefix`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is non-empty and is not an ASCII string of
    /// non-empty `/`-separated parts with a trailing `/`.
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if prefix_is_valid(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    /// Create a store prefix from a `prefix` already known to be valid.
    pub(crate) fn new_unvalidated(prefix: String) -> Self {
        debug_assert!(prefix_is_valid(&prefix));
        Self(prefix)
    }

    /// The prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `key` lies under this prefix.
    ///
    /// Every key lies under the root prefix.
    #[must_use]
    pub fn contains_key(&self, key: &StoreKey) -> bool {
        key.as_str().starts_with(&self.0)
    }
}

impl TryFrom<&str> for StorePrefix {
    type Error = StorePrefixError;

    fn try_from(prefix: &str) -> Result<Self, Self::Error> {
        Self::new(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validity() {
        for valid in ["a", "a/b", ".zarray", "deep/path/0.0"] {
            assert!(StoreKey::new(valid).is_ok(), "{valid} should be a valid key");
        }
        for invalid in ["", "/", "/a", "a/", "a/b/", "clé"] {
            assert!(
                StoreKey::new(invalid).is_err(),
                "{invalid} should not be a valid key"
            );
        }
        assert_eq!(StoreKey::new("a/b").unwrap().as_str(), "a/b");
        assert_eq!(
            StoreKey::new("/a").unwrap_err().to_string(),
            "invalid store key /a"
        );
    }

    #[test]
    fn prefix_validity() {
        for valid in ["", "a/", "a/b/"] {
            assert!(
                StorePrefix::new(valid).is_ok(),
                "{valid:?} should be a valid prefix"
            );
        }
        for invalid in ["a", "/", "/a/", "a//b/", "é/"] {
            assert!(
                StorePrefix::new(invalid).is_err(),
                "{invalid} should not be a valid prefix"
            );
        }
        assert_eq!(StorePrefix::root(), StorePrefix::new("").unwrap());
        assert_eq!(
            StorePrefix::new("a/b").unwrap_err().to_string(),
            "invalid store prefix a/b"
        );
    }

    #[test]
    fn prefix_key_containment() {
        let key: StoreKey = "a/b/c".try_into().unwrap();
        assert!(StorePrefix::root().contains_key(&key));
        assert!(StorePrefix::new("a/").unwrap().contains_key(&key));
        assert!(StorePrefix::new("a/b/").unwrap().contains_key(&key));
        assert!(!StorePrefix::new("b/").unwrap().contains_key(&key));
        assert!(!StorePrefix::new("a/b/c/").unwrap().contains_key(&key));
    }
}
