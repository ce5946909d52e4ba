//! Zarr storage (stores).
//!
//! A Zarr store is a system that can be used to store and retrieve data from a Zarr hierarchy.
//! For example: a filesystem, HTTP server, Amazon S3 bucket, ZIP file, etc.
//! This module defines abstract store interfaces over ASCII keys and opaque byte values, and
//! includes the bundled [`MemoryStore`](store::MemoryStore) and
//! [`FilesystemStore`](store::FilesystemStore).
//!
//! The store is the single source of truth; no decoded data is cached by this crate.

mod keys;
mod storage_sync;
pub mod store;

use thiserror::Error;

use crate::node::{NodePath, NodePathError};

pub use keys::{StoreKey, StoreKeyError, StoreKeys, StorePrefix, StorePrefixError};
pub use storage_sync::{
    ListableStorageTraits, ReadableListableStorageTraits, ReadableStorageTraits,
    ReadableWritableListableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

/// The bytes of a stored value, if present.
pub type MaybeBytes = Option<Vec<u8>>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error("invalid node path {0}")]
    NodePathError(#[from] NodePathError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the metadata key given a node path for a specified metadata file name.
#[must_use]
fn meta_key_any(path: &NodePath, metadata_file_name: &str) -> StoreKey {
    if path.is_root() {
        StoreKey::new_unvalidated(metadata_file_name.to_string())
    } else {
        StoreKey::new_unvalidated(format!("{}/{metadata_file_name}", path.as_str()))
    }
}

/// Return the array metadata key (`.zarray`) given a node path.
#[must_use]
pub fn meta_key_array(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zarray")
}

/// Return the group metadata key (`.zgroup`) given a node path.
#[must_use]
pub fn meta_key_group(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zgroup")
}

/// Return the user-defined attributes key (`.zattrs`) given a node path.
#[must_use]
pub fn meta_key_attributes(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zattrs")
}

/// Return the chunk data key given a node path and chunk grid coordinates.
///
/// The chunk key suffix is the decimal grid indices joined by `.`, or `0` for a zero
/// dimensional array.
#[must_use]
pub fn data_key(path: &NodePath, chunk_grid_indices: &[u64]) -> StoreKey {
    meta_key_any(path, &crate::array::chunk_key(chunk_grid_indices))
}
