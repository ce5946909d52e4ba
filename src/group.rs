//! Zarr groups.
//!
//! A group is a node in a Zarr hierarchy. It carries only a format version marker (its
//! `.zgroup` document) and user attributes (a sibling `.zattrs` document), and may have child
//! nodes (groups or [arrays](crate::array)).
//!
//! Use [`create_group`](crate::hierarchy::create_group) to create a group together with its
//! implicit ancestors, or [`Group::open`] to read an existing group.

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

use crate::{
    metadata::{self, GroupMetadata},
    node::{NodePath, NodePathError},
    storage::{
        meta_key_attributes, meta_key_group, ReadableStorageTraits, StorageError,
        WritableStorageTraits,
    },
};

/// A group.
#[derive(Clone, Debug, Display)]
#[display("group at {path}")]
pub struct Group<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the group in the store.
    path: NodePath,
    /// The metadata.
    metadata: GroupMetadata,
    /// User defined attributes, stored in the sibling `.zattrs` document.
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// A group creation error.
#[derive(Debug, Error)]
pub enum GroupCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("group metadata is missing")]
    MissingMetadata,
}

impl<TStorage: ?Sized> Group<TStorage> {
    /// Create a group in `storage` at `path`.
    ///
    /// This does **not** write to the store, use [`store_metadata`](Group::store_metadata) to
    /// write the group to `storage`.
    ///
    /// # Errors
    /// Returns [`GroupCreateError`] if the path is invalid.
    pub fn new(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let path = NodePath::new(path)?;
        Ok(Self {
            storage,
            path,
            metadata: GroupMetadata::default(),
            attributes: serde_json::Map::default(),
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Return the underlying group metadata.
    #[must_use]
    pub const fn metadata(&self) -> &GroupMetadata {
        &self.metadata
    }

    /// Get the user attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Mutably borrow the user attributes.
    ///
    /// Attribute changes must be persisted with [`store_metadata`](Group::store_metadata).
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.attributes
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Group<TStorage> {
    /// Open a group in `storage` at `path`. The metadata is read from the store.
    ///
    /// # Errors
    /// Returns [`GroupCreateError`] if the group does not exist, there is a storage error, or
    /// any metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let node_path = NodePath::new(path)?;
        let key = meta_key_group(&node_path);
        let metadata_bytes = storage.get(&key)?.ok_or(GroupCreateError::MissingMetadata)?;
        let metadata: GroupMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;

        let attributes_key = meta_key_attributes(&node_path);
        let attributes = match storage.get(&attributes_key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| StorageError::InvalidMetadata(attributes_key, err.to_string()))?,
            None => serde_json::Map::default(),
        };

        Ok(Self {
            storage,
            path: node_path,
            metadata,
            attributes,
        })
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Group<TStorage> {
    /// Store the group metadata (`.zgroup`) and, if any are set, the user attributes
    /// (`.zattrs`).
    ///
    /// Attribute updates are last-writer-wins; no merging is performed.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let metadata_bytes = metadata::to_document_bytes(&self.metadata)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage
            .set(&meta_key_group(&self.path), &metadata_bytes)?;
        if !self.attributes.is_empty() {
            let attributes_bytes = metadata::to_document_bytes(&self.attributes)
                .map_err(|err| StorageError::Other(err.to_string()))?;
            self.storage
                .set(&meta_key_attributes(&self.path), &attributes_bytes)?;
        }
        Ok(())
    }
}
