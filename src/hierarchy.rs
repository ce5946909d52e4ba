//! Zarr hierarchy operations.
//!
//! A hierarchy is a path-shaped tree of groups and arrays over a store. A group exists at a
//! path iff a `.zgroup` document exists under its key prefix; an array iff a `.zarray`
//! document exists. Group membership is not stored anywhere; it is derived by scanning for
//! immediate child metadata keys.
//!
//! [`create_group`] and [`create_array`] write a node together with `.zgroup` documents at
//! every missing ancestor, so creating a node at a deep path on an empty store produces a
//! fully linked tree. Arrays are leaves: an existing `.zarray` at an ancestor path blocks
//! creation below it.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    array::{Array, ArrayCreateError, ArrayMetadata},
    group::{Group, GroupCreateError},
    metadata::{self, GroupMetadata},
    node::{NodePath, NodePathError},
    storage::{
        meta_key_array, meta_key_attributes, meta_key_group, ListableStorageTraits,
        ReadableStorageTraits, ReadableWritableListableStorageTraits,
        ReadableWritableStorageTraits, StorageError, WritableStorageTraits,
    },
};

/// The type of a hierarchy node.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum NodeType {
    /// An array node.
    Array,
    /// A group node.
    Group,
}

/// A hierarchy error.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A node already exists at the path.
    #[error("a node already exists at {0}")]
    NodeExists(NodePath),
    /// An ancestor of the path is an array.
    #[error("ancestor {0} is an array, arrays cannot contain other nodes")]
    AncestorIsArray(NodePath),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An array creation error.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// A group creation error.
    #[error(transparent)]
    GroupCreateError(#[from] GroupCreateError),
}

/// Returns true if a group or array node exists at `path`.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying store error.
pub fn node_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<bool, StorageError> {
    Ok(storage.contains(&meta_key_group(path))? || storage.contains(&meta_key_array(path))?)
}

/// Return the type of the node at `path`, if one exists.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying store error.
pub fn node_type<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Option<NodeType>, StorageError> {
    if storage.contains(&meta_key_array(path))? {
        Ok(Some(NodeType::Array))
    } else if storage.contains(&meta_key_group(path))? {
        Ok(Some(NodeType::Group))
    } else {
        Ok(None)
    }
}

/// Write `.zgroup` documents at every proper ancestor of `path` (and at the root) where no
/// node exists yet.
///
/// # Errors
/// Returns [`HierarchyError::AncestorIsArray`] if an ancestor holds a `.zarray` document, or a
/// [`StorageError`] on an underlying store error.
fn create_ancestor_groups<TStorage: ?Sized + ReadableWritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<(), HierarchyError> {
    let group_bytes = metadata::to_document_bytes(&GroupMetadata::default())
        .map_err(|err| StorageError::Other(err.to_string()))?;
    // Root first, so a failure partway leaves a tree that is still linked from the top.
    for ancestor in path.ancestors().into_iter().rev() {
        if storage.contains(&meta_key_array(&ancestor))? {
            return Err(HierarchyError::AncestorIsArray(ancestor));
        }
        if !storage.contains(&meta_key_group(&ancestor))? {
            storage.set(&meta_key_group(&ancestor), &group_bytes)?;
        }
    }
    Ok(())
}

/// Create a group at `path`, writing `.zgroup` documents at the path and at every missing
/// ancestor.
///
/// Creating a group where one already exists succeeds without rewriting it.
///
/// # Errors
/// Returns a [`HierarchyError`] if:
///  - `path` is invalid,
///  - `path` holds an array ([`HierarchyError::NodeExists`]),
///  - an ancestor holds an array ([`HierarchyError::AncestorIsArray`]), or
///  - there is an underlying store error.
pub fn create_group<TStorage: ?Sized + ReadableWritableStorageTraits>(
    storage: &Arc<TStorage>,
    path: &str,
) -> Result<Group<TStorage>, HierarchyError> {
    let node_path = NodePath::new(path)?;
    if storage.contains(&meta_key_array(&node_path))? {
        return Err(HierarchyError::NodeExists(node_path));
    }
    create_ancestor_groups(storage.as_ref(), &node_path)?;
    let group = Group::new(storage.clone(), path)?;
    group.store_metadata()?;
    Ok(group)
}

/// Create an array at `path` with `metadata`, writing `.zgroup` documents at every missing
/// ancestor, then the `.zarray` document and an empty `.zattrs` document.
///
/// With `overwrite`, an existing node at `path` is erased first: every key under the path
/// prefix and the node's metadata keys. The erase and create sequence is not atomic; a
/// concurrent reader may observe intermediate states.
///
/// # Errors
/// Returns a [`HierarchyError`] if:
///  - `path` is invalid or the metadata is invalid,
///  - a node exists at `path` and `overwrite` is false ([`HierarchyError::NodeExists`]),
///  - an ancestor holds an array ([`HierarchyError::AncestorIsArray`]), or
///  - there is an underlying store error.
pub fn create_array<TStorage: ?Sized + ReadableWritableListableStorageTraits>(
    storage: &Arc<TStorage>,
    path: &str,
    metadata: ArrayMetadata,
    overwrite: bool,
) -> Result<Array<TStorage>, HierarchyError> {
    let node_path = NodePath::new(path)?;
    if node_exists(storage.as_ref(), &node_path)? {
        if overwrite {
            erase_node(storage.as_ref(), &node_path)?;
        } else {
            return Err(HierarchyError::NodeExists(node_path));
        }
    }
    create_ancestor_groups(storage.as_ref(), &node_path)?;
    let array = Array::new_with_metadata(storage.clone(), path, metadata)?;
    array.store_metadata()?;
    Ok(array)
}

/// Erase the node at `path`: every key under its prefix and its metadata keys.
///
/// Succeeds if no node exists at `path`.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying store error.
pub fn erase_node<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<(), StorageError> {
    storage.erase_prefix(&path.prefix())?;
    storage.erase(&meta_key_array(path))?;
    storage.erase(&meta_key_group(path))?;
    storage.erase(&meta_key_attributes(path))?;
    Ok(())
}

/// List the child nodes of the group at `path`.
///
/// Scans the keys under the path prefix for direct children holding a `.zgroup` or `.zarray`
/// document. Children are returned sorted by name, deduplicated.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying store error.
pub fn child_nodes<TStorage: ?Sized + ListableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Vec<(NodePath, NodeType)>, StorageError> {
    let prefix = path.prefix();
    let mut children: std::collections::BTreeMap<String, NodeType> =
        std::collections::BTreeMap::new();
    for key in storage.list_prefix(&prefix)? {
        let suffix = &key.as_str()[prefix.as_str().len()..];
        let mut components = suffix.split('/');
        let (Some(child), Some(metadata_name), None) =
            (components.next(), components.next(), components.next())
        else {
            continue;
        };
        let node_type = match metadata_name {
            ".zarray" => NodeType::Array,
            ".zgroup" => NodeType::Group,
            _ => continue,
        };
        // A node with both documents is reported as an array.
        children
            .entry(child.to_string())
            .and_modify(|existing| {
                if node_type == NodeType::Array {
                    *existing = NodeType::Array;
                }
            })
            .or_insert(node_type);
    }
    children
        .into_iter()
        .map(|(name, node_type)| {
            let child_path = if path.is_root() {
                NodePath::new(&name)
            } else {
                NodePath::new(&format!("{}/{name}", path.as_str()))
            };
            child_path
                .map(|child_path| (child_path, node_type))
                .map_err(StorageError::NodePathError)
        })
        .collect()
}

/// List all nodes in the hierarchy, sorted by path.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying store error.
pub fn all_nodes<TStorage: ?Sized + ListableStorageTraits>(
    storage: &TStorage,
) -> Result<Vec<(NodePath, NodeType)>, StorageError> {
    let mut nodes: std::collections::BTreeMap<NodePath, NodeType> =
        std::collections::BTreeMap::new();
    for key in storage.list()? {
        let (parent, metadata_name) = match key.as_str().rsplit_once('/') {
            Some((parent, metadata_name)) => (parent, metadata_name),
            None => ("", key.as_str()),
        };
        let node_type = match metadata_name {
            ".zarray" => NodeType::Array,
            ".zgroup" => NodeType::Group,
            _ => continue,
        };
        let path = NodePath::new(parent).map_err(StorageError::NodePathError)?;
        nodes
            .entry(path)
            .and_modify(|existing| {
                if node_type == NodeType::Array {
                    *existing = NodeType::Array;
                }
            })
            .or_insert(node_type);
    }
    Ok(nodes.into_iter().collect())
}
