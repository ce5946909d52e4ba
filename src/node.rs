//! Zarr hierarchy node paths.
//!
//! Arrays and groups are identified by a logical path within a store.
//! [`NodePath`] canonicalises raw paths and rejects traversal, producing the store key prefix
//! under which a node's metadata and data live.

mod node_path;

pub use node_path::{NodePath, NodePathError};
