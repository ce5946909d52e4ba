//! Zarr arrays.
//!
//! An array is a node in a Zarr hierarchy used to hold chunked multidimensional array data and
//! associated metadata. A Zarr V2 array is defined by the following parameters (which are
//! encoded in its `.zarray` JSON metadata):
//!  - **shape**: defines the length of the array dimensions,
//!  - **chunks**: defines how the array is subdivided into chunks,
//!  - **dtype**: defines the binary representation of array elements,
//!  - **compression** and **compression_opts**: the codec used to encode and decode chunks,
//!  - **fill value**: an element value to use for uninitialised portions of the array, and
//!  - **order**: the layout (row or column major) of elements within each chunk.
//!
//! The easiest way to create a *new* array is with an [`ArrayBuilder`]. An *existing* array can
//! be opened with [`Array::open`], which reads its metadata from the store.
//!
//! ## Chunks
//! The chunk at grid coordinate `(i₀, i₁, …)` is stored under the key formed by joining the
//! decimal coordinates with `.` (e.g. `2.4`) below the array's key prefix; a zero dimensional
//! array has a single chunk under key `0`. Chunks at the high edge of the array are stored
//! full-sized; elements beyond the array shape are never surfaced by reads. An absent chunk
//! reads as the fill value.
//!
//! ## Array data
//! Array operations are divided into several categories based on the traits implemented for
//! the backing [storage](crate::storage):
//!  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits):
//!    [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists),
//!    [`retrieve_chunk`](Array::retrieve_chunk),
//!    [`retrieve_chunk_subset`](Array::retrieve_chunk_subset),
//!    [`retrieve_array_subset`](Array::retrieve_array_subset).
//!  - [`WritableStorageTraits`](crate::storage::WritableStorageTraits):
//!    [`store_metadata`](Array::store_metadata), [`store_chunk`](Array::store_chunk),
//!    [`erase_chunk`](Array::erase_chunk).
//!  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits):
//!    [`store_chunk_subset`](Array::store_chunk_subset),
//!    [`store_array_subset`](Array::store_array_subset).
//!
//! The `retrieve` and `store` methods have `_elements` variants which store or retrieve
//! elements with a known type.
//!
//! Methods operating on multiple chunks fan out over a rayon thread pool. Chunks are
//! independent: each chunk write is a single store operation and there is no cross-chunk
//! atomicity. The partial-chunk store methods internally retrieve, update, and store chunks;
//! it is the responsibility of the caller to ensure that the same chunk is not updated
//! concurrently from multiple writers, or partial updates may be lost.

mod array_builder;
mod array_bytes;
mod array_errors;
mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;
mod chunk_shape;
pub mod codec;
pub mod data_type;
mod endianness;
mod fill_value;
mod unsafe_cell_slice;

use std::sync::Arc;

use itertools::Itertools;

pub use self::{
    array_builder::ArrayBuilder,
    array_errors::{ArrayCreateError, ArrayError},
    chunk_shape::ChunkShape,
    data_type::DataType,
    endianness::{Endianness, NATIVE_ENDIAN},
    fill_value::{
        fill_value_from_metadata, fill_value_to_metadata, FillValue, IncompatibleFillValueError,
        IncompatibleFillValueMetadataError,
    },
    unsafe_cell_slice::UnsafeCellSlice,
};
pub use crate::metadata::{ArrayMetadata, ArrayOrder, DataTypeMetadata, FillValueMetadata};

use self::codec::CompressorTraits;
use crate::{
    array_subset::{ArraySubset, ChunkProjections},
    node::NodePath,
    storage::{data_key, meta_key_array, meta_key_attributes, StoreKey},
};
use thiserror::Error;

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A non zero error.
///
/// Used when a zero extent cannot be converted to its non-zero equivalent (e.g. a chunk shape
/// from metadata).
#[derive(Debug, Error)]
#[error("value must be non-zero")]
pub struct NonZeroError;

/// Format the store key suffix of the chunk at `chunk_grid_indices`.
///
/// The decimal grid indices joined by `.` with no padding; a zero dimensional array uses the
/// key `0`. This is a bijection between grid coordinates and keys.
#[must_use]
pub fn chunk_key(chunk_grid_indices: &[u64]) -> String {
    if chunk_grid_indices.is_empty() {
        "0".to_string()
    } else {
        chunk_grid_indices.iter().join(".")
    }
}

/// A Zarr V2 array.
///
/// See the [module documentation](crate::array) for usage.
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in the store.
    path: NodePath,
    /// The length of each dimension of the array.
    shape: ArrayShape,
    /// The shape of a chunk.
    chunk_shape: ChunkShape,
    /// The data type of the array.
    data_type: DataType,
    /// The binary fill value, if defined.
    fill_value: Option<FillValue>,
    /// The layout of elements within a chunk.
    order: ArrayOrder,
    /// The compressor, if any.
    compressor: Option<Arc<dyn CompressorTraits>>,
    /// User defined attributes, stored in the sibling `.zattrs` document.
    attributes: serde_json::Map<String, serde_json::Value>,
    /// The underlying metadata.
    metadata: ArrayMetadata,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    ///
    /// This does **not** write to the store, use [`store_metadata`](Array::store_metadata) to
    /// write `metadata` to `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - the path is invalid,
    ///  - the data type or fill value is unsupported or incompatible,
    ///  - the compressor is unknown or its configuration is invalid, or
    ///  - the shape and chunk shape are incongruent.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        if metadata.shape.len() != metadata.chunks.len() {
            return Err(ArrayCreateError::InvalidChunkShapeDimensionality(
                metadata.chunks.len(),
                metadata.shape.len(),
            ));
        }
        let chunk_shape: ChunkShape = metadata
            .chunks
            .as_slice()
            .try_into()
            .map_err(|_| ArrayCreateError::InvalidChunkShape(metadata.chunks.clone()))?;
        let data_type = DataType::from_metadata(&metadata.dtype)?;
        let fill_value = fill_value_from_metadata(&data_type, &metadata.fill_value)?;
        let compressor = metadata
            .compression
            .as_deref()
            .map(|name| codec::create_compressor(name, &metadata.compression_opts))
            .transpose()?;
        Ok(Self {
            storage,
            path,
            shape: metadata.shape.clone(),
            chunk_shape,
            data_type,
            fill_value,
            order: metadata.order,
            compressor,
            attributes: serde_json::Map::default(),
            metadata,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Get the chunk shape.
    #[must_use]
    pub const fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the fill value, or [`None`] if it is undefined.
    #[must_use]
    pub const fn fill_value(&self) -> Option<&FillValue> {
        self.fill_value.as_ref()
    }

    /// Get the element order within chunks.
    #[must_use]
    pub const fn order(&self) -> ArrayOrder {
        self.order
    }

    /// Get the compressor, or [`None`] if chunks are stored uncompressed.
    #[must_use]
    pub fn compressor(&self) -> Option<&Arc<dyn CompressorTraits>> {
        self.compressor.as_ref()
    }

    /// Get the underlying metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Get the user attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Mutably borrow the user attributes.
    ///
    /// Attribute changes must be persisted with [`store_metadata`](Array::store_metadata).
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.attributes
    }

    /// Get the shape of the chunk grid: `ceil(shape / chunks)` per dimension.
    ///
    /// A dimension of length zero has a grid extent of zero. A zero dimensional array has an
    /// empty grid shape and exactly one chunk.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, self.chunk_shape.as_slice())
            .map(|(&shape, chunk)| shape.div_ceil(chunk.get()))
            .collect()
    }

    /// Returns true if `chunk_indices` are within the chunk grid.
    #[must_use]
    pub fn chunk_grid_contains(&self, chunk_indices: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && std::iter::zip(chunk_indices, self.chunk_grid_shape())
                .all(|(&index, extent)| index < extent)
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(&self.path, chunk_indices)
    }

    /// Return the store key of the array metadata.
    #[must_use]
    pub fn meta_key(&self) -> StoreKey {
        meta_key_array(&self.path)
    }

    /// Return the store key of the array attributes.
    #[must_use]
    pub fn attributes_key(&self) -> StoreKey {
        meta_key_attributes(&self.path)
    }

    /// Return the subset of the array spanned by the chunk at `chunk_indices`.
    ///
    /// The subset of a chunk at the high edge of the array may extend beyond the array shape;
    /// take its [`intersection`](ArraySubset::intersection) with the
    /// [`whole`](ArraySubset::whole) array selection if needed.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices` are outside the
    /// chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        if !self.chunk_grid_contains(chunk_indices) {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ));
        }
        let ranges: Vec<std::ops::Range<u64>> =
            std::iter::zip(chunk_indices, self.chunk_shape.as_slice())
                .map(|(&index, chunk)| {
                    let origin = index * chunk.get();
                    origin..origin + chunk.get()
                })
                .collect();
        Ok(ranges.into())
    }

    /// Return the projections of `array_subset` onto the chunk grid: the chunks it
    /// intersects, with the per-chunk and selection buffer regions.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidArraySubset`] if the dimensionality of `array_subset` does
    /// not match the array.
    pub fn chunk_projections(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ChunkProjections, ArrayError> {
        array_subset
            .chunk_projections(self.chunk_shape.as_slice())
            .map_err(|_| {
                ArrayError::InvalidArraySubset(array_subset.clone(), self.shape.clone())
            })
    }

    /// Return the number of elements of a chunk.
    #[must_use]
    pub fn chunk_num_elements(&self) -> u64 {
        self.chunk_shape.num_elements()
    }

    /// Return the size in bytes of a raw (uncompressed) chunk.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_shape.num_elements_usize() * self.data_type.item_size()
    }

    /// Return the binary encoding of one fill value element.
    ///
    /// An undefined fill value materialises as zeroes, which is deterministic but carries no
    /// contract for consumers.
    #[must_use]
    pub(crate) fn fill_element_bytes(&self) -> Vec<u8> {
        self.fill_value.as_ref().map_or_else(
            || vec![0; self.data_type.item_size()],
            |fill_value| fill_value.as_bytes().to_vec(),
        )
    }

    /// Return a raw chunk buffer tiled with the fill value.
    #[must_use]
    pub(crate) fn fill_chunk_bytes(&self) -> Vec<u8> {
        let element = self.fill_element_bytes();
        element.repeat(self.chunk_shape.num_elements_usize())
    }

    /// Validate that `array_subset` is within the array bounds.
    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.is_within(&self.shape) {
            Ok(())
        } else {
            Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape.clone(),
            ))
        }
    }

    /// Validate that `chunk_subset` is within the chunk bounds.
    fn validate_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<(), ArrayError> {
        if chunk_subset.is_within(&self.chunk_shape.to_array_shape()) {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                self.chunk_shape.to_array_shape(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    #[test]
    fn chunk_key_encoding() {
        assert_eq!(chunk_key(&[]), "0");
        assert_eq!(chunk_key(&[0]), "0");
        assert_eq!(chunk_key(&[7]), "7");
        assert_eq!(chunk_key(&[0, 0]), "0.0");
        assert_eq!(chunk_key(&[2, 4]), "2.4");
        assert_eq!(chunk_key(&[10, 0, 3]), "10.0.3");
    }

    #[test]
    fn chunk_key_bijective() {
        // Distinct grid coordinates produce distinct keys.
        let mut keys = std::collections::HashSet::new();
        for i in 0..4 {
            for j in 0..4 {
                assert!(keys.insert(chunk_key(&[i, j])));
            }
        }
    }

    #[test]
    fn array_invariants() {
        let store = Arc::new(MemoryStore::new());
        let metadata = ArrayMetadata::new(vec![20, 21], vec![10, 10], "<i4".into());
        let array = Array::new_with_metadata(store, "/a", metadata).unwrap();
        assert_eq!(array.chunk_grid_shape(), vec![2, 3]);
        assert_eq!(array.chunk_size(), 400);
        assert!(array.chunk_grid_contains(&[1, 2]));
        assert!(!array.chunk_grid_contains(&[2, 0]));
        assert!(!array.chunk_grid_contains(&[0]));
        assert_eq!(
            array.chunk_subset(&[1, 2]).unwrap(),
            ArraySubset::new(&[10..20, 20..30])
        );
        assert_eq!(array.chunk_key(&[1, 2]).as_str(), "a/1.2");
    }

    #[test]
    fn array_create_invalid() {
        let store = Arc::new(MemoryStore::new());
        // Chunk dimensionality mismatch.
        let metadata = ArrayMetadata::new(vec![20, 20], vec![10], "<i4".into());
        assert!(Array::new_with_metadata(store.clone(), "/a", metadata).is_err());
        // Zero chunk extent.
        let metadata = ArrayMetadata::new(vec![20], vec![0], "<i4".into());
        assert!(Array::new_with_metadata(store.clone(), "/a", metadata).is_err());
        // Unknown compressor.
        let metadata = ArrayMetadata::new(vec![20], vec![10], "<i4".into())
            .with_compression(Some("blosc".to_string()), serde_json::Value::Null);
        assert!(Array::new_with_metadata(store.clone(), "/a", metadata).is_err());
        // Bad dtype.
        let metadata = ArrayMetadata::new(vec![20], vec![10], "i4".into());
        assert!(Array::new_with_metadata(store.clone(), "/a", metadata).is_err());
        // Fill value shape mismatch.
        let metadata = ArrayMetadata::new(vec![20], vec![10], "<i4".into())
            .with_fill_value(FillValueMetadata::String("x".to_string()));
        assert!(Array::new_with_metadata(store, "/a", metadata).is_err());
    }

    #[test]
    fn array_zero_dimensional() {
        let store = Arc::new(MemoryStore::new());
        let metadata = ArrayMetadata::new(vec![], vec![], "<f8".into());
        let array = Array::new_with_metadata(store, "/", metadata).unwrap();
        assert_eq!(array.dimensionality(), 0);
        assert_eq!(array.chunk_grid_shape(), Vec::<u64>::new());
        assert!(array.chunk_grid_contains(&[]));
        assert_eq!(array.chunk_key(&[]).as_str(), "0");
        assert_eq!(array.chunk_num_elements(), 1);
    }

    #[test]
    fn array_zero_sized_dimension() {
        let store = Arc::new(MemoryStore::new());
        let metadata = ArrayMetadata::new(vec![0, 5], vec![2, 2], "<u1".into());
        let array = Array::new_with_metadata(store, "/a", metadata).unwrap();
        assert_eq!(array.chunk_grid_shape(), vec![0, 3]);
        assert!(!array.chunk_grid_contains(&[0, 0]));
    }
}
