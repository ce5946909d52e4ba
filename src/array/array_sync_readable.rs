use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    array_subset::{ArraySubset, ChunkProjection},
    metadata::ArrayMetadata,
    storage::{meta_key_array, meta_key_attributes, ReadableStorageTraits, StorageError},
};

use super::{
    array_bytes::{extract_bytes, fill_bytes, update_bytes},
    Array, ArrayCreateError, ArrayError, UnsafeCellSlice,
};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array in `storage` at `path`. The metadata is read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error or any metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = crate::node::NodePath::new(path)?;
        let key = meta_key_array(&node_path);
        let metadata_bytes = storage.get(&key)?.ok_or(ArrayCreateError::MissingMetadata)?;
        let metadata: ArrayMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;
        let mut array = Self::new_with_metadata(storage, path, metadata)?;

        let attributes_key = meta_key_attributes(&node_path);
        if let Some(attributes) = array.storage.get(&attributes_key)? {
            *array.attributes_mut() = serde_json::from_slice(&attributes)
                .map_err(|err| StorageError::InvalidMetadata(attributes_key, err.to_string()))?;
        }
        Ok(array)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        if !self.chunk_grid_contains(chunk_indices) {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ));
        }
        let Some(chunk_encoded) = self.storage.get(&self.chunk_key(chunk_indices))? else {
            return Ok(None);
        };
        let chunk_size = self.chunk_size();
        let chunk_decoded = match self.compressor() {
            Some(compressor) => compressor.decode(chunk_encoded, chunk_size)?,
            None => chunk_encoded,
        };
        if chunk_decoded.len() == chunk_size {
            Ok(Some(chunk_decoded))
        } else {
            Err(ArrayError::UnexpectedChunkDecodedSize(
                chunk_decoded.len(),
                chunk_size,
            ))
        }
    }

    /// Read and decode the chunk at `chunk_indices`, or synthesise it from the fill value if it
    /// does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        Ok(self
            .retrieve_chunk_if_exists(chunk_indices)?
            .unwrap_or_else(|| self.fill_chunk_bytes()))
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements, or the fill
    /// value if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`retrieve_chunk`](Array::retrieve_chunk) error condition is met.
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        if core::mem::size_of::<T>() != self.data_type().item_size() {
            return Err(ArrayError::IncompatibleElementType);
        }
        let bytes = self.retrieve_chunk(chunk_indices)?;
        Ok(bytemuck::allocation::pod_collect_to_vec(&bytes))
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// The subset is in intra-chunk coordinates.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is not within the chunk,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<u8>, ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        let element_size = self.data_type().item_size();
        match self.retrieve_chunk_if_exists(chunk_indices)? {
            Some(chunk_bytes) => Ok(extract_bytes(
                &chunk_bytes,
                &self.chunk_shape().to_array_shape(),
                chunk_subset,
                element_size,
                self.order(),
            )),
            None => {
                let element = self.fill_element_bytes();
                Ok(element.repeat(chunk_subset.num_elements_usize()))
            }
        }
    }

    /// Read and decode the `array_subset` of the array.
    ///
    /// The returned buffer holds the subset elements in the order of the array. Chunks missing
    /// from the store are synthesised from the fill value. Reads of multiple chunks are
    /// parallelised over a rayon thread pool.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `array_subset` exceeds the array shape,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset(&self, array_subset: &ArraySubset) -> Result<Vec<u8>, ArrayError> {
        self.validate_array_subset(array_subset)?;
        let element_size = self.data_type().item_size();
        let subset_shape = array_subset.shape();
        let mut output = vec![0; array_subset.num_elements_usize() * element_size];
        if array_subset.is_empty() {
            return Ok(output);
        }

        let projections = self.chunk_projections(array_subset)?;
        if projections.len() <= 1 {
            for projection in projections.iter() {
                self.read_projection(&projection, &subset_shape, &mut output)?;
            }
        } else {
            let output_slice = UnsafeCellSlice::new(&mut output);
            (0..projections.len()).into_par_iter().try_for_each(|index| {
                let projection = projections.get(index);
                // Projection output regions are disjoint.
                let output = unsafe { output_slice.get() };
                self.read_projection(&projection, &subset_shape, output)
            })?;
        }
        Ok(output)
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`retrieve_array_subset`](Array::retrieve_array_subset) error condition is met.
    pub fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        if core::mem::size_of::<T>() != self.data_type().item_size() {
            return Err(ArrayError::IncompatibleElementType);
        }
        let bytes = self.retrieve_array_subset(array_subset)?;
        Ok(bytemuck::allocation::pod_collect_to_vec(&bytes))
    }

    /// Decode one chunk projection of a selection into the `output` buffer of the selection.
    ///
    /// The projection regions never extend beyond the selection, so the overhang of a chunk
    /// at the high edge of the array is never surfaced.
    fn read_projection(
        &self,
        projection: &ChunkProjection,
        subset_shape: &[u64],
        output: &mut [u8],
    ) -> Result<(), ArrayError> {
        let element_size = self.data_type().item_size();
        if let Some(chunk_bytes) = self.retrieve_chunk_if_exists(&projection.chunk_indices)? {
            let subset_bytes = extract_bytes(
                &chunk_bytes,
                &self.chunk_shape().to_array_shape(),
                &projection.chunk_region,
                element_size,
                self.order(),
            );
            update_bytes(
                output,
                subset_shape,
                &projection.out_region,
                &subset_bytes,
                element_size,
                self.order(),
            );
        } else {
            fill_bytes(
                output,
                subset_shape,
                &projection.out_region,
                &self.fill_element_bytes(),
                self.order(),
            );
        }
        Ok(())
    }
}
