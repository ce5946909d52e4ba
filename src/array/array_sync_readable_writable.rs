use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    array_subset::{ArraySubset, ChunkProjection},
    storage::ReadableWritableStorageTraits,
};

use super::{
    array_bytes::{extract_bytes, update_bytes},
    Array, ArrayError,
};

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Store `subset_bytes` at the `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// The subset is in intra-chunk coordinates. A partially covered chunk is read, modified,
    /// and rewritten; if absent, the remainder of the chunk is initialised with the fill value.
    /// A chunk covered in full skips the read.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is not within the chunk,
    ///  - the length of `subset_bytes` does not match the subset element count and data type
    ///    size,
    ///  - there is a codec error, or
    ///  - an underlying store error.
    pub fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        let element_size = self.data_type().item_size();
        let expected_size = chunk_subset.num_elements() * element_size as u64;
        if subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                subset_bytes.len(),
                expected_size,
            ));
        }

        let chunk_shape = self.chunk_shape().to_array_shape();
        if *chunk_subset == ArraySubset::whole(&chunk_shape) {
            // Full coverage, no read required.
            self.store_chunk(chunk_indices, subset_bytes)
        } else {
            let mut chunk_bytes = self.retrieve_chunk(chunk_indices)?;
            update_bytes(
                &mut chunk_bytes,
                &chunk_shape,
                chunk_subset,
                &subset_bytes,
                element_size,
                self.order(),
            );
            self.store_chunk(chunk_indices, chunk_bytes)
        }
    }

    /// Store `subset_elements` at the `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_chunk_subset`](Array::store_chunk_subset) error condition is met.
    pub fn store_chunk_subset_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        if core::mem::size_of::<T>() != self.data_type().item_size() {
            return Err(ArrayError::IncompatibleElementType);
        }
        self.store_chunk_subset(
            chunk_indices,
            chunk_subset,
            bytemuck::cast_slice(subset_elements).to_vec(),
        )
    }

    /// Store `subset_bytes` at the `array_subset` of the array.
    ///
    /// `subset_bytes` holds the subset elements in the order of the array. Chunks fully
    /// covered by the subset are encoded directly from the source; partially covered chunks
    /// are read, modified, and rewritten. Writes of multiple chunks are parallelised over a
    /// rayon thread pool; each chunk is one store operation and the selection as a whole is
    /// not atomic.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `array_subset` exceeds the array shape,
    ///  - the length of `subset_bytes` does not match the subset element count and data type
    ///    size,
    ///  - there is a codec error, or
    ///  - an underlying store error.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.validate_array_subset(array_subset)?;
        let element_size = self.data_type().item_size();
        let expected_size = array_subset.num_elements() * element_size as u64;
        if subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                subset_bytes.len(),
                expected_size,
            ));
        }
        if array_subset.is_empty() {
            return Ok(());
        }

        let subset_shape = array_subset.shape();
        let write_projection = |projection: ChunkProjection| {
            let chunk_bytes = extract_bytes(
                &subset_bytes,
                &subset_shape,
                &projection.out_region,
                element_size,
                self.order(),
            );
            if projection.full_coverage {
                self.store_chunk(&projection.chunk_indices, chunk_bytes)
            } else {
                self.store_chunk_subset(
                    &projection.chunk_indices,
                    &projection.chunk_region,
                    chunk_bytes,
                )
            }
        };

        let projections = self.chunk_projections(array_subset)?;
        if projections.len() <= 1 {
            for projection in projections.iter() {
                write_projection(projection)?;
            }
            Ok(())
        } else {
            (0..projections.len())
                .into_par_iter()
                .try_for_each(|index| write_projection(projections.get(index)))
        }
    }

    /// Store `subset_elements` at the `array_subset` of the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_array_subset`](Array::store_array_subset) error condition is met.
    pub fn store_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        if core::mem::size_of::<T>() != self.data_type().item_size() {
            return Err(ArrayError::IncompatibleElementType);
        }
        self.store_array_subset(
            array_subset,
            bytemuck::cast_slice(subset_elements).to_vec(),
        )
    }
}
