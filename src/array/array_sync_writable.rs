use crate::{
    metadata,
    storage::{StorageError, WritableStorageTraits},
};

use super::{Array, ArrayError};

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Store the array metadata (`.zarray`) and user attributes (`.zattrs`).
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let metadata_bytes = metadata::to_document_bytes(self.metadata())
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&self.meta_key(), &metadata_bytes)?;
        let attributes_bytes = metadata::to_document_bytes(self.attributes())
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&self.attributes_key(), &attributes_bytes)
    }

    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// A chunk that is entirely the fill value is erased from the store instead of being
    /// written, leaving the store as if the chunk had never been written.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` is not equal to the expected length (the product of the
    ///    number of elements in the chunk and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        if !self.chunk_grid_contains(chunk_indices) {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ));
        }
        let chunk_size = self.chunk_size();
        if chunk_bytes.len() != chunk_size {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_bytes.len(),
                chunk_size as u64,
            ));
        }

        let all_fill_value = self
            .fill_value()
            .is_some_and(|fill_value| fill_value.equals_all(&chunk_bytes));
        if all_fill_value {
            self.erase_chunk(chunk_indices)?;
            Ok(())
        } else {
            let chunk_encoded = match self.compressor() {
                Some(compressor) => compressor.encode(chunk_bytes)?,
                None => chunk_bytes,
            };
            self.storage
                .set(&self.chunk_key(chunk_indices), &chunk_encoded)
                .map_err(ArrayError::StorageError)
        }
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_chunk`](Array::store_chunk) error condition is met.
    pub fn store_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        if core::mem::size_of::<T>() != self.data_type().item_size() {
            return Err(ArrayError::IncompatibleElementType);
        }
        self.store_chunk(chunk_indices, bytemuck::cast_slice(chunk_elements).to_vec())
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), StorageError> {
        self.storage.erase(&self.chunk_key(chunk_indices))?;
        Ok(())
    }

    /// Erase all chunks of the array.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn erase_chunks(&self) -> Result<(), StorageError> {
        let grid = crate::array_subset::ArraySubset::whole(&self.chunk_grid_shape());
        for chunk_indices in grid.indices() {
            self.storage.erase(&self.chunk_key(&chunk_indices))?;
        }
        Ok(())
    }
}
