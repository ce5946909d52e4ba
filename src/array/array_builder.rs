use std::sync::Arc;

use crate::metadata::{
    ArrayMetadata, ArrayOrder, DataTypeMetadata, FillValueMetadata,
};

use super::{Array, ArrayCreateError, ArrayShape};

/// An [`Array`] builder.
///
/// The builder is initialised with the shape, chunk shape, data type, and fill value of the
/// array. Use the builder methods to set the compression, order, and user attributes, then
/// [`build`](ArrayBuilder::build) to create an [`Array`].
///
/// [`build`](ArrayBuilder::build) does not write to the store; write the array metadata
/// explicitly with [`Array::store_metadata`], or create the array with its implicit ancestor
/// groups via [`create_array`](crate::hierarchy::create_array).
///
/// For example:
/// ```rust
/// # use std::sync::Arc;
/// # use zarr2::array::{ArrayBuilder, FillValueMetadata};
/// # use zarr2::storage::store::MemoryStore;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let mut builder = ArrayBuilder::new(
///     vec![8, 8],
///     vec![4, 4],
///     "<f4",
///     FillValueMetadata::Number(serde_json::Number::from(0)),
/// );
/// builder.compression("zlib", serde_json::json!({"level": 1}));
/// let array = builder.build(store, "/group/array")?;
/// array.store_metadata()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    chunks: Vec<u64>,
    dtype: DataTypeMetadata,
    compression: Option<String>,
    compression_opts: serde_json::Value,
    fill_value: FillValueMetadata,
    order: ArrayOrder,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl ArrayBuilder {
    /// Create a new array builder for an array with `shape`, `chunks`, `dtype`, and
    /// `fill_value`.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunks: Vec<u64>,
        dtype: impl Into<DataTypeMetadata>,
        fill_value: FillValueMetadata,
    ) -> Self {
        Self {
            shape,
            chunks,
            dtype: dtype.into(),
            compression: None,
            compression_opts: serde_json::Value::Null,
            fill_value,
            order: ArrayOrder::C,
            attributes: serde_json::Map::default(),
        }
    }

    /// Set the compression codec name and configuration.
    pub fn compression(
        &mut self,
        compression: impl Into<String>,
        compression_opts: serde_json::Value,
    ) -> &mut Self {
        self.compression = Some(compression.into());
        self.compression_opts = compression_opts;
        self
    }

    /// Set the element order within chunks.
    pub fn order(&mut self, order: ArrayOrder) -> &mut Self {
        self.order = order;
        self
    }

    /// Set the user attributes.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Build the array metadata.
    #[must_use]
    pub fn build_metadata(&self) -> ArrayMetadata {
        ArrayMetadata::new(self.shape.clone(), self.chunks.clone(), self.dtype.clone())
            .with_compression(self.compression.clone(), self.compression_opts.clone())
            .with_fill_value(self.fill_value.clone())
            .with_order(self.order)
    }

    /// Build an [`Array`] in `storage` at `path`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the array parameters are invalid.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let mut array = Array::new_with_metadata(storage, path, self.build_metadata())?;
        if !self.attributes.is_empty() {
            *array.attributes_mut() = self.attributes.clone();
        }
        Ok(array)
    }
}
