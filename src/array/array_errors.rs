use thiserror::Error;

use crate::{array_subset::ArraySubset, node::NodePathError, storage::StorageError};

use super::{
    codec::CodecError,
    data_type::UnsupportedDataTypeError,
    fill_value::{IncompatibleFillValueError, IncompatibleFillValueMetadataError},
    ArrayIndices, ArrayShape,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataTypeError(#[from] UnsupportedDataTypeError),
    /// Invalid fill value metadata.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// Invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// Error creating the compressor.
    #[error(transparent)]
    InvalidCompressor(#[from] CodecError),
    /// The dimensionality of the chunk shape does not match the array shape.
    #[error("chunk shape dimensionality {0} does not match array dimensionality {1}")]
    InvalidChunkShapeDimensionality(usize, usize),
    /// The chunk shape has a zero extent.
    #[error("chunk shape {0:?} must have strictly positive extents")]
    InvalidChunkShape(Vec<u64>),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices: {_0:?}")]
    InvalidChunkGridIndicesError(Vec<u64>),
    /// Incompatible array subset.
    #[error("array subset {_0} is not compatible with array shape {_1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// Incompatible chunk subset.
    #[error("chunk subset {_0} is not compatible with chunk {_1:?} with shape {_2:?}")]
    InvalidChunkSubset(ArraySubset, ArrayIndices, ArrayShape),
    /// An unexpected chunk decoded size.
    #[error("got chunk decoded size {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, usize),
    /// An unexpected bytes input size.
    #[error("got bytes with size {_0}, expected {_1}")]
    InvalidBytesInputSize(usize, u64),
    /// Incompatible element size.
    #[error("the element type does not match the data type size")]
    IncompatibleElementType,
}
