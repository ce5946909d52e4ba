use std::num::NonZeroU64;

use derive_more::{Display, From};

use super::{ArrayShape, NonZeroError};

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Clone, Eq, PartialEq, Debug, Display, From)]
#[display("{_0:?}")]
pub struct ChunkShape(Vec<NonZeroU64>);

impl ChunkShape {
    /// Return the chunk shape as a slice of [`NonZeroU64`].
    #[must_use]
    pub fn as_slice(&self) -> &[NonZeroU64] {
        &self.0
    }

    /// Convert the chunk shape to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        self.0.iter().map(|i| i.get()).collect()
    }

    /// Return the number of dimensions of the chunk shape.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }

    /// Return the number of elements of a chunk.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(|i| i.get()).product()
    }

    /// Return the number of elements of a chunk as a `usize`.
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }
}

impl std::ops::Deref for ChunkShape {
    type Target = Vec<NonZeroU64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(value: &[u64]) -> Result<Self, Self::Error> {
        value
            .iter()
            .map(|&i| NonZeroU64::new(i).ok_or(NonZeroError))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<Vec<u64>> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        value.as_slice().try_into()
    }
}
