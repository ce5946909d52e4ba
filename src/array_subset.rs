//! Array selections.
//!
//! A selection ([`ArraySubset`]) addresses a hyper-rectangular region of an array: one
//! half-open range of element indices per dimension. Selections are the addressing type of
//! the [`Array`](crate::array::Array) store and retrieve methods.
//!
//! [`ArraySubset::chunk_projections`] carries a selection onto a chunk grid. It yields, for
//! every chunk the selection intersects, the grid coordinate of the chunk, the intersected
//! region in intra-chunk coordinates, and the matching region of the selection buffer. The
//! projections tile the selection exactly, so each chunk can be read or written
//! independently, in any order or in parallel.

use std::{num::NonZeroU64, ops::Range};

use thiserror::Error;

/// A hyper-rectangular selection of an array: one half-open range per dimension.
///
/// A range with `end <= start` selects nothing in that dimension, making the whole selection
/// empty. A selection with no ranges is zero dimensional and selects exactly one element.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ArraySubset {
    ranges: Vec<Range<u64>>,
}

/// Selections or shapes of different dimensionality were combined.
#[derive(Copy, Clone, Debug, Error)]
#[error("dimensionality {0} does not match dimensionality {1}")]
pub struct DimensionMismatchError(usize, usize);

impl DimensionMismatchError {
    /// Create a new dimension mismatch error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

impl From<Vec<Range<u64>>> for ArraySubset {
    fn from(ranges: Vec<Range<u64>>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .map(|range| range.start..range.end.max(range.start))
                .collect(),
        }
    }
}

impl ArraySubset {
    /// Create a selection from one half-open range per dimension.
    #[must_use]
    pub fn new(ranges: &[Range<u64>]) -> Self {
        ranges.to_vec().into()
    }

    /// Create a selection of no elements with the given `dimensionality`.
    #[must_use]
    pub fn empty(dimensionality: usize) -> Self {
        Self {
            ranges: vec![0..0; dimensionality],
        }
    }

    /// Create the selection of every element of an array with `shape`.
    #[must_use]
    pub fn whole(shape: &[u64]) -> Self {
        Self {
            ranges: shape.iter().map(|&end| 0..end).collect(),
        }
    }

    /// Create a selection of `shape` elements starting at `offset`.
    ///
    /// # Errors
    /// Returns [`DimensionMismatchError`] if `offset` and `shape` differ in length.
    pub fn from_offset_shape(
        offset: &[u64],
        shape: &[u64],
    ) -> Result<Self, DimensionMismatchError> {
        if offset.len() == shape.len() {
            Ok(Self {
                ranges: std::iter::zip(offset, shape)
                    .map(|(&offset, &extent)| offset..offset + extent)
                    .collect(),
            })
        } else {
            Err(DimensionMismatchError::new(offset.len(), shape.len()))
        }
    }

    /// The per-dimension index ranges of the selection.
    #[must_use]
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    /// The number of dimensions of the selection.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.ranges.len()
    }

    /// The lowest selected index in every dimension.
    #[must_use]
    pub fn start(&self) -> Vec<u64> {
        self.ranges.iter().map(|range| range.start).collect()
    }

    /// The extent of the selection in every dimension.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        self.ranges
            .iter()
            .map(|range| range.end - range.start)
            .collect()
    }

    /// The number of selected elements: the product of the per-dimension extents.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.ranges
            .iter()
            .map(|range| range.end - range.start)
            .product()
    }

    /// The number of selected elements as a `usize`.
    ///
    /// # Panics
    /// Panics if the element count exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if no elements are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.iter().any(|range| range.end == range.start)
    }

    /// Returns true if every selected index lies within an array of `shape`.
    ///
    /// False if the dimensionalities differ.
    #[must_use]
    pub fn is_within(&self, shape: &[u64]) -> bool {
        self.ranges.len() == shape.len()
            && std::iter::zip(&self.ranges, shape).all(|(range, &extent)| range.end <= extent)
    }

    /// The selection of elements common to `self` and `other`.
    ///
    /// Disjoint selections intersect in an empty selection.
    ///
    /// # Errors
    /// Returns [`DimensionMismatchError`] if the dimensionalities differ.
    pub fn intersection(&self, other: &Self) -> Result<Self, DimensionMismatchError> {
        if self.dimensionality() != other.dimensionality() {
            return Err(DimensionMismatchError::new(
                other.dimensionality(),
                self.dimensionality(),
            ));
        }
        Ok(std::iter::zip(&self.ranges, &other.ranges)
            .map(|(a, b)| a.start.max(b.start)..a.end.min(b.end))
            .collect::<Vec<_>>()
            .into())
    }

    /// Iterate the coordinates of the selected elements, last dimension fastest.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Project the selection onto the grid of `chunk_shape` tiles.
    ///
    /// # Errors
    /// Returns [`DimensionMismatchError`] if `chunk_shape` does not match the selection
    /// dimensionality.
    pub fn chunk_projections(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<ChunkProjections, DimensionMismatchError> {
        if chunk_shape.len() != self.dimensionality() {
            return Err(DimensionMismatchError::new(
                chunk_shape.len(),
                self.dimensionality(),
            ));
        }
        // The intersected grid coordinates per dimension: floor(lo / c) up to ceil(hi / c).
        let grid: Vec<Range<u64>> = std::iter::zip(&self.ranges, chunk_shape)
            .map(|(range, chunk)| {
                let chunk = chunk.get();
                let first = range.start / chunk;
                if range.end > range.start {
                    first..range.end.div_ceil(chunk)
                } else {
                    first..first
                }
            })
            .collect();
        let num_chunks = grid.iter().map(|grid| grid.end - grid.start).product();
        Ok(ChunkProjections {
            selection: self.ranges.clone(),
            chunk_shape: chunk_shape.iter().map(|chunk| chunk.get()).collect(),
            grid,
            num_chunks,
        })
    }
}

impl core::fmt::Display for ArraySubset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}..{}", range.start, range.end)?;
        }
        write!(f, "]")
    }
}

/// An iterator over the coordinates of the elements of a selection.
///
/// Coordinates are visited with the last dimension varying fastest. A zero dimensional
/// selection yields a single empty coordinate.
pub struct Indices {
    ranges: Vec<Range<u64>>,
    cursor: Option<Vec<u64>>,
    remaining: u64,
}

impl Indices {
    fn new(subset: ArraySubset) -> Self {
        let remaining = subset.num_elements();
        let cursor = (remaining > 0)
            .then(|| subset.ranges.iter().map(|range| range.start).collect());
        Self {
            ranges: subset.ranges,
            cursor,
            remaining,
        }
    }

    /// The number of coordinates remaining.
    ///
    /// # Panics
    /// Panics if the count exceeds [`usize::MAX`].
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.remaining).unwrap()
    }

    /// Returns true if no coordinates remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}

impl Iterator for Indices {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor.as_ref()?.clone();
        self.remaining -= 1;
        if self.remaining == 0 {
            self.cursor = None;
        } else if let Some(cursor) = self.cursor.as_mut() {
            // Advance like an odometer, wrapping exhausted dimensions back to their start.
            for (position, range) in std::iter::zip(cursor.iter_mut(), &self.ranges).rev() {
                *position += 1;
                if *position < range.end {
                    break;
                }
                *position = range.start;
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl ExactSizeIterator for Indices {}

impl std::iter::FusedIterator for Indices {}

/// One chunk of a selection projected onto a chunk grid.
///
/// The two regions have the same shape: `chunk_region` addresses the intersected elements
/// within the chunk, and `out_region` addresses the same elements within a buffer holding
/// the selection.
#[derive(Clone, Debug)]
pub struct ChunkProjection {
    /// The grid coordinate of the chunk.
    pub chunk_indices: Vec<u64>,
    /// The intersected region, in intra-chunk coordinates.
    pub chunk_region: ArraySubset,
    /// The matching region of the selection buffer, relative to the selection start.
    pub out_region: ArraySubset,
    /// Whether the selection covers every element of the chunk.
    pub full_coverage: bool,
}

/// The projections of a selection onto a chunk grid.
///
/// Projections are indexed in C order of the chunk grid coordinates and can be accessed
/// randomly with [`get`](ChunkProjections::get), so multi-chunk work can be fanned out over a
/// thread pool by index.
pub struct ChunkProjections {
    selection: Vec<Range<u64>>,
    chunk_shape: Vec<u64>,
    grid: Vec<Range<u64>>,
    num_chunks: u64,
}

impl ChunkProjections {
    /// The number of chunks the selection intersects.
    ///
    /// # Panics
    /// Panics if the count exceeds [`usize::MAX`].
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.num_chunks).unwrap()
    }

    /// Returns true if the selection intersects no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_chunks == 0
    }

    /// Return the projection of the `index`-th intersected chunk.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> ChunkProjection {
        assert!((index as u64) < self.num_chunks);
        let mut chunk_indices = vec![0; self.grid.len()];
        let mut index = index as u64;
        for (coordinate, grid) in std::iter::zip(chunk_indices.iter_mut(), &self.grid).rev() {
            let extent = grid.end - grid.start;
            *coordinate = grid.start + index % extent;
            index /= extent;
        }
        self.project(chunk_indices)
    }

    /// Iterate the projections in C order of the chunk grid coordinates.
    pub fn iter(&self) -> impl Iterator<Item = ChunkProjection> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }

    /// Compute the regions of the chunk at `chunk_indices`.
    fn project(&self, chunk_indices: Vec<u64>) -> ChunkProjection {
        let mut chunk_region = Vec::with_capacity(chunk_indices.len());
        let mut out_region = Vec::with_capacity(chunk_indices.len());
        let mut full_coverage = true;
        for (coordinate, (range, &chunk)) in std::iter::zip(
            &chunk_indices,
            std::iter::zip(&self.selection, &self.chunk_shape),
        ) {
            let chunk_start = coordinate * chunk;
            let chunk_end = chunk_start + chunk;
            let lo = range.start.max(chunk_start);
            let hi = range.end.min(chunk_end);
            chunk_region.push(lo - chunk_start..hi - chunk_start);
            out_region.push(lo - range.start..hi - range.start);
            full_coverage &= lo == chunk_start && hi == chunk_end;
        }
        ChunkProjection {
            chunk_indices,
            chunk_region: chunk_region.into(),
            out_region: out_region.into(),
            full_coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonzero(shape: &[u64]) -> Vec<NonZeroU64> {
        shape.iter().map(|&c| NonZeroU64::new(c).unwrap()).collect()
    }

    #[test]
    fn selection_basics() {
        let selection = ArraySubset::new(&[1..5, 2..6]);
        assert_eq!(selection.dimensionality(), 2);
        assert_eq!(selection.start(), vec![1, 2]);
        assert_eq!(selection.shape(), vec![4, 4]);
        assert_eq!(selection.num_elements(), 16);
        assert!(!selection.is_empty());
        assert!(selection.is_within(&[5, 6]));
        assert!(!selection.is_within(&[5, 5]));
        assert!(!selection.is_within(&[5, 6, 7]));
        assert_eq!(selection.to_string(), "[1..5, 2..6]");

        // A backwards range normalises to empty.
        let backwards = ArraySubset::new(&[5..1]);
        assert!(backwards.is_empty());
        assert_eq!(backwards.num_elements(), 0);

        assert_eq!(ArraySubset::whole(&[3, 4]), ArraySubset::new(&[0..3, 0..4]));
        assert!(ArraySubset::empty(2).is_empty());
        assert_eq!(
            ArraySubset::from_offset_shape(&[1, 2], &[3, 4]).unwrap(),
            ArraySubset::new(&[1..4, 2..6])
        );
        assert!(ArraySubset::from_offset_shape(&[1], &[3, 4]).is_err());
    }

    #[test]
    fn selection_zero_dimensional() {
        let scalar = ArraySubset::new(&[]);
        assert_eq!(scalar.dimensionality(), 0);
        assert!(!scalar.is_empty());
        assert_eq!(scalar.num_elements(), 1);
        assert_eq!(scalar.indices().collect::<Vec<_>>(), vec![Vec::<u64>::new()]);
    }

    #[test]
    fn selection_intersection() {
        let a = ArraySubset::new(&[1..5, 2..6]);
        let b = ArraySubset::new(&[3..6, 4..7]);
        assert_eq!(
            a.intersection(&b).unwrap(),
            ArraySubset::new(&[3..5, 4..6])
        );
        // Disjoint selections intersect empty rather than underflowing.
        let far = ArraySubset::new(&[8..9, 0..1]);
        assert!(a.intersection(&far).unwrap().is_empty());
        assert!(a.intersection(&ArraySubset::new(&[0..1])).is_err());
    }

    #[test]
    fn indices_order() {
        let selection = ArraySubset::new(&[2..4, 1..3]);
        let indices: Vec<_> = selection.indices().collect();
        assert_eq!(
            indices,
            vec![vec![2, 1], vec![2, 2], vec![3, 1], vec![3, 2]]
        );
        assert_eq!(selection.indices().len(), 4);
        assert!(ArraySubset::empty(2).indices().next().is_none());
    }

    #[test]
    fn projections_aligned_grid() {
        let selection = ArraySubset::new(&[0..4, 0..3]);
        let projections = selection.chunk_projections(&nonzero(&[2, 2])).unwrap();
        assert_eq!(projections.len(), 4);

        let collected: Vec<_> = projections.iter().collect();
        assert_eq!(collected[0].chunk_indices, vec![0, 0]);
        assert_eq!(collected[0].chunk_region, ArraySubset::new(&[0..2, 0..2]));
        assert_eq!(collected[0].out_region, ArraySubset::new(&[0..2, 0..2]));
        assert!(collected[0].full_coverage);

        // The selection ends one short of the second column of chunks.
        assert_eq!(collected[1].chunk_indices, vec![0, 1]);
        assert_eq!(collected[1].chunk_region, ArraySubset::new(&[0..2, 0..1]));
        assert_eq!(collected[1].out_region, ArraySubset::new(&[0..2, 2..3]));
        assert!(!collected[1].full_coverage);

        assert_eq!(collected[3].chunk_indices, vec![1, 1]);
    }

    #[test]
    fn projections_offset_selection() {
        let selection = ArraySubset::new(&[3..5]);
        let projections = selection.chunk_projections(&nonzero(&[2])).unwrap();
        assert_eq!(projections.len(), 2);
        let first = projections.get(0);
        assert_eq!(first.chunk_indices, vec![1]);
        assert_eq!(first.chunk_region, ArraySubset::new(&[1..2]));
        assert_eq!(first.out_region, ArraySubset::new(&[0..1]));
        assert!(!first.full_coverage);
        let second = projections.get(1);
        assert_eq!(second.chunk_indices, vec![2]);
        assert_eq!(second.chunk_region, ArraySubset::new(&[0..1]));
        assert_eq!(second.out_region, ArraySubset::new(&[1..2]));
    }

    #[test]
    fn projections_empty_and_scalar() {
        // An empty selection intersects no chunks.
        let empty = ArraySubset::new(&[4..4]);
        assert!(empty.chunk_projections(&nonzero(&[2])).unwrap().is_empty());

        // A zero dimensional selection projects to the single chunk of a scalar array.
        let scalar = ArraySubset::new(&[]);
        let projections = scalar.chunk_projections(&[]).unwrap();
        assert_eq!(projections.len(), 1);
        let only = projections.get(0);
        assert!(only.chunk_indices.is_empty());
        assert!(only.full_coverage);

        assert!(scalar.chunk_projections(&nonzero(&[2])).is_err());
    }

    #[test]
    fn projections_tile_the_selection() {
        // The chunk regions partition the selection: they sum to the selection element count
        // and the out regions tile the selection buffer without overlap.
        let selection = ArraySubset::new(&[1..7, 2..5]);
        let projections = selection.chunk_projections(&nonzero(&[3, 2])).unwrap();
        let width = selection.shape()[1];
        let mut covered = vec![false; selection.num_elements_usize()];
        let mut total = 0;
        for projection in projections.iter() {
            assert_eq!(
                projection.chunk_region.num_elements(),
                projection.out_region.num_elements()
            );
            total += projection.chunk_region.num_elements();
            for coordinate in projection.out_region.indices() {
                let linear = usize::try_from(coordinate[0] * width + coordinate[1]).unwrap();
                assert!(!covered[linear], "out regions overlap");
                covered[linear] = true;
            }
        }
        assert_eq!(total, selection.num_elements());
        assert!(covered.iter().all(|&covered| covered), "out regions do not tile");
    }
}
