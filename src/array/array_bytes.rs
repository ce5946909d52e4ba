//! Byte-level subset copies between buffers holding the elements of hyper-rectangular regions.
//!
//! These routines are the byte engine of the array store and retrieve methods. They operate
//! on contiguous buffers of fixed size elements laid out in either row-major (C) or
//! column-major (F) order, copying maximal contiguous element runs. Column-major layouts are
//! handled by reversing the dimensions and delegating to the row-major routines.

use std::ops::Range;

use crate::{array_subset::ArraySubset, metadata::ArrayOrder};

fn reversed_shape(shape: &[u64]) -> Vec<u64> {
    shape.iter().rev().copied().collect()
}

fn reversed_subset(subset: &ArraySubset) -> ArraySubset {
    subset
        .ranges()
        .iter()
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .into()
}

/// An iterator over the maximal contiguous element runs of a subset laid out in row-major
/// order on an array of a given shape.
///
/// Yields the linear element offset of each run start; every run has
/// [`run_elements`](ElementRuns::run_elements) elements. A run spans the trailing dimensions
/// that the subset covers in full, together with the extent of the first partial dimension.
struct ElementRuns {
    run_elements: u64,
    remaining: u64,
    offset: u64,
    // An odometer over the dimensions outside the run.
    cursor: Vec<u64>,
    outer: Vec<Range<u64>>,
    strides: Vec<u64>,
}

impl ElementRuns {
    fn new(subset: &ArraySubset, array_shape: &[u64]) -> Self {
        debug_assert!(subset.is_within(array_shape));
        let ranges = subset.ranges();

        // Dimensions [0, split) step between runs; the rest merge into one run.
        let mut run_elements = 1;
        let mut split = ranges.len();
        for (range, &extent) in std::iter::zip(ranges, array_shape).rev() {
            run_elements *= range.end - range.start;
            split -= 1;
            if range.start != 0 || range.end != extent {
                break;
            }
        }

        // Row-major element strides and the linear offset of the first selected element.
        let mut offset = 0;
        let mut strides = vec![0; ranges.len()];
        let mut stride = 1;
        for (range, (&extent, dimension_stride)) in std::iter::zip(
            ranges,
            std::iter::zip(array_shape, strides.iter_mut()),
        )
        .rev()
        {
            *dimension_stride = stride;
            offset += range.start * stride;
            stride *= extent;
        }
        strides.truncate(split);

        let outer = ranges[..split].to_vec();
        let remaining = if run_elements == 0 {
            0
        } else {
            outer.iter().map(|range| range.end - range.start).product()
        };
        Self {
            run_elements,
            remaining,
            offset,
            cursor: outer.iter().map(|range| range.start).collect(),
            outer,
            strides,
        }
    }

    fn run_elements(&self) -> u64 {
        self.run_elements
    }
}

impl Iterator for ElementRuns {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let offset = self.offset;
        for ((position, range), stride) in
            std::iter::zip(std::iter::zip(self.cursor.iter_mut(), &self.outer), &self.strides)
                .rev()
        {
            *position += 1;
            self.offset += stride;
            if *position < range.end {
                break;
            }
            self.offset -= stride * (range.end - range.start);
            *position = range.start;
        }
        Some(offset)
    }
}

/// Extract the bytes of the `subset` of an array with `array_shape` from `bytes`.
///
/// The subset bytes are returned in the same `order` as the input buffer.
///
/// The subset must lie within `array_shape` and the length of `bytes` must match the array
/// size in bytes.
#[must_use]
pub(crate) fn extract_bytes(
    bytes: &[u8],
    array_shape: &[u64],
    subset: &ArraySubset,
    element_size: usize,
    order: ArrayOrder,
) -> Vec<u8> {
    match order {
        ArrayOrder::C => extract_bytes_c(bytes, array_shape, subset, element_size),
        ArrayOrder::F => extract_bytes_c(
            bytes,
            &reversed_shape(array_shape),
            &reversed_subset(subset),
            element_size,
        ),
    }
}

fn extract_bytes_c(
    bytes: &[u8],
    array_shape: &[u64],
    subset: &ArraySubset,
    element_size: usize,
) -> Vec<u8> {
    debug_assert_eq!(
        bytes.len(),
        usize::try_from(array_shape.iter().product::<u64>()).unwrap() * element_size
    );
    let mut subset_bytes = vec![0; subset.num_elements_usize() * element_size];
    let runs = ElementRuns::new(subset, array_shape);
    let length = usize::try_from(runs.run_elements()).unwrap() * element_size;
    let mut out = 0;
    for run_start in runs {
        let src = usize::try_from(run_start).unwrap() * element_size;
        subset_bytes[out..out + length].copy_from_slice(&bytes[src..src + length]);
        out += length;
    }
    subset_bytes
}

/// Write `subset_bytes` into the `subset` of an array with `output_shape` in `output_bytes`.
///
/// `subset_bytes` holds the subset elements in the same `order` as the output buffer.
///
/// The subset must lie within `output_shape`, and the byte lengths of `output_bytes` and
/// `subset_bytes` must match the array and subset sizes respectively.
pub(crate) fn update_bytes(
    output_bytes: &mut [u8],
    output_shape: &[u64],
    subset: &ArraySubset,
    subset_bytes: &[u8],
    element_size: usize,
    order: ArrayOrder,
) {
    match order {
        ArrayOrder::C => {
            update_bytes_c(output_bytes, output_shape, subset, subset_bytes, element_size);
        }
        ArrayOrder::F => update_bytes_c(
            output_bytes,
            &reversed_shape(output_shape),
            &reversed_subset(subset),
            subset_bytes,
            element_size,
        ),
    }
}

fn update_bytes_c(
    output_bytes: &mut [u8],
    output_shape: &[u64],
    subset: &ArraySubset,
    subset_bytes: &[u8],
    element_size: usize,
) {
    debug_assert_eq!(
        output_bytes.len(),
        usize::try_from(output_shape.iter().product::<u64>()).unwrap() * element_size
    );
    debug_assert_eq!(
        subset_bytes.len(),
        subset.num_elements_usize() * element_size
    );
    let runs = ElementRuns::new(subset, output_shape);
    let length = usize::try_from(runs.run_elements()).unwrap() * element_size;
    let mut taken = 0;
    for run_start in runs {
        let dst = usize::try_from(run_start).unwrap() * element_size;
        output_bytes[dst..dst + length].copy_from_slice(&subset_bytes[taken..taken + length]);
        taken += length;
    }
}

/// Fill the `subset` of an array with `output_shape` in `output_bytes` with repetitions of
/// `element_bytes`.
///
/// The subset must lie within `output_shape`.
pub(crate) fn fill_bytes(
    output_bytes: &mut [u8],
    output_shape: &[u64],
    subset: &ArraySubset,
    element_bytes: &[u8],
    order: ArrayOrder,
) {
    match order {
        ArrayOrder::C => fill_bytes_c(output_bytes, output_shape, subset, element_bytes),
        ArrayOrder::F => fill_bytes_c(
            output_bytes,
            &reversed_shape(output_shape),
            &reversed_subset(subset),
            element_bytes,
        ),
    }
}

fn fill_bytes_c(
    output_bytes: &mut [u8],
    output_shape: &[u64],
    subset: &ArraySubset,
    element_bytes: &[u8],
) {
    let element_size = element_bytes.len();
    debug_assert_eq!(
        output_bytes.len(),
        usize::try_from(output_shape.iter().product::<u64>()).unwrap() * element_size
    );
    let runs = ElementRuns::new(subset, output_shape);
    let run_elements = usize::try_from(runs.run_elements()).unwrap();
    for run_start in runs {
        let mut dst = usize::try_from(run_start).unwrap() * element_size;
        for _ in 0..run_elements {
            output_bytes[dst..dst + element_size].copy_from_slice(element_bytes);
            dst += element_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_runs_merge_trailing_dimensions() {
        // Full rows merge into a single run per row block.
        let subset = ArraySubset::new(&[1..3, 0..4]);
        let runs = ElementRuns::new(&subset, &[4, 4]);
        assert_eq!(runs.run_elements(), 8);
        assert_eq!(runs.collect::<Vec<_>>(), vec![4]);

        // Partial rows run separately.
        let subset = ArraySubset::new(&[1..3, 1..3]);
        let runs = ElementRuns::new(&subset, &[4, 4]);
        assert_eq!(runs.run_elements(), 2);
        assert_eq!(runs.collect::<Vec<_>>(), vec![5, 9]);

        // A fully covering subset is one run.
        let subset = ArraySubset::new(&[0..4, 0..4]);
        let runs = ElementRuns::new(&subset, &[4, 4]);
        assert_eq!(runs.run_elements(), 16);
        assert_eq!(runs.collect::<Vec<_>>(), vec![0]);

        // An empty subset has no runs.
        let subset = ArraySubset::new(&[1..1, 0..4]);
        assert_eq!(ElementRuns::new(&subset, &[4, 4]).count(), 0);

        // A zero dimensional subset is a single one-element run.
        let runs = ElementRuns::new(&ArraySubset::new(&[]), &[]);
        assert_eq!(runs.run_elements(), 1);
        assert_eq!(runs.collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn element_runs_three_dimensional() {
        let subset = ArraySubset::new(&[1..3, 1..2, 0..2]);
        let runs = ElementRuns::new(&subset, &[3, 2, 2]);
        assert_eq!(runs.run_elements(), 2);
        // Offsets of (1,1,0) and (2,1,0).
        assert_eq!(runs.collect::<Vec<_>>(), vec![6, 10]);
    }

    #[test]
    fn extract_bytes_c_order() {
        // 3x3 array of u8: 0..9
        let bytes: Vec<u8> = (0..9).collect();
        let subset = ArraySubset::new(&[1..3, 0..2]);
        let extracted = extract_bytes(&bytes, &[3, 3], &subset, 1, ArrayOrder::C);
        assert_eq!(extracted, vec![3, 4, 6, 7]);
    }

    #[test]
    fn extract_bytes_f_order() {
        // The same logical 3x3 array in column-major layout.
        // Logical element (i, j) lives at offset j * 3 + i.
        let mut bytes = vec![0u8; 9];
        for i in 0..3u8 {
            for j in 0..3u8 {
                bytes[usize::from(j * 3 + i)] = i * 3 + j;
            }
        }
        let subset = ArraySubset::new(&[1..3, 0..2]);
        let extracted = extract_bytes(&bytes, &[3, 3], &subset, 1, ArrayOrder::F);
        // Column-major over the subset: (1,0), (2,0), (1,1), (2,1)
        assert_eq!(extracted, vec![3, 6, 4, 7]);
    }

    #[test]
    fn update_bytes_round_trip() {
        for order in [ArrayOrder::C, ArrayOrder::F] {
            let src: Vec<u8> = (0..9).collect();
            let subset = ArraySubset::new(&[0..2, 1..3]);
            let extracted = extract_bytes(&src, &[3, 3], &subset, 1, order);
            let mut dst = vec![0u8; 9];
            update_bytes(&mut dst, &[3, 3], &subset, &extracted, 1, order);
            let extracted_dst = extract_bytes(&dst, &[3, 3], &subset, 1, order);
            assert_eq!(extracted, extracted_dst);
        }
    }

    #[test]
    fn update_bytes_multibyte() {
        let mut output = vec![0u8; 4 * 2];
        let subset = ArraySubset::new(&[1..3]);
        update_bytes(&mut output, &[4], &subset, &[1, 2, 3, 4], 2, ArrayOrder::C);
        assert_eq!(output, vec![0, 0, 1, 2, 3, 4, 0, 0]);
    }

    #[test]
    fn fill_bytes_subset() {
        let mut output = vec![0u8; 9];
        let subset = ArraySubset::new(&[1..3, 1..3]);
        fill_bytes(&mut output, &[3, 3], &subset, &[7], ArrayOrder::C);
        assert_eq!(output, vec![0, 0, 0, 0, 7, 7, 0, 7, 7]);
    }

    #[test]
    fn fill_bytes_multibyte() {
        let mut output = vec![0u8; 3 * 2];
        let subset = ArraySubset::new(&[2..3]);
        fill_bytes(&mut output, &[3], &subset, &[9, 8], ArrayOrder::C);
        assert_eq!(output, vec![0, 0, 0, 0, 9, 8]);
    }
}
