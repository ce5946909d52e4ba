//! A rust library for the [Zarr V2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html) storage format for multidimensional arrays and metadata.
//!
//! A Zarr V2 hierarchy of chunked N-dimensional arrays and groups lives in a
//! [store](crate::storage): an abstract key/value substrate with ASCII keys and opaque byte
//! values, such as a filesystem directory, an in-memory map, or an object store. This crate
//! implements the core of the format over that interface:
//!  - the chunk grid and indexing algebra mapping hyper-rectangular
//!    [selections](crate::array_subset) to the chunks they intersect,
//!  - the chunk codec pipeline ([compressors](crate::array::codec), fill value synthesis, and
//!    row/column major chunk layouts), and
//!  - the metadata documents and [hierarchy](crate::hierarchy) semantics (`.zarray`,
//!    `.zgroup`, `.zattrs`, implicit ancestor groups, membership listing).
//!
//! The best docs to start with are [`array::Array`] and [`hierarchy`].
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use zarr2::array::{ArrayBuilder, FillValueMetadata};
//! use zarr2::array_subset::ArraySubset;
//! use zarr2::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let mut builder = ArrayBuilder::new(
//!     vec![20, 20],
//!     vec![10, 10],
//!     "<i4",
//!     FillValueMetadata::Number(serde_json::Number::from(42)),
//! );
//! builder.compression("zlib", serde_json::json!(1));
//! let array = builder.build(store, "/array")?;
//! array.store_metadata()?;
//!
//! array.store_array_subset_elements::<i32>(
//!     &ArraySubset::new(&[0..10, 0..10]),
//!     &[1; 100],
//! )?;
//! let elements = array
//!     .retrieve_array_subset_elements::<i32>(&ArraySubset::new(&[0..20, 0..20]))?;
//! assert_eq!(elements[0], 1);
//! assert_eq!(elements[399], 42);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//! The crate performs no implicit background work. Operations spanning multiple chunks fan
//! out over a rayon thread pool; every chunk is read or written with a single store call, and
//! multi-chunk operations are not atomic. Writers updating overlapping selections from
//! multiple processes are not coordinated: partial-chunk read-modify-writes may overwrite one
//! another. See [`array::Array`] for details.
//!
//! ## Licence
//! zarr2 is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod group;
pub mod hierarchy;
pub mod metadata;
pub mod node;
pub mod storage;
pub mod version;

/// Re-export [`serde_json`].
pub use serde_json;

/// Re-export [`bytemuck`].
pub use bytemuck;

/// Re-export [`rayon`].
pub use rayon;
