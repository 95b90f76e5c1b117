//! Cache-conscious matrix transpose kernels.
//!
//! Every routine in this crate computes `B = Aᵀ` for signed 32-bit integer
//! matrices in row-major layout. What distinguishes the routines is not what
//! they compute but the *order* in which they touch memory: the kernels are
//! tuned so that, on a direct-mapped cache of [`CACHE_BYTES`] capacity with
//! [`LINE_BYTES`] lines, the transpose incurs close to the minimum possible
//! number of misses for its shape.
//!
//! The crate ships three size-specialized kernels (32×32, 32×64, and a
//! general routine tuned at 64×64), a naive baseline, a shape dispatcher
//! that selects among them, and a small direct-mapped cache simulator used
//! to measure miss counts in tests and benchmarks.
//!
//! ```
//! use cachetile::{Grid, GridMut, Kernel};
//!
//! let a: Vec<i32> = (0..32 * 32).collect();
//! let mut b = vec![0i32; 32 * 32];
//!
//! let src = Grid::from_slice(32, 32, &a).unwrap();
//! let mut dst = GridMut::from_slice(32, 32, &mut b).unwrap();
//! Kernel::Submission.run(&src, &mut dst);
//!
//! assert_eq!(b[32], a[1]);
//! ```

pub mod cache;
pub mod error;
pub mod grid;
pub mod registry;
pub mod transpose;

pub use error::{CachetileError, Result};
pub use grid::{Grid, GridMut, MatrixRead, MatrixWrite};
pub use registry::Kernel;

/// Total capacity of the target cache in bytes.
pub const CACHE_BYTES: usize = 1024;

/// Size of one cache line in bytes.
pub const LINE_BYTES: usize = 32;

/// Number of `i32` elements covered by one cache line.
pub const LANE: usize = LINE_BYTES / std::mem::size_of::<i32>();

/// Number of lines the cache holds. Direct-mapped: one way per set.
pub const SETS: usize = CACHE_BYTES / LINE_BYTES;
