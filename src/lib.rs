//! Index-space map/reduce engine for dense numeric kernels.
//!
//! This crate provides a backend-agnostic compute primitive for N-dimensional
//! iteration domains: apply a function at every point of a domain ([`map`]),
//! or fold a per-point value into a single scalar with an associative
//! operator ([`reduce`]), optionally in parallel. Reductions nest inside map
//! callbacks, which is how windowed kernels (stencil, convolution) and inner
//! products (matrix multiplication) are expressed; see [`kernels`].
//!
//! # Core Types
//!
//! - [`Domain`] / [`Axis`]: an N-dimensional axis-aligned iteration space,
//!   one `(offset, extent)` pair per axis
//! - [`Schedule`]: execution policy, serial or parallel-striped
//! - [`Combine`] and the [`ops`] module: associative reduction operators
//!   (`ops::Add`, `ops::GreaterThan`, or a user closure via `ops::from_fn`)
//! - [`Grid`] / [`GridMut`]: the indexing contract array backends expose to
//!   kernel code; the engine itself never owns or allocates storage
//!
//! # Example
//!
//! ```rust
//! use mapreduce_rs::{map, reduce, ops, Domain, DynGrid, Grid, SharedWriter};
//!
//! // Fill a 3x3 grid with 1..=9 in row-major order.
//! let mut a: DynGrid<i64, 2> = DynGrid::filled([3, 3], 0);
//! let out = SharedWriter::new(&mut a);
//! map(|[i, j]| unsafe { out.set([i, j], (3 * i + j + 1) as i64) }, Domain::of([3, 3])).unwrap();
//!
//! let sum = reduce(|[i, j]| *a.get([i, j]), ops::Add, Domain::of([3, 3])).unwrap();
//! assert_eq!(sum, 45);
//! ```
//!
//! # Scheduling
//!
//! Under [`Schedule::Serial`] points are visited in row-major order (axis 0
//! outermost). Under a parallel schedule the outermost axis is split into
//! contiguous stripes distributed over the rayon pool; every point is still
//! visited exactly once, but with no ordering guarantee across stripes.
//! Integer reductions with the built-in operators are bit-identical across
//! schedules. Floating-point sums may differ in the last bits because
//! parallel execution reassociates the fold.

mod domain;
mod grid;
pub mod kernels;
mod map;
pub mod ops;
mod reduce;
mod schedule;

pub use domain::{Axis, Domain};
pub use grid::{DynGrid, Grid, GridMut, SharedWriter};
pub use map::{map, map_with, try_map, try_map_with};
pub use ops::Combine;
pub use reduce::{reduce, reduce_max, reduce_sum, reduce_with, try_reduce, try_reduce_with};
pub use schedule::Schedule;

/// Minimum number of domain points to justify multi-threaded execution.
///
/// Parallel schedules fall back to sequential iteration below this
/// threshold; thread coordination overhead otherwise dominates.
pub const MIN_PARALLEL_POINTS: usize = 1 << 15;

/// Errors reported by map/reduce calls.
///
/// The engine never retries and never returns partial results: a call either
/// completes in full or surfaces the first observed failure after in-flight
/// partitions have drained. Arity mismatches between a callback and its
/// domain are a compile error (the point arity is a const generic), so they
/// have no runtime variant here.
#[derive(Debug, thiserror::Error)]
pub enum MapReduceError {
    /// Reduce was called on an empty domain with an operator that has no
    /// identity element, so there is no value to return.
    #[error("reduce over an empty domain with an operator that has no identity")]
    EmptyDomainNoIdentity,

    /// A per-point callback or combine function failed; wraps the first
    /// failure observed across all partitions.
    #[error("callback failed")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Grid extents passed to a kernel do not agree.
    #[error("extent mismatch on axis {axis}: {left} vs {right}")]
    ExtentMismatch {
        axis: usize,
        left: usize,
        right: usize,
    },
}

impl MapReduceError {
    /// Wrap an arbitrary error as a callback failure.
    pub fn callback<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MapReduceError::Callback(Box::new(err))
    }
}

/// Result type for map/reduce operations.
pub type Result<T> = std::result::Result<T, MapReduceError>;
