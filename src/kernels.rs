//! The three benchmarked kernels, composed from map/reduce calls.
//!
//! Each kernel exists once, parameterized by an execution [`Strategy`]:
//! `PureLoop` is the hand-rolled serial reference, `Map` runs one flat map
//! over the output domain with an explicit inner loop, and `MapReduce` is
//! the fused map-of-reduce form (an inner [`reduce`] per output point). All
//! strategies compute the same function; the conformance tests compare them
//! against `PureLoop`.
//!
//! These are clients of the engine, not part of it: they own no storage and
//! talk to their arrays only through the [`Grid`]/[`GridMut`] contract.

use crate::domain::{Axis, Domain};
use crate::grid::{Grid, GridMut, SharedWriter};
use crate::map::{map_with, try_map_with};
use crate::ops;
use crate::reduce::reduce;
use crate::schedule::Schedule;
use crate::{MapReduceError, Result};
use num_traits::Zero;
use std::ops::Mul;

/// How a kernel drives its computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Explicit serial nested loops; the correctness reference.
    PureLoop,
    /// One map over the output domain, inner accumulation as a plain loop.
    Map,
    /// Map over the output domain with a nested reduce per point.
    MapReduce,
}

fn ensure_extent(axis: usize, left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(MapReduceError::ExtentMismatch { axis, left, right })
    }
}

/// Fill a 2D grid by evaluating `value_of` at every index.
///
/// The initialization map every benchmark driver runs before timing
/// (`a[i][j] = M*i + j + 1` in the classic setup).
pub fn fill<G, T, V>(grid: &mut G, value_of: V, schedule: Schedule) -> Result<()>
where
    G: GridMut<2, Elem = T> + Send + Sync,
    V: Fn([isize; 2]) -> T + Sync,
    T: Send,
{
    let domain = Domain::of([grid.extent(0), grid.extent(1)]);
    let out = SharedWriter::new(grid);
    map_with(
        // Safety: each point writes only its own cell.
        |p| unsafe { out.set(p, value_of(p)) },
        domain,
        schedule,
    )
}

/// Dense matrix multiplication: `c[i][j] = Σ_k a[i][k] * b[k][j]`.
pub fn matmul<GC, GA, GB, T>(
    c: &mut GC,
    a: &GA,
    b: &GB,
    strategy: Strategy,
    schedule: Schedule,
) -> Result<()>
where
    GC: GridMut<2, Elem = T> + Send + Sync,
    GA: Grid<2, Elem = T> + Sync,
    GB: Grid<2, Elem = T> + Sync,
    T: Copy + Zero + Mul<Output = T> + Send + Sync,
{
    let n = c.extent(0);
    let m = c.extent(1);
    let k = a.extent(1);
    ensure_extent(0, a.extent(0), n)?;
    ensure_extent(0, b.extent(0), k)?;
    ensure_extent(1, b.extent(1), m)?;

    let output = Domain::of([n, m]);
    let contraction = Domain::of([k]);

    match strategy {
        Strategy::PureLoop => {
            for i in 0..n as isize {
                for j in 0..m as isize {
                    let mut acc = T::zero();
                    for l in 0..k as isize {
                        acc = acc + *a.get([i, l]) * *b.get([l, j]);
                    }
                    *c.get_mut([i, j]) = acc;
                }
            }
            Ok(())
        }
        Strategy::Map => {
            let out = SharedWriter::new(c);
            map_with(
                |[i, j]| {
                    let mut acc = T::zero();
                    for l in 0..k as isize {
                        acc = acc + *a.get([i, l]) * *b.get([l, j]);
                    }
                    // Safety: each point writes only its own cell.
                    unsafe { out.set([i, j], acc) };
                },
                output,
                schedule,
            )
        }
        Strategy::MapReduce => {
            let out = SharedWriter::new(c);
            try_map_with(
                |[i, j]| {
                    let dot = reduce(|[l]| *a.get([i, l]) * *b.get([l, j]), ops::Add, contraction)?;
                    // Safety: each point writes only its own cell.
                    unsafe { out.set([i, j], dot) };
                    Ok(())
                },
                output,
                schedule,
            )
        }
    }
}

/// 2D convolution over the interior domain (an `order`-wide halo on every
/// side is skipped): `out[i][j] = Σ_{k1,k2} coeffs[k1][k2] *
/// input[i-order+k1][j-order+k2]` with a `(2·order+1)²` coefficient window.
///
/// Halo cells of `out` are left untouched. An input too small to contain
/// any interior point is a no-op.
pub fn convolution<GO, GI, GK, T>(
    out: &mut GO,
    input: &GI,
    coeffs: &GK,
    order: usize,
    strategy: Strategy,
    schedule: Schedule,
) -> Result<()>
where
    GO: GridMut<2, Elem = T> + Send + Sync,
    GI: Grid<2, Elem = T> + Sync,
    GK: Grid<2, Elem = T> + Sync,
    T: Copy + Zero + Mul<Output = T> + Send + Sync,
{
    let n = input.extent(0);
    let m = input.extent(1);
    ensure_extent(0, out.extent(0), n)?;
    ensure_extent(1, out.extent(1), m)?;
    let w = 2 * order + 1;
    ensure_extent(0, coeffs.extent(0), w)?;
    ensure_extent(1, coeffs.extent(1), w)?;

    let h = order as isize;
    let interior = Domain::new([
        Axis::span(h, n as isize - h),
        Axis::span(h, m as isize - h),
    ]);
    let window = Domain::of([w, w]);

    match strategy {
        Strategy::PureLoop => {
            for i in h..n as isize - h {
                for j in h..m as isize - h {
                    let mut acc = T::zero();
                    for k1 in 0..w as isize {
                        for k2 in 0..w as isize {
                            acc = acc
                                + *coeffs.get([k1, k2]) * *input.get([i - h + k1, j - h + k2]);
                        }
                    }
                    *out.get_mut([i, j]) = acc;
                }
            }
            Ok(())
        }
        Strategy::Map => {
            let writer = SharedWriter::new(out);
            map_with(
                |[i, j]| {
                    let mut acc = T::zero();
                    for k1 in 0..w as isize {
                        for k2 in 0..w as isize {
                            acc = acc
                                + *coeffs.get([k1, k2]) * *input.get([i - h + k1, j - h + k2]);
                        }
                    }
                    // Safety: each point writes only its own cell.
                    unsafe { writer.set([i, j], acc) };
                },
                interior,
                schedule,
            )
        }
        Strategy::MapReduce => {
            let writer = SharedWriter::new(out);
            try_map_with(
                |[i, j]| {
                    let acc = reduce(
                        |[k1, k2]| *coeffs.get([k1, k2]) * *input.get([i - h + k1, j - h + k2]),
                        ops::Add,
                        window,
                    )?;
                    // Safety: each point writes only its own cell.
                    unsafe { writer.set([i, j], acc) };
                    Ok(())
                },
                interior,
                schedule,
            )
        }
    }
}

/// Axis-aligned stencil over the interior domain: the center value plus the
/// `2·order` neighbors at distances `1..=order` in each cardinal direction:
/// `out[i][j] = input[i][j] + Σ_{k=1..order} (input[i±k][j] + input[i][j±k])`.
pub fn stencil<GO, GI, T>(
    out: &mut GO,
    input: &GI,
    order: usize,
    strategy: Strategy,
    schedule: Schedule,
) -> Result<()>
where
    GO: GridMut<2, Elem = T> + Send + Sync,
    GI: Grid<2, Elem = T> + Sync,
    T: Copy + Zero + Send + Sync,
{
    let n = input.extent(0);
    let m = input.extent(1);
    ensure_extent(0, out.extent(0), n)?;
    ensure_extent(1, out.extent(1), m)?;

    let h = order as isize;
    let interior = Domain::new([
        Axis::span(h, n as isize - h),
        Axis::span(h, m as isize - h),
    ]);
    // Neighbor distances 1..=order.
    let ring = Domain::new([Axis::span(1, h + 1)]);

    let cross = |i: isize, j: isize, k: isize| {
        *input.get([i - k, j])
            + *input.get([i + k, j])
            + *input.get([i, j - k])
            + *input.get([i, j + k])
    };

    match strategy {
        Strategy::PureLoop => {
            for i in h..n as isize - h {
                for j in h..m as isize - h {
                    let mut acc = *input.get([i, j]);
                    for k in 1..=h {
                        acc = acc + cross(i, j, k);
                    }
                    *out.get_mut([i, j]) = acc;
                }
            }
            Ok(())
        }
        Strategy::Map => {
            let writer = SharedWriter::new(out);
            map_with(
                |[i, j]| {
                    let mut acc = *input.get([i, j]);
                    for k in 1..=h {
                        acc = acc + cross(i, j, k);
                    }
                    // Safety: each point writes only its own cell.
                    unsafe { writer.set([i, j], acc) };
                },
                interior,
                schedule,
            )
        }
        Strategy::MapReduce => {
            let writer = SharedWriter::new(out);
            try_map_with(
                |[i, j]| {
                    let neighbors = reduce(|[k]| cross(i, j, k), ops::Add, ring)?;
                    // Safety: each point writes only its own cell.
                    unsafe { writer.set([i, j], *input.get([i, j]) + neighbors) };
                    Ok(())
                },
                interior,
                schedule,
            )
        }
    }
}
