//! The indexing contract array backends expose to kernel code.
//!
//! The engine itself never reads or writes arrays (side effects flow
//! through callback captures), but kernel code needs a uniform way to index
//! whatever storage it closes over. [`Grid`]/[`GridMut`] is that contract:
//! one coordinate per axis, a reference out. Backends own their storage and
//! layout; three reference implementations are provided:
//!
//! - fixed-size Rust arrays `[T; L]` and `[[T; C]; R]` (static shape, loop
//!   bounds monomorphized at compile time),
//! - [`DynGrid`]: a `Vec`-backed row-major container with runtime extents,
//! - [`mdarray::Tensor`] with dynamic rank (third-party multi-array).
//!
//! Coordinates are `isize` to match domain points; all provided backends
//! require them non-negative and in range.

use std::marker::PhantomData;

/// Read access to an N-dimensional array backend.
pub trait Grid<const N: usize> {
    type Elem;

    /// Number of elements along `axis`. Panics if `axis >= N`.
    fn extent(&self, axis: usize) -> usize;

    /// Element at `index`. Panics if any coordinate is out of range.
    fn get(&self, index: [isize; N]) -> &Self::Elem;
}

/// Write access to an N-dimensional array backend.
pub trait GridMut<const N: usize>: Grid<N> {
    fn get_mut(&mut self, index: [isize; N]) -> &mut Self::Elem;

    /// Mutable base pointer of the storage backing this grid.
    ///
    /// The pointer must carry provenance over all `extent(0) * ... *
    /// extent(N-1)` elements, laid out dense row-major (last axis fastest),
    /// addressing the same cells as [`get_mut`](GridMut::get_mut). It stays
    /// valid for the duration of the borrow. [`SharedWriter`] extracts this
    /// pointer once, up front, so parallel writers never re-form a `&mut`
    /// to the grid.
    fn base_ptr(&mut self) -> *mut Self::Elem;
}

// ============================================================================
// Fixed-size arrays (static shape)
// ============================================================================

impl<T, const L: usize> Grid<1> for [T; L] {
    type Elem = T;

    fn extent(&self, axis: usize) -> usize {
        [L][axis]
    }

    fn get(&self, [i]: [isize; 1]) -> &T {
        &self[i as usize]
    }
}

impl<T, const L: usize> GridMut<1> for [T; L] {
    fn get_mut(&mut self, [i]: [isize; 1]) -> &mut T {
        &mut self[i as usize]
    }

    fn base_ptr(&mut self) -> *mut T {
        self.as_mut_slice().as_mut_ptr()
    }
}

impl<T, const R: usize, const C: usize> Grid<2> for [[T; C]; R] {
    type Elem = T;

    fn extent(&self, axis: usize) -> usize {
        [R, C][axis]
    }

    fn get(&self, [i, j]: [isize; 2]) -> &T {
        &self[i as usize][j as usize]
    }
}

impl<T, const R: usize, const C: usize> GridMut<2> for [[T; C]; R] {
    fn get_mut(&mut self, [i, j]: [isize; 2]) -> &mut T {
        &mut self[i as usize][j as usize]
    }

    fn base_ptr(&mut self) -> *mut T {
        // Nested arrays are contiguous row-major.
        self.as_mut_slice().as_mut_ptr().cast()
    }
}

// ============================================================================
// DynGrid: runtime extents, row-major Vec storage
// ============================================================================

/// A dense N-dimensional container with runtime extents, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynGrid<T, const N: usize> {
    extents: [usize; N],
    data: Vec<T>,
}

impl<T, const N: usize> DynGrid<T, N> {
    /// Grid of the given extents with every element set to `value`.
    pub fn filled(extents: [usize; N], value: T) -> Self
    where
        T: Clone,
    {
        let len = extents.iter().product();
        DynGrid {
            extents,
            data: vec![value; len],
        }
    }

    /// Grid built by evaluating `f` at every index, in row-major order.
    pub fn from_fn<F>(extents: [usize; N], mut f: F) -> Self
    where
        F: FnMut([usize; N]) -> T,
    {
        let len: usize = extents.iter().product();
        let mut data = Vec::with_capacity(len);
        let mut index = [0usize; N];
        for _ in 0..len {
            data.push(f(index));
            for d in (0..N).rev() {
                index[d] += 1;
                if index[d] < extents[d] {
                    break;
                }
                index[d] = 0;
            }
        }
        DynGrid { extents, data }
    }

    pub fn extents(&self) -> [usize; N] {
        self.extents
    }

    /// Flat row-major view of the storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn linear(&self, index: [isize; N]) -> usize {
        let mut flat = 0usize;
        for (d, &i) in index.iter().enumerate() {
            // Unconditional: a coordinate past the extent would otherwise
            // alias row-major into the next row.
            assert!(
                i >= 0 && (i as usize) < self.extents[d],
                "coordinate {i} out of range on axis {d} (extent {})",
                self.extents[d]
            );
            flat = flat * self.extents[d] + i as usize;
        }
        flat
    }
}

impl<T, const N: usize> Grid<N> for DynGrid<T, N> {
    type Elem = T;

    fn extent(&self, axis: usize) -> usize {
        self.extents[axis]
    }

    fn get(&self, index: [isize; N]) -> &T {
        &self.data[self.linear(index)]
    }
}

impl<T, const N: usize> GridMut<N> for DynGrid<T, N> {
    fn get_mut(&mut self, index: [isize; N]) -> &mut T {
        let flat = self.linear(index);
        &mut self.data[flat]
    }

    fn base_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }
}

// ============================================================================
// mdarray tensors (third-party multi-array)
// ============================================================================

impl<T> Grid<1> for mdarray::Tensor<T, mdarray::DynRank> {
    type Elem = T;

    fn extent(&self, axis: usize) -> usize {
        [self.dim(0)][axis]
    }

    fn get(&self, [i]: [isize; 1]) -> &T {
        &self[[i as usize]]
    }
}

impl<T> GridMut<1> for mdarray::Tensor<T, mdarray::DynRank> {
    fn get_mut(&mut self, [i]: [isize; 1]) -> &mut T {
        &mut self[[i as usize]]
    }

    fn base_ptr(&mut self) -> *mut T {
        self.as_mut_ptr()
    }
}

impl<T> Grid<2> for mdarray::Tensor<T, mdarray::DynRank> {
    type Elem = T;

    fn extent(&self, axis: usize) -> usize {
        [self.dim(0), self.dim(1)][axis]
    }

    fn get(&self, [i, j]: [isize; 2]) -> &T {
        &self[[i as usize, j as usize]]
    }
}

impl<T> GridMut<2> for mdarray::Tensor<T, mdarray::DynRank> {
    fn get_mut(&mut self, [i, j]: [isize; 2]) -> &mut T {
        &mut self[[i as usize, j as usize]]
    }

    fn base_ptr(&mut self) -> *mut T {
        self.as_mut_ptr()
    }
}

// ============================================================================
// SharedWriter: shared mutable handle for owner-writes-once maps
// ============================================================================

/// A `Sync` write handle over a mutably borrowed grid, for map callbacks
/// that run in parallel and write each output cell exactly once.
///
/// The map engine's stripe partitioning hands every domain point to exactly
/// one worker, so a kernel where point `(i, j)` writes only cell `(i, j)`
/// never races. The handle captures the grid's base pointer and extents at
/// construction (while the exclusive borrow is held) and writes through
/// pointer arithmetic; no `&mut` to the grid or its storage is ever formed
/// while workers run, which keeps concurrent disjoint writes legal under
/// Rust's aliasing model. It adds no synchronization.
pub struct SharedWriter<'a, T, const N: usize> {
    base: *mut T,
    extents: [usize; N],
    _marker: PhantomData<&'a mut T>,
}

// Safety: SharedWriter hands out no references, only moves values of T into
// disjoint cells; the disjoint-write contract on `set` is what prevents data
// races.
unsafe impl<'a, T: Send, const N: usize> Send for SharedWriter<'a, T, N> {}
unsafe impl<'a, T: Send, const N: usize> Sync for SharedWriter<'a, T, N> {}

impl<'a, T, const N: usize> SharedWriter<'a, T, N> {
    /// Take exclusive ownership of `grid` for the duration of a map call.
    pub fn new<G>(grid: &'a mut G) -> Self
    where
        G: GridMut<N, Elem = T> + ?Sized,
    {
        SharedWriter {
            extents: std::array::from_fn(|axis| grid.extent(axis)),
            base: grid.base_ptr(),
            _marker: PhantomData,
        }
    }

    /// Store `value` at `index`. Panics if any coordinate is out of range.
    ///
    /// # Safety
    ///
    /// No two concurrently executing callbacks may write the same cell, and
    /// no callback may read a cell another callback writes during the same
    /// map call. Kernels where each domain point writes only its own output
    /// cell satisfy this for any stripe partition.
    pub unsafe fn set(&self, index: [isize; N], value: T) {
        let mut flat = 0usize;
        for (d, &i) in index.iter().enumerate() {
            assert!(
                i >= 0 && (i as usize) < self.extents[d],
                "coordinate {i} out of range on axis {d} (extent {})",
                self.extents[d]
            );
            flat = flat * self.extents[d] + i as usize;
        }
        *self.base.add(flat) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::schedule::Schedule;
    use mdarray::Tensor;

    #[test]
    fn test_static_array_grid() {
        // A nested array is also a 1D grid of rows, so the arity must be
        // spelled out where the argument does not fix it.
        let mut a = [[0i64; 3]; 2];
        assert_eq!(<_ as Grid<2>>::extent(&a, 0), 2);
        assert_eq!(<_ as Grid<2>>::extent(&a, 1), 3);
        *<_ as GridMut<2>>::get_mut(&mut a, [1, 2]) = 7;
        assert_eq!(*<_ as Grid<2>>::get(&a, [1, 2]), 7);
    }

    #[test]
    fn test_dyn_grid_row_major() {
        let g = DynGrid::from_fn([2, 3], |[i, j]| (3 * i + j) as i64);
        assert_eq!(g.as_slice(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(*g.get([1, 1]), 4);
        assert_eq!(g.extent(1), 3);
    }

    #[test]
    fn test_dyn_grid_filled() {
        let mut g: DynGrid<f64, 2> = DynGrid::filled([4, 4], 1.5);
        assert_eq!(*g.get([3, 3]), 1.5);
        *g.get_mut([0, 1]) = 2.0;
        assert_eq!(g.as_slice()[1], 2.0);
    }

    #[test]
    fn test_mdarray_tensor_grid() {
        let mut t = Tensor::from_fn([2, 3], |idx| (idx[0] * 10 + idx[1]) as i64).into_dyn();
        // Both Grid<1> and Grid<2> are implemented for dynamic-rank tensors,
        // so the arity must be spelled out here.
        assert_eq!(<_ as Grid<2>>::extent(&t, 0), 2);
        assert_eq!(*<_ as Grid<2>>::get(&t, [1, 2]), 12);
        *<_ as GridMut<2>>::get_mut(&mut t, [0, 0]) = -1;
        assert_eq!(t[[0, 0]], -1);
    }

    #[test]
    fn test_shared_writer_single_thread() {
        let mut g: DynGrid<i64, 1> = DynGrid::filled([4], 0);
        let w = SharedWriter::new(&mut g);
        for i in 0..4 {
            unsafe { w.set([i], i as i64 * 2) };
        }
        assert_eq!(g.as_slice(), &[0, 2, 4, 6]);
    }

    #[test]
    fn test_shared_writer_parallel_disjoint_writes() {
        // Large enough that the map engine actually stripes across workers;
        // every cell written by exactly one callback through the raw base
        // pointer, no `&mut` to the grid formed while workers run.
        let (n, m) = (300usize, 300usize);
        let mut g: DynGrid<i64, 2> = DynGrid::filled([n, m], -1);
        let w = SharedWriter::new(&mut g);
        crate::map_with(
            |[i, j]| unsafe { w.set([i, j], i as i64 * m as i64 + j as i64) },
            Domain::of([n, m]),
            Schedule::parallel(),
        )
        .unwrap();
        for i in 0..n as isize {
            for j in 0..m as isize {
                assert_eq!(*g.get([i, j]), i as i64 * m as i64 + j as i64);
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_dyn_grid_inner_coordinate_past_extent_panics() {
        // [0, 3] must not alias row-major into cell [1, 0].
        let g = DynGrid::from_fn([2, 3], |[i, j]| (3 * i + j) as i64);
        g.get([0, 3]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_dyn_grid_negative_coordinate_panics() {
        let g: DynGrid<i64, 2> = DynGrid::filled([2, 3], 0);
        g.get([-1, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_shared_writer_out_of_range_panics() {
        let mut g: DynGrid<i64, 2> = DynGrid::filled([2, 3], 0);
        let w = SharedWriter::new(&mut g);
        unsafe { w.set([0, 3], 9) };
    }
}
