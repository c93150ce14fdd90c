//! Index domains: N-dimensional axis-aligned iteration spaces.
//!
//! A [`Domain`] is an ordered tuple of per-axis `(offset, extent)` pairs.
//! Domains are cheap `Copy` value objects, built at kernel call sites and
//! discarded after the call. An extent of zero (or less) on any axis makes
//! the whole domain empty: map visits nothing, reduce has no terms.

use crate::Result;

/// One axis of an iteration domain: the half-open range
/// `[offset, offset + extent)`.
///
/// A non-positive extent is legal and denotes an empty axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axis {
    pub offset: isize,
    pub extent: isize,
}

impl Axis {
    /// Axis starting at `offset` with `extent` points.
    pub const fn new(offset: isize, extent: isize) -> Self {
        Axis { offset, extent }
    }

    /// Axis covering the half-open range `[begin, end)`.
    pub const fn span(begin: isize, end: isize) -> Self {
        Axis {
            offset: begin,
            extent: end - begin,
        }
    }

    /// Number of points on this axis (0 for degenerate axes).
    pub const fn len(&self) -> usize {
        if self.extent > 0 {
            self.extent as usize
        } else {
            0
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.extent <= 0
    }

    /// One past the last coordinate, clamped so that `end() >= offset`.
    pub const fn end(&self) -> isize {
        if self.extent > 0 {
            self.offset + self.extent
        } else {
            self.offset
        }
    }
}

impl From<usize> for Axis {
    /// Extent-only axis, offset 0.
    fn from(extent: usize) -> Self {
        Axis::new(0, extent as isize)
    }
}

impl From<(isize, isize)> for Axis {
    fn from((offset, extent): (isize, isize)) -> Self {
        Axis::new(offset, extent)
    }
}

/// An N-dimensional iteration domain, one [`Axis`] per dimension.
///
/// Points are `[isize; N]` coordinates with component `i` constrained to
/// axis `i`'s range. The canonical (serial) visitation order is row-major:
/// axis 0 outermost, axis `N-1` fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain<const N: usize> {
    axes: [Axis; N],
}

impl<const N: usize> Domain<N> {
    /// Domain from explicit per-axis descriptors.
    pub fn new(axes: [Axis; N]) -> Self {
        Domain { axes }
    }

    /// Domain from extents only, every offset 0.
    pub fn of(extents: [usize; N]) -> Self {
        Domain {
            axes: extents.map(Axis::from),
        }
    }

    pub fn axis(&self, dim: usize) -> Axis {
        self.axes[dim]
    }

    pub fn axes(&self) -> &[Axis; N] {
        &self.axes
    }

    /// Total number of points. Zero if any axis is empty.
    pub fn len(&self) -> usize {
        self.axes.iter().map(Axis::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.iter().any(Axis::is_empty)
    }

    /// Split the outermost axis into two contiguous stripes of (near-)equal
    /// length. The partition primitive shared by the map and reduce engines;
    /// the outermost axis must have at least 2 points.
    pub(crate) fn split_outer(self) -> (Self, Self) {
        let outer = self.axes[0];
        let half = (outer.len() / 2) as isize;
        let mut lo = self;
        lo.axes[0] = Axis::new(outer.offset, half);
        let mut hi = self;
        hi.axes[0] = Axis::new(outer.offset + half, outer.extent - half);
        (lo, hi)
    }

    /// Visit every point in row-major order, stopping at the first error.
    pub(crate) fn for_each_point<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut([isize; N]) -> Result<()>,
    {
        let total = self.len();
        if total == 0 {
            return Ok(());
        }
        let mut point = [0isize; N];
        for (p, axis) in point.iter_mut().zip(self.axes.iter()) {
            *p = axis.offset;
        }
        for _ in 0..total {
            f(point)?;
            // Row-major odometer: last axis fastest.
            for d in (0..N).rev() {
                point[d] += 1;
                if point[d] < self.axes[d].end() {
                    break;
                }
                point[d] = self.axes[d].offset;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_len() {
        assert_eq!(Axis::new(0, 5).len(), 5);
        assert_eq!(Axis::new(-2, 5).len(), 5);
        assert_eq!(Axis::new(3, 0).len(), 0);
        // Negative extent denotes "nothing to visit", not an error.
        assert_eq!(Axis::new(5, -3).len(), 0);
        assert_eq!(Axis::span(2, 7).len(), 5);
        assert_eq!(Axis::span(7, 2).len(), 0);
    }

    #[test]
    fn test_domain_len() {
        assert_eq!(Domain::of([4, 5]).len(), 20);
        assert_eq!(Domain::of([4, 0]).len(), 0);
        assert!(Domain::of([4, 0]).is_empty());
        assert_eq!(Domain::new([Axis::new(2, 3), Axis::new(-1, 2)]).len(), 6);
    }

    #[test]
    fn test_row_major_visitation_order() {
        let d = Domain::new([Axis::new(1, 2), Axis::new(10, 3)]);
        let mut seen = Vec::new();
        d.for_each_point(&mut |p| {
            seen.push(p);
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![[1, 10], [1, 11], [1, 12], [2, 10], [2, 11], [2, 12]]
        );
    }

    #[test]
    fn test_empty_domain_visits_nothing() {
        let d = Domain::new([Axis::new(0, 3), Axis::new(5, -1)]);
        let mut count = 0;
        d.for_each_point(&mut |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_split_outer_covers_domain() {
        let d = Domain::new([Axis::new(3, 7), Axis::new(0, 4)]);
        let (lo, hi) = d.split_outer();
        assert_eq!(lo.axis(0), Axis::new(3, 3));
        assert_eq!(hi.axis(0), Axis::new(6, 4));
        assert_eq!(lo.axis(1), d.axis(1));
        assert_eq!(hi.axis(1), d.axis(1));
        assert_eq!(lo.len() + hi.len(), d.len());
    }

    #[test]
    fn test_split_outer_odd_extent() {
        let (lo, hi) = Domain::of([5]).split_outer();
        assert_eq!(lo.axis(0).len(), 2);
        assert_eq!(hi.axis(0).len(), 3);
    }
}
