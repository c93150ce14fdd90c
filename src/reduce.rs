//! Reduce engine: fold a per-point value over a domain into one scalar.
//!
//! The domain is partitioned exactly like the map engine partitions it
//! (contiguous outer-axis stripes). Each stripe folds sequentially in
//! row-major order, seeded by the operator's identity (or by its first value
//! when the operator has none); stripe partials are then combined pairwise
//! up the join tree in unspecified order.
//!
//! For truly associative, commutative operators over exact value types
//! (integer add, integer/float max) the result is bit-identical to a fully
//! serial left fold regardless of schedule. Floating-point sums may differ
//! in low-order bits across schedules because reassociation changes
//! rounding; compare those with an epsilon.
//!
//! Reduce calls nest freely inside map callbacks, the fused map-of-reduce
//! shape used by stencils, convolution windows and dot products. Each nested
//! call independently honors the guarantees above over its own (typically
//! small) domain.

use crate::domain::Domain;
use crate::ops::{Add, Combine, GreaterThan};
use crate::schedule::Schedule;
use crate::{MapReduceError, Result};
use num_traits::{Bounded, Zero};

#[cfg(feature = "parallel")]
use crate::MIN_PARALLEL_POINTS;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicBool, Ordering};

/// Reduce `value_of` over `domain` with `op`, under the default reduce
/// schedule (serial).
pub fn reduce<V, C, T, const N: usize>(value_of: V, op: C, domain: Domain<N>) -> Result<T>
where
    V: Fn([isize; N]) -> T + Sync,
    C: Combine<T> + Sync,
    T: Send,
{
    reduce_with(value_of, op, domain, Schedule::Serial)
}

/// Reduce under an explicit schedule.
pub fn reduce_with<V, C, T, const N: usize>(
    value_of: V,
    op: C,
    domain: Domain<N>,
    schedule: Schedule,
) -> Result<T>
where
    V: Fn([isize; N]) -> T + Sync,
    C: Combine<T> + Sync,
    T: Send,
{
    try_reduce_with(|point| Ok(value_of(point)), op, domain, schedule)
}

/// Fallible variant of [`reduce`].
pub fn try_reduce<V, C, T, const N: usize>(value_of: V, op: C, domain: Domain<N>) -> Result<T>
where
    V: Fn([isize; N]) -> Result<T> + Sync,
    C: Combine<T> + Sync,
    T: Send,
{
    try_reduce_with(value_of, op, domain, Schedule::Serial)
}

/// Reduce a fallible `value_of` over `domain`.
///
/// Over an empty domain this returns the operator's identity, or
/// [`MapReduceError::EmptyDomainNoIdentity`] when the operator has none;
/// never a default-constructed value. Callback failures follow the same
/// first-error, cooperative-cancellation policy as
/// [`try_map_with`](crate::try_map_with).
pub fn try_reduce_with<V, C, T, const N: usize>(
    value_of: V,
    op: C,
    domain: Domain<N>,
    schedule: Schedule,
) -> Result<T>
where
    V: Fn([isize; N]) -> Result<T> + Sync,
    C: Combine<T> + Sync,
    T: Send,
{
    match schedule {
        Schedule::Serial => {
            let partial = fold_stripe(&value_of, &op, domain)?;
            partial.ok_or(MapReduceError::EmptyDomainNoIdentity)
        }
        Schedule::Parallel { .. } => {
            #[cfg(feature = "parallel")]
            {
                let poison = AtomicBool::new(false);
                let partial =
                    reduce_striped(&value_of, &op, domain, schedule.worker_count(), &poison)?;
                partial.ok_or(MapReduceError::EmptyDomainNoIdentity)
            }
            #[cfg(not(feature = "parallel"))]
            {
                let partial = fold_stripe(&value_of, &op, domain)?;
                partial.ok_or(MapReduceError::EmptyDomainNoIdentity)
            }
        }
    }
}

/// Convenience: sum of `value_of` over `domain` (serial).
pub fn reduce_sum<V, T, const N: usize>(value_of: V, domain: Domain<N>) -> Result<T>
where
    V: Fn([isize; N]) -> T + Sync,
    T: Zero + Send,
{
    reduce(value_of, Add, domain)
}

/// Convenience: maximum of `value_of` over `domain` (serial).
pub fn reduce_max<V, T, const N: usize>(value_of: V, domain: Domain<N>) -> Result<T>
where
    V: Fn([isize; N]) -> T + Sync,
    T: PartialOrd + Bounded + Send,
{
    reduce(value_of, GreaterThan, domain)
}

/// Sequential row-major fold over one stripe. `None` means the stripe was
/// empty and the operator has no identity to stand in.
fn fold_stripe<V, C, T, const N: usize>(
    value_of: &V,
    op: &C,
    domain: Domain<N>,
) -> Result<Option<T>>
where
    V: Fn([isize; N]) -> Result<T>,
    C: Combine<T>,
{
    let mut acc = op.identity();
    domain.for_each_point(&mut |point| {
        let value = value_of(point)?;
        acc = Some(match acc.take() {
            Some(partial) => op.combine(partial, value),
            None => value,
        });
        Ok(())
    })?;
    Ok(acc)
}

/// Recursive stripe executor mirroring the map engine's partitioning.
#[cfg(feature = "parallel")]
fn reduce_striped<V, C, T, const N: usize>(
    value_of: &V,
    op: &C,
    domain: Domain<N>,
    threads: usize,
    poison: &AtomicBool,
) -> Result<Option<T>>
where
    V: Fn([isize; N]) -> Result<T> + Sync,
    C: Combine<T> + Sync,
    T: Send,
{
    if poison.load(Ordering::Relaxed) {
        return Ok(None);
    }

    if threads <= 1
        || N == 0
        || domain.len() <= MIN_PARALLEL_POINTS
        || domain.axis(0).len() <= 1
    {
        let result = fold_stripe(value_of, op, domain);
        if result.is_err() {
            poison.store(true, Ordering::Relaxed);
        }
        return result;
    }

    let (lo_domain, hi_domain) = domain.split_outer();
    let t_lo = threads / 2;
    let t_hi = threads - t_lo;
    let (lo, hi) = rayon::join(
        || reduce_striped(value_of, op, lo_domain, t_lo, poison),
        || reduce_striped(value_of, op, hi_domain, t_hi, poison),
    );
    Ok(match (lo?, hi?) {
        (Some(a), Some(b)) => Some(op.combine(a, b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    })
}
