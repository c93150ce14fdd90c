//! Map engine: apply a function at every point of a domain.
//!
//! Guarantees: every point is visited exactly once under any schedule.
//! Serial execution visits points in row-major order; parallel execution
//! recursively halves the outermost axis into contiguous stripes and runs
//! them on the rayon pool via `rayon::join`, with no ordering guarantee
//! between stripes. Calls are blocking barriers: they return only once all
//! stripes have completed.
//!
//! Side effects happen entirely through the callback's captures. The stripe
//! partitioning never hands the same point to two workers, so kernels where
//! each point writes only its own output cell (all the kernels in
//! [`crate::kernels`]) are race-free by construction.

use crate::domain::Domain;
use crate::schedule::Schedule;
use crate::Result;

#[cfg(feature = "parallel")]
use crate::MIN_PARALLEL_POINTS;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicBool, Ordering};

/// Apply `f` at every point of `domain` under the default map schedule
/// (parallel).
pub fn map<F, const N: usize>(f: F, domain: Domain<N>) -> Result<()>
where
    F: Fn([isize; N]) + Sync,
{
    map_with(f, domain, Schedule::parallel())
}

/// Apply `f` at every point of `domain` under an explicit schedule.
pub fn map_with<F, const N: usize>(f: F, domain: Domain<N>, schedule: Schedule) -> Result<()>
where
    F: Fn([isize; N]) + Sync,
{
    try_map_with(
        |point| {
            f(point);
            Ok(())
        },
        domain,
        schedule,
    )
}

/// Fallible variant of [`map`].
pub fn try_map<F, const N: usize>(f: F, domain: Domain<N>) -> Result<()>
where
    F: Fn([isize; N]) -> Result<()> + Sync,
{
    try_map_with(f, domain, Schedule::parallel())
}

/// Apply a fallible `f` at every point of `domain`.
///
/// On failure the first observed error is returned; stripes that have not
/// started yet are cancelled, stripes already in flight drain (cooperative
/// cancellation, not preemptive). No point is ever visited twice, but under
/// a parallel schedule some points may go unvisited after a failure.
pub fn try_map_with<F, const N: usize>(f: F, domain: Domain<N>, schedule: Schedule) -> Result<()>
where
    F: Fn([isize; N]) -> Result<()> + Sync,
{
    match schedule {
        Schedule::Serial => domain.for_each_point(&mut |point| f(point)),
        Schedule::Parallel { .. } => {
            #[cfg(feature = "parallel")]
            {
                let poison = AtomicBool::new(false);
                map_striped(&f, domain, schedule.worker_count(), &poison)
            }
            #[cfg(not(feature = "parallel"))]
            {
                domain.for_each_point(&mut |point| f(point))
            }
        }
    }
}

/// Recursive stripe executor: halve the outermost axis until the stripe is
/// small enough (or the thread budget is spent), then iterate sequentially.
#[cfg(feature = "parallel")]
fn map_striped<F, const N: usize>(
    f: &F,
    domain: Domain<N>,
    threads: usize,
    poison: &AtomicBool,
) -> Result<()>
where
    F: Fn([isize; N]) -> Result<()> + Sync,
{
    // A sibling stripe already failed; don't start new work. The error is
    // surfaced by the stripe that observed it.
    if poison.load(Ordering::Relaxed) {
        return Ok(());
    }

    if threads <= 1
        || N == 0
        || domain.len() <= MIN_PARALLEL_POINTS
        || domain.axis(0).len() <= 1
    {
        let result = domain.for_each_point(&mut |point| f(point));
        if result.is_err() {
            poison.store(true, Ordering::Relaxed);
        }
        return result;
    }

    let (lo, hi) = domain.split_outer();
    let t_lo = threads / 2;
    let t_hi = threads - t_lo;
    let (a, b) = rayon::join(
        || map_striped(f, lo, t_lo, poison),
        || map_striped(f, hi, t_hi, poison),
    );
    a?;
    b
}
