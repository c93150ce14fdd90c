//! Scheduling policy: how domain points are partitioned and visited.

use std::num::NonZeroUsize;

/// Execution policy for a single map/reduce call.
///
/// A pure configuration value with no hidden global state; the worker pool
/// (rayon's) lives outside the engine. Defaults are documented per entry
/// point: [`map`](crate::map) runs parallel unless told otherwise,
/// [`reduce`](crate::reduce) runs serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Single-threaded, deterministic row-major visitation. The correctness
    /// oracle the parallel schedule is validated against.
    #[default]
    Serial,
    /// Worker-pool execution over contiguous outer-axis stripes. `threads`
    /// caps the striping degree; `None` uses the rayon pool width. Domains
    /// below [`MIN_PARALLEL_POINTS`](crate::MIN_PARALLEL_POINTS) run
    /// sequentially regardless.
    Parallel { threads: Option<NonZeroUsize> },
}

impl Schedule {
    /// Parallel schedule sized to the rayon pool.
    pub fn parallel() -> Self {
        Schedule::Parallel { threads: None }
    }

    /// Parallel schedule with an explicit striping degree. A degree of 0
    /// falls back to the pool width; a degree of 1 runs sequentially.
    pub fn parallel_with(threads: usize) -> Self {
        Schedule::Parallel {
            threads: NonZeroUsize::new(threads),
        }
    }

    /// Number of workers this policy may use.
    pub(crate) fn worker_count(&self) -> usize {
        match self {
            Schedule::Serial => 1,
            #[cfg(feature = "parallel")]
            Schedule::Parallel { threads } => threads
                .map(NonZeroUsize::get)
                .unwrap_or_else(rayon::current_num_threads),
            #[cfg(not(feature = "parallel"))]
            Schedule::Parallel { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serial() {
        assert_eq!(Schedule::default(), Schedule::Serial);
        assert_eq!(Schedule::Serial.worker_count(), 1);
    }

    #[test]
    fn test_parallel_with_degree() {
        // Degree 0 cannot be represented; it falls back to the pool width.
        assert_eq!(Schedule::parallel_with(0), Schedule::parallel());
        #[cfg(feature = "parallel")]
        assert_eq!(Schedule::parallel_with(4).worker_count(), 4);
    }
}
