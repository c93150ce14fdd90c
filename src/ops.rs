//! Reduction operators: associative binary combines with optional identity.

use num_traits::{Bounded, Zero};

/// An associative binary operator over a value type, with an optional
/// identity element.
///
/// The engine relies on associativity to combine per-stripe partial results
/// in unspecified order; it cannot verify it. A non-associative operator
/// yields schedule-dependent results, a documented hazard rather than a
/// contract violation. Operators without an identity make reduction over an empty
/// domain an error
/// ([`EmptyDomainNoIdentity`](crate::MapReduceError::EmptyDomainNoIdentity)).
pub trait Combine<T> {
    fn combine(&self, a: T, b: T) -> T;

    /// Identity element, if the operator has one. Defaults to `None`, in
    /// which case folds are seeded with the first visited value.
    fn identity(&self) -> Option<T> {
        None
    }
}

/// Sum. Identity: `T::zero()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl<T: Zero> Combine<T> for Add {
    fn combine(&self, a: T, b: T) -> T {
        a + b
    }

    fn identity(&self) -> Option<T> {
        Some(T::zero())
    }
}

/// Maximum under `>`. Identity: the type's minimum representable value.
///
/// Assumes a total order over the values actually reduced; NaN terms make
/// the result unspecified. For floats the identity is the smallest *finite*
/// value (`Bounded` gives `f64::MIN`, not negative infinity), so inputs are
/// assumed finite: a reduction whose terms are all `-inf` yields `f64::MIN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreaterThan;

impl<T: PartialOrd + Bounded> Combine<T> for GreaterThan {
    fn combine(&self, a: T, b: T) -> T {
        if a > b {
            a
        } else {
            b
        }
    }

    fn identity(&self) -> Option<T> {
        Some(T::min_value())
    }
}

/// A user-supplied combine function. Built with [`from_fn`]; has no
/// identity, so reducing an empty domain with it is an error.
#[derive(Debug, Clone, Copy)]
pub struct FnOp<F>(F);

/// Wrap a binary closure as a reduction operator. The closure must be
/// associative for schedule-independent results.
pub fn from_fn<F>(f: F) -> FnOp<F> {
    FnOp(f)
}

impl<T, F> Combine<T> for FnOp<F>
where
    F: Fn(T, T) -> T,
{
    fn combine(&self, a: T, b: T) -> T {
        (self.0)(a, b)
    }
}
