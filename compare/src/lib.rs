#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

//! Ordering policies shared by the sorting algorithms and the tree structures.
//!
//! A comparator answers a single question: should `a` be placed ahead of `b`?
//! Everything else (equality of keys in a tree, ties in a stable sort) is
//! derived from that predicate:
//!
//! * `a` and `b` are equivalent if neither precedes the other
//! * `b` belongs after `a` if `a` precedes `b`

use core::ops;

/// A strict ordering predicate over `T`.
///
/// Implementations must define a strict total order, otherwise the
/// algorithms that consume them may produce garbage (but they will never
/// cause undefined behaviour).
pub trait Compare<T: ?Sized> {
    /// Returns `true` if `a` must be ordered ahead of `b`.
    fn precedes(&self, a: &T, b: &T) -> bool;
}

/// Ascending order, `a` precedes `b` if `a < b`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Less;

impl<T> Compare<T> for Less
where
    T: PartialOrd + ?Sized,
{
    #[inline]
    fn precedes(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Descending order, `a` precedes `b` if `a > b`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Greater;

impl<T> Compare<T> for Greater
where
    T: PartialOrd + ?Sized,
{
    #[inline]
    fn precedes(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

/// Compares pointer-like values by what they point to.
///
/// ```
/// use std::rc::Rc;
/// use compare::{Compare, Deref, Greater};
///
/// let cmp = Deref(Greater);
/// assert!(cmp.precedes(&Rc::new(5), &Rc::new(3)));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Deref<C>(pub C);

impl<P, C> Compare<P> for Deref<C>
where
    P: ops::Deref,
    C: Compare<P::Target>,
{
    #[inline]
    fn precedes(&self, a: &P, b: &P) -> bool {
        self.0.precedes(&**a, &**b)
    }
}

impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn precedes(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}
