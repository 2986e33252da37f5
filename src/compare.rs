//! Key comparators.
//!
//! A comparator plays the part a `BuildHasher` plays for a hash map: it is
//! a type parameter of the container, defaults to [`Natural`], and is the
//! only user code the tree engine calls while searching.

use core::cmp::Ordering;
use std::rc::{Rc, Weak};

use crate::boxed::Boxed;

/// Total order over stored keys.
pub trait Compare<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders keys by their `Ord` implementation.
#[derive(Copy, Clone, Debug, Default)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Orders references by the address of their referent.
///
/// This is the only order available for weak keys: the referent may be
/// gone, but the allocation address stays stable while any weak handle
/// to it exists.
#[derive(Copy, Clone, Debug, Default)]
pub struct ByAddress;

impl<T> Compare<Rc<T>> for ByAddress {
    #[inline]
    fn compare(&self, a: &Rc<T>, b: &Rc<T>) -> Ordering {
        Rc::as_ptr(a).cmp(&Rc::as_ptr(b))
    }
}

impl<T> Compare<Weak<T>> for ByAddress {
    #[inline]
    fn compare(&self, a: &Weak<T>, b: &Weak<T>) -> Ordering {
        a.as_ptr().cmp(&b.as_ptr())
    }
}

impl<T> Compare<&T> for ByAddress {
    #[inline]
    fn compare(&self, a: &&T, b: &&T) -> Ordering {
        (*a as *const T).cmp(&(*b as *const T))
    }
}

/// Orders boxed values with [`Boxed::compare`].
#[derive(Copy, Clone, Debug, Default)]
pub struct BoxedOrder;

impl<B: Boxed> Compare<B> for BoxedOrder {
    #[inline]
    fn compare(&self, a: &B, b: &B) -> Ordering {
        a.compare(b)
    }
}
