//! Boxed values held by the owned-copy policy.
//!
//! A boxed value is heap data the container deep-copies on the way in and
//! on the way out. Copying reserves storage with `try_reserve` so an
//! allocation failure surfaces as an error instead of an abort.

use core::cmp::Ordering;
use std::collections::TryReserveError;

/// Heap value with fallible deep copy.
pub trait Boxed: Sized {
    /// Build an independent deep copy of `src`.
    fn init_with_copy(src: &Self) -> Result<Self, TryReserveError>;

    /// Release the value's storage. The default simply drops it.
    fn invalidate(self) {
        drop(self);
    }

    fn compare(&self, other: &Self) -> Ordering;
}

impl Boxed for String {
    fn init_with_copy(src: &Self) -> Result<Self, TryReserveError> {
        let mut s = String::new();
        s.try_reserve_exact(src.len())?;
        s.push_str(src);
        Ok(s)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<T: Clone + Ord> Boxed for Vec<T> {
    fn init_with_copy(src: &Self) -> Result<Self, TryReserveError> {
        let mut v = Vec::new();
        v.try_reserve_exact(src.len())?;
        v.extend_from_slice(src);
        Ok(v)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Boxed> Boxed for Box<T> {
    fn init_with_copy(src: &Self) -> Result<Self, TryReserveError> {
        T::init_with_copy(src).map(Box::new)
    }

    fn invalidate(self) {
        T::invalidate(*self);
    }

    fn compare(&self, other: &Self) -> Ordering {
        T::compare(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_copy_is_independent() {
        let src = String::from("alpha");
        let mut copy = String::init_with_copy(&src).unwrap();
        assert_eq!(copy, src);
        assert_ne!(copy.as_ptr(), src.as_ptr());
        copy.push('!');
        assert_eq!(src, "alpha");
    }

    #[test]
    fn vec_and_box_copies() {
        let v = vec![3, 1, 2];
        let c = Vec::init_with_copy(&v).unwrap();
        assert_eq!(c, v);
        assert_eq!(v.compare(&c), Ordering::Equal);

        let b = Box::new(String::from("x"));
        let bc = Box::init_with_copy(&b).unwrap();
        assert_eq!(*bc, "x");
        assert_eq!(b.compare(&Box::new(String::from("y"))), Ordering::Less);
        bc.invalidate();
    }
}
