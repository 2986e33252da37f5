//! Reference cells consumed by the strong and weak policies.
//!
//! A [`Shared<T>`] names a reference-counted allocation without holding a
//! count on it. Retaining it mints a full ownership unit (`Rc<T>`) and fails
//! once the strong count has already reached zero; that failure is what the
//! policies' `validate` step reports. Counts themselves are kept by `Rc`.

use core::fmt;
use std::rc::{Rc, Weak};

/// Non-owning name for an `Rc` allocation that may already be destroyed.
pub struct Shared<T> {
    weak: Weak<T>,
}

impl<T> Shared<T> {
    /// Name the allocation behind `rc` without retaining it.
    pub fn new(rc: &Rc<T>) -> Self {
        Self {
            weak: Rc::downgrade(rc),
        }
    }

    /// A cell whose strong count is already zero.
    pub fn expired() -> Self {
        Self { weak: Weak::new() }
    }

    /// Take one strong count, or `None` if the referent is gone.
    pub fn retain(&self) -> Option<Rc<T>> {
        self.weak.upgrade()
    }

    /// Give back a count obtained from [`retain`](Self::retain).
    pub fn release(rc: Rc<T>) {
        drop(rc);
    }

    /// Weak linkage to the same allocation; never keeps it alive.
    pub fn weak_of(&self) -> Weak<T> {
        self.weak.clone()
    }

    /// Raw address of the referent, for identity checks only.
    pub fn instance(&self) -> *const T {
        self.weak.as_ptr()
    }

    pub fn is_live(&self) -> bool {
        self.weak.strong_count() > 0
    }

    pub fn strong_count(&self) -> usize {
        self.weak.strong_count()
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            weak: self.weak.clone(),
        }
    }
}

impl<T> From<&Rc<T>> for Shared<T> {
    fn from(rc: &Rc<T>) -> Self {
        Self::new(rc)
    }
}

impl<T> From<Weak<T>> for Shared<T> {
    fn from(weak: Weak<T>) -> Self {
        Self { weak }
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("instance", &self.instance())
            .field("strong", &self.strong_count())
            .finish()
    }
}
