//! Ownership policies for keys and values.
//!
//! A policy decides how an item handed to a container is held. It is a
//! zero-sized marker type; the container is generic over one policy per
//! slot and never looks inside the stored representation except through
//! the comparator.
//!
//! | Policy | store | destroy |
//! |---|---|---|
//! | [`Inline<T>`] | copy the value | no-op |
//! | [`Borrowed<'a, T>`] | copy the reference | no-op |
//! | [`OwnedCopy<B>`] | deep copy | [`Boxed::invalidate`] |
//! | [`StrongRef<T>`] | retain, fails on an expired cell | release |
//! | [`WeakRef<T>`] | record the weak linkage | drop the linkage |

use core::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::boxed::Boxed;
use crate::cell::Shared;

/// Why a policy refused to produce a stored or retrieved item.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("input failed validation")]
    Invalid,
    #[error("allocation failed")]
    AllocFailed,
}

/// Storage discipline for one container slot (key or value).
///
/// Every successful [`store`](Policy::store) is paired with exactly one
/// [`destroy`](Policy::destroy) by the container, on removal or teardown.
pub trait Policy {
    /// What callers hand in.
    type Input: ?Sized;
    /// What the container holds.
    type Stored;
    /// What callers get back from a lookup.
    type Output;

    /// Whether `input` is currently usable.
    fn validate(input: &Self::Input) -> bool;

    /// Produce the held representation. Rejects inputs that fail `validate`.
    fn store(input: &Self::Input) -> Result<Self::Stored, PolicyError>;

    /// Hand a result back to a caller. For owning policies the result is an
    /// independent copy or reference the caller now owns.
    fn retrieve(stored: &Self::Stored) -> Result<Self::Output, PolicyError>;

    /// Run `f` on the stored form of `input` without storing it, so a
    /// container can compare an input against its keys before `store`.
    /// Anything acquired for the view is released before returning.
    fn with_view<R>(input: &Self::Input, f: impl FnOnce(&Self::Stored) -> R) -> Result<R, PolicyError>;

    fn destroy(stored: Self::Stored) {
        drop(stored);
    }
}

/// Plain `Copy` value held inline.
pub struct Inline<T>(PhantomData<fn() -> T>);

impl<T: Copy> Policy for Inline<T> {
    type Input = T;
    type Stored = T;
    type Output = T;

    #[inline]
    fn validate(_input: &T) -> bool {
        true
    }

    #[inline]
    fn store(input: &T) -> Result<T, PolicyError> {
        Ok(*input)
    }

    #[inline]
    fn retrieve(stored: &T) -> Result<T, PolicyError> {
        Ok(*stored)
    }

    #[inline]
    fn with_view<R>(input: &T, f: impl FnOnce(&T) -> R) -> Result<R, PolicyError> {
        Ok(f(input))
    }
}

/// Non-owning reference; the pointee's lifetime is the caller's business.
pub struct Borrowed<'a, T: ?Sized>(PhantomData<&'a T>);

impl<'a, T: ?Sized> Policy for Borrowed<'a, T> {
    type Input = &'a T;
    type Stored = &'a T;
    type Output = &'a T;

    #[inline]
    fn validate(_input: &&'a T) -> bool {
        true
    }

    #[inline]
    fn store(input: &&'a T) -> Result<&'a T, PolicyError> {
        Ok(*input)
    }

    #[inline]
    fn retrieve(stored: &&'a T) -> Result<&'a T, PolicyError> {
        Ok(*stored)
    }

    #[inline]
    fn with_view<R>(input: &&'a T, f: impl FnOnce(&&'a T) -> R) -> Result<R, PolicyError> {
        Ok(f(input))
    }
}

/// Deep copy of a boxed value, owned by the container.
pub struct OwnedCopy<B>(PhantomData<fn() -> B>);

impl<B: Boxed> Policy for OwnedCopy<B> {
    type Input = B;
    type Stored = B;
    type Output = B;

    #[inline]
    fn validate(_input: &B) -> bool {
        true
    }

    fn store(input: &B) -> Result<B, PolicyError> {
        B::init_with_copy(input).map_err(|_| PolicyError::AllocFailed)
    }

    fn retrieve(stored: &B) -> Result<B, PolicyError> {
        B::init_with_copy(stored).map_err(|_| PolicyError::AllocFailed)
    }

    /// The input already has the stored representation; no copy is made.
    #[inline]
    fn with_view<R>(input: &B, f: impl FnOnce(&B) -> R) -> Result<R, PolicyError> {
        Ok(f(input))
    }

    fn destroy(stored: B) {
        stored.invalidate();
    }
}

/// One strong count on a shared referent, held for as long as the entry lives.
pub struct StrongRef<T>(PhantomData<fn() -> T>);

impl<T> Policy for StrongRef<T> {
    type Input = Shared<T>;
    type Stored = Rc<T>;
    type Output = Rc<T>;

    #[inline]
    fn validate(input: &Shared<T>) -> bool {
        input.is_live()
    }

    fn store(input: &Shared<T>) -> Result<Rc<T>, PolicyError> {
        input.retain().ok_or(PolicyError::Invalid)
    }

    fn retrieve(stored: &Rc<T>) -> Result<Rc<T>, PolicyError> {
        Ok(Rc::clone(stored))
    }

    /// Borrows a strong count for the duration of `f`.
    fn with_view<R>(input: &Shared<T>, f: impl FnOnce(&Rc<T>) -> R) -> Result<R, PolicyError> {
        let rc = input.retain().ok_or(PolicyError::Invalid)?;
        let out = f(&rc);
        Shared::release(rc);
        Ok(out)
    }

    fn destroy(stored: Rc<T>) {
        Shared::release(stored);
    }
}

/// Weak linkage; the container never keeps the referent alive.
pub struct WeakRef<T>(PhantomData<fn() -> T>);

impl<T> Policy for WeakRef<T> {
    type Input = Shared<T>;
    type Stored = Weak<T>;
    type Output = Weak<T>;

    #[inline]
    fn validate(input: &Shared<T>) -> bool {
        input.is_live()
    }

    fn store(input: &Shared<T>) -> Result<Weak<T>, PolicyError> {
        if !Self::validate(input) {
            return Err(PolicyError::Invalid);
        }
        Ok(input.weak_of())
    }

    fn retrieve(stored: &Weak<T>) -> Result<Weak<T>, PolicyError> {
        Ok(Weak::clone(stored))
    }

    fn with_view<R>(input: &Shared<T>, f: impl FnOnce(&Weak<T>) -> R) -> Result<R, PolicyError> {
        if !Self::validate(input) {
            return Err(PolicyError::Invalid);
        }
        Ok(f(&input.weak_of()))
    }
}

/// The absent value of a set entry.
pub struct Unit;

impl Policy for Unit {
    type Input = ();
    type Stored = ();
    type Output = ();

    #[inline]
    fn validate(_input: &()) -> bool {
        true
    }

    #[inline]
    fn store(_input: &()) -> Result<(), PolicyError> {
        Ok(())
    }

    #[inline]
    fn retrieve(_stored: &()) -> Result<(), PolicyError> {
        Ok(())
    }

    #[inline]
    fn with_view<R>(_input: &(), f: impl FnOnce(&()) -> R) -> Result<R, PolicyError> {
        Ok(f(&()))
    }
}
