//! Debug-only reentrancy check for the tree engine.
//!
//! The engine calls into user code (the comparator) while its ordering
//! index is being searched or shifted. A comparator that reaches back into
//! the same engine would observe a half-updated index, so in debug builds
//! every guarded entry point records which operation is running and a
//! nested entry panics naming both operations. Release builds compile the
//! check away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-engine tracker. Guard entry points with
/// `let _g = self.reentrancy.enter("insert");`.
#[derive(Debug)]
pub struct ReentrancyCheck {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // The engine is single-writer; keep the tracker !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl ReentrancyCheck {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    ///
    /// Panics in debug builds if another guarded operation is still running.
    #[inline]
    pub fn enter(&self, op: &'static str) -> OpGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call into tree index: `{op}` entered while `{outer}` is running");
            }
            self.active.set(Some(op));
            OpGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            OpGuard { _z: PhantomData }
        }
    }

    /// Name of the operation currently holding the guard (debug builds only).
    #[cfg(debug_assertions)]
    pub fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for ReentrancyCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`ReentrancyCheck::enter`].
pub struct OpGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
