//! policy-ordmap: ordered maps and sets generic over how their keys and
//! values are owned, with stable, generation-checked entry cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: write the ordered-container logic once and let small policy
//!   types decide what "store", "hand back" and "destroy" mean for each
//!   key or value slot.
//! - Layers:
//!   - TreeIndex<K, V, C>: structural ordered engine. Entries live in a
//!     generational slot map; a comparator-sorted index of slot keys gives
//!     the order. Supplies insert/remove/search, ceiling/floor/higher/lower,
//!     first/last and successor/predecessor over stable `Node` handles.
//!   - Policy: `validate`/`store`/`retrieve`/`destroy` for one slot.
//!     `Inline`, `Borrowed`, `OwnedCopy`, `StrongRef`, `WeakRef` (and
//!     `Unit` for sets).
//!   - OrderedMap<K, V, C> / OrderedSet<K, C>: argument validation, policy
//!     calls around exactly one engine operation, and translation of the
//!     engine's outcome into `Error`.
//!
//! Ownership pairing
//! - Every successful `store` is matched by exactly one `destroy`: on
//!   `remove`, `remove_entry`, value replacement, `clear`, `invalidate`, or
//!   when the container is dropped. Rejected inserts destroy whatever they
//!   stored before returning, so failures leak nothing.
//! - The engine unlinks an entry before handing its items back; policy
//!   `destroy` (which may run arbitrary `Drop` code) never observes a
//!   half-updated structure.
//!
//! Cursors
//! - `Entry`/`SetEntry` are `Copy` handles: owner id plus generational
//!   node key. They survive unrelated inserts and removals. Once their own
//!   entry is removed they resolve to `Error::EntryIsInvalid`, never to a
//!   different entry that reused the slot.
//!
//! Errors
//! - Every fallible call returns `Result<_, Error>`; there is no global
//!   error slot. A failed call leaves the container as it was.
//!
//! Threading
//! - Single-writer. Containers are `!Send`/`!Sync` (the reentrancy check
//!   carries a raw-pointer marker); reference policies build on `Rc`.
//!
//! Reentrancy
//! - The comparator is the only user code the engine runs mid-operation.
//!   A debug-only guard panics if it re-enters the same engine.

mod boxed;
pub mod cell;
pub mod compare;
mod config;
mod error;
pub mod ordered_map;
pub mod ordered_set;
pub mod policy;
mod reentrancy;
pub mod tree_index;
mod tree_index_proptest;

// Public surface
pub use boxed::Boxed;
pub use cell::Shared;
pub use compare::{BoxedOrder, ByAddress, Compare, Natural};
pub use config::Config;
pub use error::{Error, Result};
pub use ordered_map::{Entry, OrderedMap};
pub use ordered_set::{OrderedSet, SetEntry};
pub use policy::{Borrowed, Inline, OwnedCopy, Policy, PolicyError, StrongRef, Unit, WeakRef};
