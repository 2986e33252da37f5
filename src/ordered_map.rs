//! OrderedMap: policy-driven ordered map with generational entry cursors.
//!
//! The map owns no tree algorithm. Every call validates its inputs with the
//! bound policies, runs `store`/`retrieve`/`destroy` around a single
//! [`TreeIndex`] operation, and translates the engine's outcome into
//! [`Error`]. A failing call leaves the map exactly as it found it.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::{debug, trace};

use crate::compare::{Compare, Natural};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::policy::{Policy, PolicyError};
use crate::tree_index::{self, InsertError, Node, TreeIndex};

/// Identity of one container instance, so a cursor can't be replayed
/// against a container that didn't mint it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct MapId(u64);

impl MapId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MapId(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Cursor addressing one entry of an [`OrderedMap`].
///
/// Cursors are plain copies; they borrow nothing. A cursor stays valid
/// across unrelated inserts and removals and turns into
/// [`Error::EntryIsInvalid`] once its own entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Entry {
    owner: MapId,
    node: Node,
}

impl Entry {
    /// The key, passed through the key policy's `retrieve`. Fails with
    /// `EntryIsInvalid` if the entry was removed or belongs to another map.
    pub fn key<K, V, C>(&self, map: &OrderedMap<K, V, C>) -> Result<K::Output>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.entry_key(*self)
    }

    /// Borrow the stored key without running `retrieve`.
    pub fn key_ref<'m, K, V, C>(&self, map: &'m OrderedMap<K, V, C>) -> Result<&'m K::Stored>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.entry_key_ref(*self)
    }

    /// The value, passed through the value policy's `retrieve`.
    pub fn value<K, V, C>(&self, map: &OrderedMap<K, V, C>) -> Result<V::Output>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.entry_value(*self)
    }

    /// Borrow the stored value without running `retrieve`.
    pub fn value_ref<'m, K, V, C>(&self, map: &'m OrderedMap<K, V, C>) -> Result<&'m V::Stored>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.entry_value_ref(*self)
    }

    /// Replace the value in place; the old one is destroyed through its policy.
    pub fn set_value<K, V, C>(&self, map: &mut OrderedMap<K, V, C>, value: &V::Input) -> Result<()>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.set_entry_value(*self, value)
    }

    /// Cursor to the next entry in key order, or `EndOfSequence` at the last one.
    pub fn next<K, V, C>(&self, map: &OrderedMap<K, V, C>) -> Result<Entry>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.next_entry(*self)
    }

    /// Cursor to the previous entry in key order, or `EndOfSequence` at the first one.
    pub fn prev<K, V, C>(&self, map: &OrderedMap<K, V, C>) -> Result<Entry>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.prev_entry(*self)
    }

    /// Remove the addressed entry; this cursor is invalid afterwards.
    pub fn remove<K, V, C>(self, map: &mut OrderedMap<K, V, C>) -> Result<()>
    where
        K: Policy,
        V: Policy,
        C: Compare<K::Stored>,
    {
        map.remove_entry(self)
    }
}

fn key_error(e: PolicyError) -> Error {
    match e {
        PolicyError::Invalid => Error::KeyIsInvalid,
        PolicyError::AllocFailed => Error::MemoryAllocationFailed,
    }
}

fn value_error(e: PolicyError) -> Error {
    match e {
        PolicyError::Invalid => Error::ValueIsInvalid,
        PolicyError::AllocFailed => Error::MemoryAllocationFailed,
    }
}

/// Ordered map whose keys are held under policy `K` and values under `V`.
pub struct OrderedMap<K: Policy, V: Policy, C = Natural> {
    tree: TreeIndex<K::Stored, V::Stored, C>,
    id: MapId,
}

impl<K, V> OrderedMap<K, V>
where
    K: Policy,
    V: Policy,
    K::Stored: Ord,
{
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Policy,
    V: Policy,
    K::Stored: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over `(Entry, &key, &value)`.
pub struct Iter<'a, K: Policy, V: Policy> {
    inner: tree_index::Iter<'a, K::Stored, V::Stored>,
    owner: MapId,
}

impl<'a, K: Policy, V: Policy> Iterator for Iter<'a, K, V> {
    type Item = (Entry, &'a K::Stored, &'a V::Stored);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let owner = self.owner;
        self.inner
            .next()
            .map(|(node, k, v)| (Entry { owner, node }, k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Policy, V: Policy> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let owner = self.owner;
        self.inner
            .next_back()
            .map(|(node, k, v)| (Entry { owner, node }, k, v))
    }
}

impl<K: Policy, V: Policy> ExactSizeIterator for Iter<'_, K, V> {}

// Nothing here calls the comparator, so `Drop` and `Debug` can use it.
impl<K: Policy, V: Policy, C> OrderedMap<K, V, C> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
            owner: self.id,
        }
    }

    /// Destroy every entry in key order: key via `K`, value via `destroy_value`.
    fn teardown<F>(&mut self, mut destroy_value: F) -> usize
    where
        F: FnMut(V::Stored),
    {
        let mut destroyed = 0;
        for (k, v) in self.tree.drain() {
            K::destroy(k);
            destroy_value(v);
            destroyed += 1;
        }
        destroyed
    }
}

impl<K: Policy, V: Policy, C> Drop for OrderedMap<K, V, C> {
    fn drop(&mut self) {
        self.teardown(V::destroy);
    }
}

impl<K, V, C> OrderedMap<K, V, C>
where
    K: Policy,
    V: Policy,
    C: Compare<K::Stored>,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, Config::default())
    }

    pub fn with_config(comparator: C, config: Config) -> Self {
        Self {
            tree: TreeIndex::with_config(comparator, config),
            id: MapId::next(),
        }
    }

    fn entry(&self, node: Node) -> Entry {
        Entry {
            owner: self.id,
            node,
        }
    }

    /// Map a caller's cursor back to a live node of this map.
    fn resolve(&self, entry: Entry) -> Result<Node> {
        if entry.owner != self.id || !self.tree.contains_node(entry.node) {
            debug!(foreign = (entry.owner != self.id), "stale or foreign entry cursor");
            return Err(Error::EntryIsInvalid);
        }
        Ok(entry.node)
    }

    fn find(&self, key: &K::Stored) -> Result<Node> {
        self.tree.search(key).ok_or(Error::KeyNotFound)
    }

    fn stored_key(&self, node: Node) -> Result<&K::Stored> {
        self.tree.node_key(node).ok_or(Error::EntryIsInvalid)
    }

    fn stored_value(&self, node: Node) -> Result<&V::Stored> {
        self.tree.node_value(node).ok_or(Error::EntryIsInvalid)
    }

    fn retrieve_value(&self, node: Node) -> Result<V::Output> {
        V::retrieve(self.stored_value(node)?).map_err(value_error)
    }

    fn retrieve_key(&self, node: Node) -> Result<K::Output> {
        K::retrieve(self.stored_key(node)?).map_err(key_error)
    }

    /// Unlink `node`, then destroy its key and value.
    fn destroy_node(&mut self, node: Node) -> Result<()> {
        let (k, v) = self.tree.remove(node).ok_or(Error::EntryIsInvalid)?;
        K::destroy(k);
        V::destroy(v);
        trace!(len = self.tree.len(), "removed entry");
        Ok(())
    }

    /// Store `value` and swap it in for `node`'s current value.
    fn replace_value(&mut self, node: Node, value: &V::Input) -> Result<()> {
        if !V::validate(value) {
            debug!("value rejected by policy");
            return Err(Error::ValueIsInvalid);
        }
        let fresh = V::store(value).map_err(value_error)?;
        match self.tree.node_value_mut(node) {
            Some(slot) => {
                let old = core::mem::replace(slot, fresh);
                V::destroy(old);
                trace!("replaced value");
                Ok(())
            }
            None => {
                V::destroy(fresh);
                Err(Error::EntryIsInvalid)
            }
        }
    }

    pub fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.tree.len()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains(&self, key: &K::Stored) -> bool {
        self.tree.search(key).is_some()
    }

    /// Insert a new entry.
    ///
    /// Both inputs are validated and the key is looked up before anything
    /// is stored, so a duplicate costs no copy or retain. If the engine
    /// cannot make room, whatever was stored for this call is destroyed
    /// again before the error is returned.
    pub fn add(&mut self, key: &K::Input, value: &V::Input) -> Result<Entry> {
        if !K::validate(key) {
            debug!("key rejected by policy");
            return Err(Error::KeyIsInvalid);
        }
        if !V::validate(value) {
            debug!("value rejected by policy");
            return Err(Error::ValueIsInvalid);
        }
        let exists = K::with_view(key, |k| self.tree.search(k).is_some()).map_err(key_error)?;
        if exists {
            debug!("key already present");
            return Err(Error::KeyAlreadyExists);
        }
        let k = K::store(key).map_err(key_error)?;
        let v = match V::store(value) {
            Ok(v) => v,
            Err(e) => {
                K::destroy(k);
                return Err(value_error(e));
            }
        };
        match self.tree.insert(k, v) {
            Ok(node) => {
                trace!(len = self.tree.len(), "added entry");
                Ok(self.entry(node))
            }
            Err(e) => {
                let err = match e {
                    InsertError::DuplicateKey(..) => Error::KeyAlreadyExists,
                    InsertError::AllocFailed(..) => Error::MemoryAllocationFailed,
                };
                let (k, v) = e.into_parts();
                K::destroy(k);
                V::destroy(v);
                debug!(%err, "insert rolled back");
                Err(err)
            }
        }
    }

    pub fn remove(&mut self, key: &K::Stored) -> Result<()> {
        let node = self.find(key)?;
        self.destroy_node(node)
    }

    /// Replace the value stored under an existing key. The key is untouched.
    pub fn set(&mut self, key: &K::Stored, value: &V::Input) -> Result<()> {
        let node = self.find(key)?;
        self.replace_value(node, value)
    }

    pub fn get(&self, key: &K::Stored) -> Result<V::Output> {
        let node = self.find(key)?;
        self.retrieve_value(node)
    }

    /// Borrow the stored value without running the policy's `retrieve`.
    pub fn get_ref(&self, key: &K::Stored) -> Result<&V::Stored> {
        let node = self.find(key)?;
        self.stored_value(node)
    }

    pub fn ceiling(&self, key: &K::Stored) -> Result<V::Output> {
        self.retrieve_value(self.ceiling_entry(key)?.node)
    }

    pub fn floor(&self, key: &K::Stored) -> Result<V::Output> {
        self.retrieve_value(self.floor_entry(key)?.node)
    }

    pub fn higher(&self, key: &K::Stored) -> Result<V::Output> {
        self.retrieve_value(self.higher_entry(key)?.node)
    }

    pub fn lower(&self, key: &K::Stored) -> Result<V::Output> {
        self.retrieve_value(self.lower_entry(key)?.node)
    }

    pub fn first(&self) -> Result<V::Output> {
        self.retrieve_value(self.first_entry()?.node)
    }

    pub fn last(&self) -> Result<V::Output> {
        self.retrieve_value(self.last_entry()?.node)
    }

    pub fn get_entry(&self, key: &K::Stored) -> Result<Entry> {
        self.find(key).map(|n| self.entry(n))
    }

    /// Entry with the smallest key `>= key`.
    pub fn ceiling_entry(&self, key: &K::Stored) -> Result<Entry> {
        self.tree
            .ceiling(key)
            .map(|n| self.entry(n))
            .ok_or(Error::KeyNotFound)
    }

    /// Entry with the largest key `<= key`.
    pub fn floor_entry(&self, key: &K::Stored) -> Result<Entry> {
        self.tree
            .floor(key)
            .map(|n| self.entry(n))
            .ok_or(Error::KeyNotFound)
    }

    /// Entry with the smallest key `> key`.
    pub fn higher_entry(&self, key: &K::Stored) -> Result<Entry> {
        self.tree
            .higher(key)
            .map(|n| self.entry(n))
            .ok_or(Error::KeyNotFound)
    }

    /// Entry with the largest key `< key`.
    pub fn lower_entry(&self, key: &K::Stored) -> Result<Entry> {
        self.tree
            .lower(key)
            .map(|n| self.entry(n))
            .ok_or(Error::KeyNotFound)
    }

    pub fn first_entry(&self) -> Result<Entry> {
        self.tree
            .first()
            .map(|n| self.entry(n))
            .ok_or(Error::MapIsEmpty)
    }

    pub fn last_entry(&self) -> Result<Entry> {
        self.tree
            .last()
            .map(|n| self.entry(n))
            .ok_or(Error::MapIsEmpty)
    }

    /// Cursor to the in-order successor. `entry` itself is unaffected.
    pub fn next_entry(&self, entry: Entry) -> Result<Entry> {
        let node = self.resolve(entry)?;
        self.tree
            .successor(node)
            .map(|n| self.entry(n))
            .ok_or(Error::EndOfSequence)
    }

    /// Cursor to the in-order predecessor. `entry` itself is unaffected.
    pub fn prev_entry(&self, entry: Entry) -> Result<Entry> {
        let node = self.resolve(entry)?;
        self.tree
            .predecessor(node)
            .map(|n| self.entry(n))
            .ok_or(Error::EndOfSequence)
    }

    pub fn entry_key(&self, entry: Entry) -> Result<K::Output> {
        let node = self.resolve(entry)?;
        self.retrieve_key(node)
    }

    pub fn entry_key_ref(&self, entry: Entry) -> Result<&K::Stored> {
        let node = self.resolve(entry)?;
        self.stored_key(node)
    }

    pub fn entry_value(&self, entry: Entry) -> Result<V::Output> {
        let node = self.resolve(entry)?;
        self.retrieve_value(node)
    }

    pub fn entry_value_ref(&self, entry: Entry) -> Result<&V::Stored> {
        let node = self.resolve(entry)?;
        self.stored_value(node)
    }

    pub fn set_entry_value(&mut self, entry: Entry, value: &V::Input) -> Result<()> {
        let node = self.resolve(entry)?;
        self.replace_value(node, value)
    }

    /// Remove the entry under `entry`; the cursor is invalid afterwards.
    pub fn remove_entry(&mut self, entry: Entry) -> Result<()> {
        let node = self.resolve(entry)?;
        self.destroy_node(node)
    }

    /// Destroy every entry through the policies, keeping the map usable.
    pub fn clear(&mut self) {
        let destroyed = self.teardown(V::destroy);
        trace!(destroyed, "map cleared");
    }

    /// Tear the map down, destroying keys and values through their policies.
    pub fn invalidate(mut self) {
        let destroyed = self.teardown(V::destroy);
        trace!(destroyed, "map invalidated");
    }

    /// Tear the map down, handing each stored value to `destroy_value`
    /// instead of the value policy. Keys still go through `K::destroy`.
    pub fn invalidate_with<F>(mut self, destroy_value: F)
    where
        F: FnMut(V::Stored),
    {
        let destroyed = self.teardown(destroy_value);
        trace!(destroyed, "map invalidated with custom value destructor");
    }
}

impl<K, V, C> fmt::Debug for OrderedMap<K, V, C>
where
    K: Policy,
    V: Policy,
    K::Stored: fmt::Debug,
    V::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(_, k, v)| (k, v)))
            .finish()
    }
}
