//! OrderedSet: the key-only specialization of [`OrderedMap`].
//!
//! A set is a map whose value slot is held under [`Unit`]; an entry's
//! "value" is its item. Errors carry set names (`ItemNotFound`,
//! `SetIsEmpty`, `ItemIsInvalid`) instead of the map ones.

use core::fmt;

use crate::compare::{Compare, Natural};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ordered_map::{self, Entry, OrderedMap};
use crate::policy::{Policy, Unit};

/// Cursor addressing one item of an [`OrderedSet`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SetEntry(Entry);

impl SetEntry {
    /// The item, passed through the policy's `retrieve`. Fails with
    /// `EntryIsInvalid` if the item was removed or belongs to another set.
    pub fn item<K, C>(&self, set: &OrderedSet<K, C>) -> Result<K::Output>
    where
        K: Policy,
        C: Compare<K::Stored>,
    {
        set.entry_item(*self)
    }

    /// Borrow the stored item without running `retrieve`.
    pub fn item_ref<'s, K, C>(&self, set: &'s OrderedSet<K, C>) -> Result<&'s K::Stored>
    where
        K: Policy,
        C: Compare<K::Stored>,
    {
        set.entry_item_ref(*self)
    }

    /// Cursor to the next item, or `EndOfSequence` at the last one.
    pub fn next<K, C>(&self, set: &OrderedSet<K, C>) -> Result<SetEntry>
    where
        K: Policy,
        C: Compare<K::Stored>,
    {
        set.next_entry(*self)
    }

    /// Cursor to the previous item, or `EndOfSequence` at the first one.
    pub fn prev<K, C>(&self, set: &OrderedSet<K, C>) -> Result<SetEntry>
    where
        K: Policy,
        C: Compare<K::Stored>,
    {
        set.prev_entry(*self)
    }

    /// Remove the item; this cursor is invalid afterwards.
    pub fn remove<K, C>(self, set: &mut OrderedSet<K, C>) -> Result<()>
    where
        K: Policy,
        C: Compare<K::Stored>,
    {
        set.remove_entry(self)
    }
}

pub struct OrderedSet<K: Policy, C = Natural> {
    map: OrderedMap<K, Unit, C>,
}

impl<K> OrderedSet<K>
where
    K: Policy,
    K::Stored: Ord,
{
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K> Default for OrderedSet<K>
where
    K: Policy,
    K::Stored: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over `(SetEntry, &item)`.
pub struct Iter<'a, K: Policy> {
    inner: ordered_map::Iter<'a, K, Unit>,
}

impl<'a, K: Policy> Iterator for Iter<'a, K> {
    type Item = (SetEntry, &'a K::Stored);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(e, k, _)| (SetEntry(e), k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Policy> DoubleEndedIterator for Iter<'_, K> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(e, k, _)| (SetEntry(e), k))
    }
}

impl<K: Policy> ExactSizeIterator for Iter<'_, K> {}

impl<K, C> OrderedSet<K, C>
where
    K: Policy,
    C: Compare<K::Stored>,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, Config::default())
    }

    pub fn with_config(comparator: C, config: Config) -> Self {
        Self {
            map: OrderedMap::with_config(comparator, config),
        }
    }

    pub fn count(&self) -> usize {
        self.map.count()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, item: &K::Stored) -> bool {
        self.map.contains(item)
    }

    pub fn add(&mut self, item: &K::Input) -> Result<SetEntry> {
        self.map
            .add(item, &())
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn remove(&mut self, item: &K::Stored) -> Result<()> {
        self.map.remove(item).map_err(Error::into_set_error)
    }

    /// The stored item equal to `item`, passed through the policy's `retrieve`.
    pub fn get(&self, item: &K::Stored) -> Result<K::Output> {
        self.get_entry(item).and_then(|e| self.entry_item(e))
    }

    pub fn ceiling(&self, item: &K::Stored) -> Result<K::Output> {
        self.ceiling_entry(item).and_then(|e| self.entry_item(e))
    }

    pub fn floor(&self, item: &K::Stored) -> Result<K::Output> {
        self.floor_entry(item).and_then(|e| self.entry_item(e))
    }

    pub fn higher(&self, item: &K::Stored) -> Result<K::Output> {
        self.higher_entry(item).and_then(|e| self.entry_item(e))
    }

    pub fn lower(&self, item: &K::Stored) -> Result<K::Output> {
        self.lower_entry(item).and_then(|e| self.entry_item(e))
    }

    pub fn first(&self) -> Result<K::Output> {
        self.first_entry().and_then(|e| self.entry_item(e))
    }

    pub fn last(&self) -> Result<K::Output> {
        self.last_entry().and_then(|e| self.entry_item(e))
    }

    pub fn get_entry(&self, item: &K::Stored) -> Result<SetEntry> {
        self.map
            .get_entry(item)
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn ceiling_entry(&self, item: &K::Stored) -> Result<SetEntry> {
        self.map
            .ceiling_entry(item)
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn floor_entry(&self, item: &K::Stored) -> Result<SetEntry> {
        self.map
            .floor_entry(item)
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn higher_entry(&self, item: &K::Stored) -> Result<SetEntry> {
        self.map
            .higher_entry(item)
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn lower_entry(&self, item: &K::Stored) -> Result<SetEntry> {
        self.map
            .lower_entry(item)
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn first_entry(&self) -> Result<SetEntry> {
        self.map
            .first_entry()
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn last_entry(&self) -> Result<SetEntry> {
        self.map
            .last_entry()
            .map(SetEntry)
            .map_err(Error::into_set_error)
    }

    pub fn next_entry(&self, entry: SetEntry) -> Result<SetEntry> {
        self.map.next_entry(entry.0).map(SetEntry)
    }

    pub fn prev_entry(&self, entry: SetEntry) -> Result<SetEntry> {
        self.map.prev_entry(entry.0).map(SetEntry)
    }

    pub fn entry_item(&self, entry: SetEntry) -> Result<K::Output> {
        self.map.entry_key(entry.0).map_err(Error::into_set_error)
    }

    pub fn entry_item_ref(&self, entry: SetEntry) -> Result<&K::Stored> {
        self.map.entry_key_ref(entry.0)
    }

    pub fn remove_entry(&mut self, entry: SetEntry) -> Result<()> {
        self.map.remove_entry(entry.0)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Tear the set down, destroying every item through its policy.
    pub fn invalidate(self) {
        self.map.invalidate();
    }
}

impl<K: Policy, C> OrderedSet<K, C> {
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.map.iter(),
        }
    }
}

impl<K, C> fmt::Debug for OrderedSet<K, C>
where
    K: Policy,
    K::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|(_, k)| k)).finish()
    }
}
