//! TreeIndex: ordered structural layer with stable node handles.
//!
//! Entries live in a generational `SlotMap` and are linked into an AVL tree
//! ordered by the comparator. Rebalancing only rewrites links, never moves
//! an entry, so a [`Node`] stays valid until its own entry is removed, and a
//! removed node's handle never resolves again even if the slot is reused.
//!
//! Insert, remove, search and the neighbour queries descend the tree once;
//! stepping to a neighbour follows parent links.

use crate::compare::{Compare, Natural};
use crate::config::Config;
use crate::reentrancy::ReentrancyCheck;
use core::cmp::Ordering;
use slotmap::{DefaultKey, SlotMap};

/// Generational handle to one entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Node(DefaultKey);

impl Node {
    pub fn key<'a, K, V, C>(&self, tree: &'a TreeIndex<K, V, C>) -> Option<&'a K> {
        tree.node_key(*self)
    }

    pub fn value<'a, K, V, C>(&self, tree: &'a TreeIndex<K, V, C>) -> Option<&'a V> {
        tree.node_value(*self)
    }

    pub fn value_mut<'a, K, V, C>(&self, tree: &'a mut TreeIndex<K, V, C>) -> Option<&'a mut V> {
        tree.node_value_mut(*self)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Link {
    parent: Option<DefaultKey>,
    left: Option<DefaultKey>,
    right: Option<DefaultKey>,
    height: u8,
}

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    link: Link,
}

type Slots<K, V> = SlotMap<DefaultKey, Slot<K, V>>;

fn leftmost<K, V>(slots: &Slots<K, V>, mut n: DefaultKey) -> DefaultKey {
    while let Some(l) = slots[n].link.left {
        n = l;
    }
    n
}

fn rightmost<K, V>(slots: &Slots<K, V>, mut n: DefaultKey) -> DefaultKey {
    while let Some(r) = slots[n].link.right {
        n = r;
    }
    n
}

fn next_slot<K, V>(slots: &Slots<K, V>, n: DefaultKey) -> Option<DefaultKey> {
    if let Some(r) = slots[n].link.right {
        return Some(leftmost(slots, r));
    }
    let mut cur = n;
    let mut up = slots[n].link.parent;
    while let Some(p) = up {
        if slots[p].link.left == Some(cur) {
            return Some(p);
        }
        cur = p;
        up = slots[p].link.parent;
    }
    None
}

fn prev_slot<K, V>(slots: &Slots<K, V>, n: DefaultKey) -> Option<DefaultKey> {
    if let Some(l) = slots[n].link.left {
        return Some(rightmost(slots, l));
    }
    let mut cur = n;
    let mut up = slots[n].link.parent;
    while let Some(p) = up {
        if slots[p].link.right == Some(cur) {
            return Some(p);
        }
        cur = p;
        up = slots[p].link.parent;
    }
    None
}

/// Rejected insert. The items are handed back so the caller can dispose of them.
#[derive(Debug)]
pub enum InsertError<K, V> {
    DuplicateKey(K, V),
    AllocFailed(K, V),
}

impl<K, V> InsertError<K, V> {
    pub fn into_parts(self) -> (K, V) {
        match self {
            InsertError::DuplicateKey(k, v) | InsertError::AllocFailed(k, v) => (k, v),
        }
    }
}

/// `SlotMap` panics once it would need more than `u32::MAX - 1` slots; the
/// engine reports that point as an allocation failure instead.
const SLOT_LIMIT: usize = (u32::MAX - 1) as usize;

pub struct TreeIndex<K, V, C = Natural> {
    comparator: C,
    root: Option<DefaultKey>,
    slots: Slots<K, V>,
    config: Config,
    reentrancy: ReentrancyCheck,
}

impl<K: Ord, V> TreeIndex<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K: Ord, V> Default for TreeIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over `(Node, &K, &V)`.
pub struct Iter<'a, K, V> {
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
    slots: &'a Slots<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Node, &'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        self.remaining -= 1;
        self.front = next_slot(self.slots, k);
        let slot = &self.slots[k];
        Some((Node(k), &slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        self.remaining -= 1;
        self.back = prev_slot(self.slots, k);
        let slot = &self.slots[k];
        Some((Node(k), &slot.key, &slot.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Draining iterator returned by [`TreeIndex::drain`]. Entries not yet
/// yielded are dropped with the iterator.
pub struct Drain<'a, K, V> {
    order: std::vec::IntoIter<DefaultKey>,
    slots: &'a mut Slots<K, V>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.order.next()?;
        self.slots.remove(k).map(|s| (s.key, s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        for k in self.order.by_ref() {
            self.slots.remove(k);
        }
    }
}

// Structural helpers never call the comparator, so they live in the
// unbounded impl next to `Drop`-safe operations.
impl<K, V, C> TreeIndex<K, V, C> {
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn first(&self) -> Option<Node> {
        self.root.map(|r| Node(leftmost(&self.slots, r)))
    }

    pub fn last(&self) -> Option<Node> {
        self.root.map(|r| Node(rightmost(&self.slots, r)))
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.slots.contains_key(node.0)
    }

    pub(crate) fn node_key(&self, node: Node) -> Option<&K> {
        self.slots.get(node.0).map(|s| &s.key)
    }

    pub(crate) fn node_value(&self, node: Node) -> Option<&V> {
        self.slots.get(node.0).map(|s| &s.value)
    }

    pub(crate) fn node_value_mut(&mut self, node: Node) -> Option<&mut V> {
        self.slots.get_mut(node.0).map(|s| &mut s.value)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            front: self.root.map(|r| leftmost(&self.slots, r)),
            back: self.root.map(|r| rightmost(&self.slots, r)),
            remaining: self.slots.len(),
            slots: &self.slots,
        }
    }

    /// Unlink every entry, then hand them out in key order.
    ///
    /// Slots are removed one by one rather than replaced wholesale so their
    /// generations advance and every outstanding `Node` goes stale.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let order: Vec<DefaultKey> = self.iter().map(|(n, _, _)| n.0).collect();
        self.root = None;
        Drain {
            order: order.into_iter(),
            slots: &mut self.slots,
        }
    }

    fn height(&self, n: Option<DefaultKey>) -> u8 {
        n.map_or(0, |k| self.slots[k].link.height)
    }

    fn fix_height(&mut self, n: DefaultKey) {
        let Link { left, right, .. } = self.slots[n].link;
        self.slots[n].link.height = 1 + self.height(left).max(self.height(right));
    }

    /// Point whatever referenced `old` (its parent's child slot, or the
    /// root) at `new`.
    fn replace_child(&mut self, parent: Option<DefaultKey>, old: DefaultKey, new: Option<DefaultKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let link = &mut self.slots[p].link;
                if link.left == Some(old) {
                    link.left = new;
                } else {
                    link.right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: DefaultKey) -> DefaultKey {
        let Some(y) = self.slots[x].link.right else {
            return x;
        };
        let parent = self.slots[x].link.parent;
        let inner = self.slots[y].link.left;

        self.slots[x].link.right = inner;
        if let Some(t) = inner {
            self.slots[t].link.parent = Some(x);
        }
        self.slots[y].link.left = Some(x);
        self.slots[x].link.parent = Some(y);
        self.slots[y].link.parent = parent;
        self.replace_child(parent, x, Some(y));

        self.fix_height(x);
        self.fix_height(y);
        y
    }

    fn rotate_right(&mut self, x: DefaultKey) -> DefaultKey {
        let Some(y) = self.slots[x].link.left else {
            return x;
        };
        let parent = self.slots[x].link.parent;
        let inner = self.slots[y].link.right;

        self.slots[x].link.left = inner;
        if let Some(t) = inner {
            self.slots[t].link.parent = Some(x);
        }
        self.slots[y].link.right = Some(x);
        self.slots[x].link.parent = Some(y);
        self.slots[y].link.parent = parent;
        self.replace_child(parent, x, Some(y));

        self.fix_height(x);
        self.fix_height(y);
        y
    }

    /// Restore the AVL balance at `n`; returns the subtree's new root.
    fn rebalance(&mut self, n: DefaultKey) -> DefaultKey {
        let Link { left, right, .. } = self.slots[n].link;
        let balance = self.height(left) as i16 - self.height(right) as i16;
        if balance > 1 {
            if let Some(l) = left {
                let ll = self.slots[l].link;
                if self.height(ll.left) < self.height(ll.right) {
                    self.rotate_left(l);
                }
            }
            return self.rotate_right(n);
        }
        if balance < -1 {
            if let Some(r) = right {
                let rl = self.slots[r].link;
                if self.height(rl.right) < self.height(rl.left) {
                    self.rotate_right(r);
                }
            }
            return self.rotate_left(n);
        }
        self.fix_height(n);
        n
    }

    /// Rebalance every node from `start` up to the root.
    fn retrace(&mut self, start: Option<DefaultKey>) {
        let mut cur = start;
        while let Some(n) = cur {
            let top = self.rebalance(n);
            cur = self.slots[top].link.parent;
        }
    }

    /// Unlink `n` from the tree without touching its slot.
    fn unlink(&mut self, n: DefaultKey) {
        let Link {
            parent,
            left,
            right,
            height,
        } = self.slots[n].link;
        let from = match (left, right) {
            (Some(l), Some(r)) => {
                // The in-order successor takes `n`'s place; entries never move
                // between slots, so this relinks instead of swapping contents.
                let s = leftmost(&self.slots, r);
                let from = if s == r {
                    s
                } else {
                    let sp = self.slots[s].link.parent.unwrap_or(r);
                    let sr = self.slots[s].link.right;
                    self.slots[sp].link.left = sr;
                    if let Some(x) = sr {
                        self.slots[x].link.parent = Some(sp);
                    }
                    self.slots[s].link.right = Some(r);
                    self.slots[r].link.parent = Some(s);
                    sp
                };
                self.slots[s].link.left = Some(l);
                self.slots[l].link.parent = Some(s);
                self.slots[s].link.parent = parent;
                self.slots[s].link.height = height;
                self.replace_child(parent, n, Some(s));
                Some(from)
            }
            (child, None) | (None, child) => {
                if let Some(c) = child {
                    self.slots[c].link.parent = parent;
                }
                self.replace_child(parent, n, child);
                parent
            }
        };
        self.slots[n].link = Link::default();
        self.retrace(from);
    }
}

impl<K, V, C> TreeIndex<K, V, C>
where
    C: Compare<K>,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, Config::default())
    }

    pub fn with_config(comparator: C, config: Config) -> Self {
        Self {
            comparator,
            root: None,
            slots: SlotMap::with_capacity_and_key(config.capacity),
            config,
            reentrancy: ReentrancyCheck::new(),
        }
    }

    // Unguarded helpers; every caller already holds the reentrancy guard.

    fn find(&self, q: &K) -> Option<DefaultKey> {
        let mut cur = self.root;
        while let Some(n) = cur {
            let link = &self.slots[n].link;
            cur = match self.comparator.compare(&self.slots[n].key, q) {
                Ordering::Equal => return Some(n),
                Ordering::Greater => link.left,
                Ordering::Less => link.right,
            };
        }
        None
    }

    /// Split the tree around `q`: the last node ordered before it and the
    /// first node ordered after it. With `inclusive`, keys equal to `q`
    /// count as before.
    fn bounds(&self, q: &K, inclusive: bool) -> (Option<DefaultKey>, Option<DefaultKey>) {
        let (mut before, mut after) = (None, None);
        let mut cur = self.root;
        while let Some(n) = cur {
            let link = &self.slots[n].link;
            let is_before = match self.comparator.compare(&self.slots[n].key, q) {
                Ordering::Less => true,
                Ordering::Equal => inclusive,
                Ordering::Greater => false,
            };
            if is_before {
                before = Some(n);
                cur = link.right;
            } else {
                after = Some(n);
                cur = link.left;
            }
        }
        (before, after)
    }

    pub fn insert(&mut self, key: K, value: V) -> Result<Node, InsertError<K, V>> {
        let _g = self.reentrancy.enter("insert");
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(n) = cur {
            let link = &self.slots[n].link;
            match self.comparator.compare(&self.slots[n].key, &key) {
                Ordering::Equal => return Err(InsertError::DuplicateKey(key, value)),
                Ordering::Greater => {
                    go_left = true;
                    cur = link.left;
                }
                Ordering::Less => {
                    go_left = false;
                    cur = link.right;
                }
            }
            parent = Some(n);
        }
        let len = self.slots.len();
        if !self.config.admits(len) || len >= SLOT_LIMIT {
            return Err(InsertError::AllocFailed(key, value));
        }

        let k = self.slots.insert(Slot {
            key,
            value,
            link: Link {
                parent,
                left: None,
                right: None,
                height: 1,
            },
        });
        match parent {
            None => self.root = Some(k),
            Some(p) if go_left => self.slots[p].link.left = Some(k),
            Some(p) => self.slots[p].link.right = Some(k),
        }
        drop(_g);
        self.retrace(parent);
        Ok(Node(k))
    }

    /// Unlink and return the node's entry. Stale handles yield `None`.
    pub fn remove(&mut self, node: Node) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("remove");
        if !self.slots.contains_key(node.0) {
            return None;
        }
        // Unlink first so the structure is consistent before the caller
        // drops anything.
        drop(_g);
        self.unlink(node.0);
        self.slots.remove(node.0).map(|s| (s.key, s.value))
    }

    pub fn search(&self, q: &K) -> Option<Node> {
        let _g = self.reentrancy.enter("search");
        self.find(q).map(Node)
    }

    /// Smallest key `>= q`.
    pub fn ceiling(&self, q: &K) -> Option<Node> {
        let _g = self.reentrancy.enter("ceiling");
        self.bounds(q, false).1.map(Node)
    }

    /// Largest key `<= q`.
    pub fn floor(&self, q: &K) -> Option<Node> {
        let _g = self.reentrancy.enter("floor");
        self.bounds(q, true).0.map(Node)
    }

    /// Smallest key `> q`.
    pub fn higher(&self, q: &K) -> Option<Node> {
        let _g = self.reentrancy.enter("higher");
        self.bounds(q, true).1.map(Node)
    }

    /// Largest key `< q`.
    pub fn lower(&self, q: &K) -> Option<Node> {
        let _g = self.reentrancy.enter("lower");
        self.bounds(q, false).0.map(Node)
    }

    /// In-order successor. `None` at the end or for a stale handle;
    /// use [`contains_node`](Self::contains_node) to tell them apart.
    pub fn successor(&self, node: Node) -> Option<Node> {
        let _g = self.reentrancy.enter("successor");
        if !self.slots.contains_key(node.0) {
            return None;
        }
        next_slot(&self.slots, node.0).map(Node)
    }

    pub fn predecessor(&self, node: Node) -> Option<Node> {
        let _g = self.reentrancy.enter("predecessor");
        if !self.slots.contains_key(node.0) {
            return None;
        }
        prev_slot(&self.slots, node.0).map(Node)
    }
}

/// Structural checks shared by the unit and property tests.
#[cfg(test)]
impl<K, V, C: Compare<K>> TreeIndex<K, V, C> {
    /// Height of the tree; 0 when empty.
    pub(crate) fn depth(&self) -> usize {
        self.height(self.root) as usize
    }

    /// Panics unless parent links, heights, the AVL balance and the key
    /// order all hold.
    pub(crate) fn assert_well_formed(&self) {
        fn walk<K, V, C: Compare<K>>(
            t: &TreeIndex<K, V, C>,
            n: Option<DefaultKey>,
            parent: Option<DefaultKey>,
        ) -> (u8, usize) {
            let Some(n) = n else { return (0, 0) };
            let link = t.slots[n].link;
            assert_eq!(link.parent, parent, "parent link");
            let (lh, lc) = walk(t, link.left, Some(n));
            let (rh, rc) = walk(t, link.right, Some(n));
            assert!((lh as i16 - rh as i16).abs() <= 1, "avl balance");
            assert_eq!(link.height, 1 + lh.max(rh), "cached height");
            (link.height, lc + rc + 1)
        }
        let (_, count) = walk(self, self.root, None);
        assert_eq!(count, self.slots.len(), "every slot is linked");
        let keys: Vec<&K> = self.iter().map(|(_, k, _)| k).collect();
        for w in keys.windows(2) {
            assert_eq!(self.comparator.compare(w[0], w[1]), Ordering::Less, "in order");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(keys: &[i32]) -> TreeIndex<i32, String> {
        let mut t = TreeIndex::new();
        for &k in keys {
            t.insert(k, format!("v{k}")).unwrap();
        }
        t
    }

    fn key_of(t: &TreeIndex<i32, String>, n: Option<Node>) -> Option<i32> {
        n.and_then(|n| n.key(t).copied())
    }

    /// Invariant: duplicate keys are rejected, the rejected items come back,
    /// and the tree is unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t: TreeIndex<String, i32> = TreeIndex::new();
        let n = t.insert("dup".to_string(), 1).unwrap();
        match t.insert("dup".to_string(), 2) {
            Err(InsertError::DuplicateKey(k, v)) => {
                assert_eq!(k, "dup");
                assert_eq!(v, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(n.value(&t), Some(&1));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: iteration is in comparator order regardless of insert order.
    #[test]
    fn iteration_is_sorted() {
        let t = filled(&[30, 10, 50, 20, 40]);
        let keys: Vec<i32> = t.iter().map(|(_, k, _)| *k).collect();
        assert_eq!(keys, vec![10, 20, 30, 40, 50]);
        let rev: Vec<i32> = t.iter().rev().map(|(_, k, _)| *k).collect();
        assert_eq!(rev, vec![50, 40, 30, 20, 10]);
        assert_eq!(t.iter().len(), 5);
    }

    /// Invariant: ceiling/floor/higher/lower follow their inclusive/strict definitions.
    #[test]
    fn order_statistic_queries() {
        let t = filled(&[10, 20, 30]);
        assert_eq!(key_of(&t, t.ceiling(&15)), Some(20));
        assert_eq!(key_of(&t, t.ceiling(&20)), Some(20));
        assert_eq!(key_of(&t, t.ceiling(&31)), None);
        assert_eq!(key_of(&t, t.floor(&15)), Some(10));
        assert_eq!(key_of(&t, t.floor(&20)), Some(20));
        assert_eq!(key_of(&t, t.floor(&9)), None);
        assert_eq!(key_of(&t, t.higher(&20)), Some(30));
        assert_eq!(key_of(&t, t.higher(&30)), None);
        assert_eq!(key_of(&t, t.lower(&20)), Some(10));
        assert_eq!(key_of(&t, t.lower(&10)), None);
        assert_eq!(key_of(&t, t.first()), Some(10));
        assert_eq!(key_of(&t, t.last()), Some(30));
    }

    #[test]
    fn empty_tree_has_no_bounds() {
        let t: TreeIndex<i32, String> = TreeIndex::new();
        assert!(t.first().is_none());
        assert!(t.last().is_none());
        assert!(t.ceiling(&0).is_none());
        assert!(t.floor(&0).is_none());
        assert!(t.iter().next().is_none());
    }

    /// Invariant: successor/predecessor walk the order and stop at the boundaries.
    #[test]
    fn stepping_through_nodes() {
        let t = filled(&[3, 1, 2]);
        let mut n = t.first();
        let mut seen = Vec::new();
        while let Some(cur) = n {
            seen.push(*cur.key(&t).unwrap());
            n = t.successor(cur);
        }
        assert_eq!(seen, vec![1, 2, 3]);

        let last = t.last().unwrap();
        assert_eq!(key_of(&t, t.predecessor(last)), Some(2));
        assert!(t.predecessor(t.first().unwrap()).is_none());
    }

    /// Invariant: a node stays valid across unrelated inserts and removals,
    /// and a removed node never resolves again, even after slot reuse.
    #[test]
    fn node_handles_are_stable_and_generational() {
        let mut t = filled(&[10, 20, 30]);
        let n20 = t.search(&20).unwrap();
        for k in [5, 15, 25, 35] {
            t.insert(k, String::new()).unwrap();
        }
        let n10 = t.search(&10).unwrap();
        t.remove(n10).unwrap();
        assert_eq!(n20.key(&t), Some(&20));
        assert_eq!(key_of(&t, t.successor(n20)), Some(25));

        let (k, v) = t.remove(n20).unwrap();
        assert_eq!((k, v.as_str()), (20, "v20"));
        let fresh = t.insert(20, "again".to_string()).unwrap();
        assert_ne!(fresh, n20);
        assert!(!t.contains_node(n20));
        assert!(n20.value(&t).is_none());
        assert!(t.successor(n20).is_none());
        assert!(t.remove(n20).is_none());
    }

    #[test]
    fn value_mut_updates_in_place() {
        let mut t = filled(&[1]);
        let n = t.search(&1).unwrap();
        n.value_mut(&mut t).unwrap().push('!');
        assert_eq!(n.value(&t).map(String::as_str), Some("v1!"));
    }

    /// Invariant: a configured entry ceiling is reported as an allocation
    /// failure that hands the items back.
    #[test]
    fn max_len_reports_alloc_failure() {
        let mut t: TreeIndex<i32, i32> =
            TreeIndex::with_config(Natural, Config::default().with_max_len(2));
        t.insert(1, 1).unwrap();
        t.insert(2, 2).unwrap();
        match t.insert(3, 3) {
            Err(InsertError::AllocFailed(3, 3)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        // Duplicate detection still wins over the ceiling.
        assert!(matches!(t.insert(1, 9), Err(InsertError::DuplicateKey(1, 9))));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn custom_comparator_orders_descending() {
        let mut t = TreeIndex::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        for k in [1, 3, 2] {
            t.insert(k, ()).unwrap();
        }
        let keys: Vec<i32> = t.iter().map(|(_, k, _)| *k).collect();
        assert_eq!(keys, vec![3, 2, 1]);
        // "ceiling" is relative to the comparator's order.
        let c = t.ceiling(&4).and_then(|n| n.key(&t).copied());
        assert_eq!(c, Some(3));
    }

    /// Invariant: drain empties the tree and yields entries in order.
    #[test]
    fn drain_yields_sorted_and_empties() {
        let mut t = filled(&[2, 3, 1]);
        let n = t.first().unwrap();
        let keys: Vec<i32> = t.drain().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert!(t.is_empty());
        assert!(!t.contains_node(n));
        let fresh = t.insert(7, "seven".into()).unwrap();
        assert_ne!(fresh, n, "drained handles must not alias new entries");
        assert!(n.key(&t).is_none());
        assert_eq!(t.len(), 1);

        // Dropping a partially consumed drain still empties the tree.
        t.insert(8, "eight".into()).unwrap();
        let mut d = t.drain();
        assert_eq!(d.next().map(|(k, _)| k), Some(7));
        drop(d);
        assert!(t.is_empty());
        assert!(t.first().is_none());
    }

    /// Invariant: sorted insertion keeps the tree balanced. An AVL tree of n
    /// nodes is at most ~1.44 log2(n) deep; a degenerate index would be n.
    #[test]
    fn sorted_inserts_stay_logarithmic() {
        for descending in [false, true] {
            let mut t: TreeIndex<u32, ()> = TreeIndex::new();
            let n = 1u32 << 14;
            for i in 0..n {
                let k = if descending { n - i } else { i };
                t.insert(k, ()).unwrap();
            }
            t.assert_well_formed();
            assert_eq!(t.len(), n as usize);
            assert!(t.depth() <= 21, "depth {} for {n} keys", t.depth());
        }
    }

    /// Invariant: removals of leaves, single-child and two-child nodes keep
    /// links, heights and order intact, and surviving handles still resolve.
    #[test]
    fn removals_keep_structure() {
        let mut t: TreeIndex<i32, i32> = TreeIndex::new();
        let nodes: Vec<Node> = (0..200).map(|k| t.insert(k, k * 2).unwrap()).collect();
        // Remove every third key, then the middle of what remains.
        for (k, n) in nodes.iter().enumerate().filter(|(k, _)| k % 3 == 0) {
            assert_eq!(t.remove(*n), Some((k as i32, k as i32 * 2)));
            t.assert_well_formed();
        }
        let root_key = t.root.and_then(|r| Node(r).key(&t).copied()).unwrap();
        let root = t.search(&root_key).unwrap();
        t.remove(root).unwrap();
        t.assert_well_formed();
        for (k, n) in nodes.iter().enumerate() {
            let live = k % 3 != 0 && k as i32 != root_key;
            assert_eq!(n.value(&t).copied(), live.then_some(k as i32 * 2));
        }
        assert!(t.depth() <= 12);
    }

    /// Invariant: a configured capacity is reserved up front, so filling up
    /// to it never grows the slot map.
    #[test]
    fn capacity_preallocates_slots() {
        let mut t: TreeIndex<u32, u32> =
            TreeIndex::with_config(Natural, Config::default().with_capacity(64));
        let reserved = t.slots.capacity();
        assert!(reserved >= 64);
        for k in 0..64 {
            t.insert(k, k).unwrap();
        }
        assert_eq!(t.slots.capacity(), reserved);
    }

    /// Invariant (debug-only): a comparator that re-enters the tree panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_comparator_panics() {
        use std::cell::Cell;

        thread_local! {
            static TREE: Cell<*const TreeIndex<i32, (), fn(&i32, &i32) -> Ordering>> =
                const { Cell::new(core::ptr::null()) };
        }
        fn sneaky(a: &i32, b: &i32) -> Ordering {
            let p = TREE.with(Cell::get);
            if !p.is_null() {
                // Re-enter the same tree during a search.
                unsafe {
                    let _ = (*p).search(&0);
                }
            }
            a.cmp(b)
        }

        let mut t: TreeIndex<i32, (), fn(&i32, &i32) -> Ordering> =
            TreeIndex::with_comparator(sneaky as fn(&i32, &i32) -> Ordering);
        t.insert(1, ()).unwrap();
        TREE.with(|c| c.set(&t as *const _));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.search(&1);
        }));
        TREE.with(|c| c.set(core::ptr::null()));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
