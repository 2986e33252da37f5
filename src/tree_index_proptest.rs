#![cfg(test)]

// Property tests for TreeIndex kept inside the crate so they can reach
// engine internals without widening the public surface.

use crate::compare::{Compare, Natural};
use crate::tree_index::{InsertError, Node, TreeIndex};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};

// Keys are drawn from a small range so queries frequently land on, between
// and beyond live keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(i8, i32),
    Remove(i8),
    Search(i8),
    Ceiling(i8),
    Floor(i8),
    Higher(i8),
    Lower(i8),
    Step(i8),
    Mutate(i8, i32),
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = -20i8..=20;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key.clone().prop_map(Op::Remove),
        1 => key.clone().prop_map(Op::Search),
        1 => key.clone().prop_map(Op::Ceiling),
        1 => key.clone().prop_map(Op::Floor),
        1 => key.clone().prop_map(Op::Higher),
        1 => key.clone().prop_map(Op::Lower),
        1 => key.clone().prop_map(Op::Step),
        1 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..80)
}

/// Model of the engine's order under comparator `C`: keys are mapped to a
/// sort key so a plain `BTreeMap` can stand in.
trait Model {
    fn sort_key(k: i8) -> i16;
}

struct Ascending;
impl Model for Ascending {
    fn sort_key(k: i8) -> i16 {
        k as i16
    }
}

struct Descending;
impl Model for Descending {
    fn sort_key(k: i8) -> i16 {
        -(k as i16)
    }
}

fn run<M: Model, C: Compare<i8>>(comparator: C, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut sut: TreeIndex<i8, i32, C> = TreeIndex::with_comparator(comparator);
    let mut model: BTreeMap<i16, (i8, i32)> = BTreeMap::new();
    let mut live: HashMap<i8, Node> = HashMap::new();
    let mut stale: Vec<Node> = Vec::new();

    let key_at = |sut: &TreeIndex<i8, i32, C>, n: Option<Node>| n.and_then(|n| n.key(sut).copied());

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let already = model.contains_key(&M::sort_key(k));
                match sut.insert(k, v) {
                    Ok(n) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert!(live.insert(k, n).is_none());
                        model.insert(M::sort_key(k), (k, v));
                    }
                    Err(InsertError::DuplicateKey(kk, vv)) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!((kk, vv), (k, v), "rejected items are handed back");
                    }
                    Err(InsertError::AllocFailed(..)) => {
                        prop_assert!(false, "unbounded engine must not fail allocation");
                    }
                }
            }
            Op::Remove(k) => {
                if let Some(n) = live.remove(&k) {
                    let (kk, vv) = sut.remove(n).expect("live node removable");
                    let (mk, mv) = model.remove(&M::sort_key(k)).expect("present in model");
                    prop_assert_eq!((kk, vv), (mk, mv));
                    stale.push(n);
                } else {
                    prop_assert!(sut.search(&k).is_none());
                }
            }
            Op::Search(k) => {
                let s = sut.search(&k);
                prop_assert_eq!(s.is_some(), model.contains_key(&M::sort_key(k)));
                if let Some(n) = s {
                    prop_assert_eq!(Some(&n), live.get(&k), "search yields the stable handle");
                }
            }
            Op::Ceiling(k) => {
                let want = model.range(M::sort_key(k)..).next().map(|(_, (mk, _))| *mk);
                prop_assert_eq!(key_at(&sut, sut.ceiling(&k)), want);
            }
            Op::Floor(k) => {
                let want = model.range(..=M::sort_key(k)).next_back().map(|(_, (mk, _))| *mk);
                prop_assert_eq!(key_at(&sut, sut.floor(&k)), want);
            }
            Op::Higher(k) => {
                let want = model
                    .range((Excluded(M::sort_key(k)), Unbounded))
                    .next()
                    .map(|(_, (mk, _))| *mk);
                prop_assert_eq!(key_at(&sut, sut.higher(&k)), want);
            }
            Op::Lower(k) => {
                let want = model
                    .range((Unbounded, Excluded(M::sort_key(k))))
                    .next_back()
                    .map(|(_, (mk, _))| *mk);
                prop_assert_eq!(key_at(&sut, sut.lower(&k)), want);
            }
            Op::Step(k) => {
                if let Some(&n) = live.get(&k) {
                    let sk = M::sort_key(k);
                    let next = model
                        .range((Excluded(sk), Unbounded))
                        .next()
                        .map(|(_, (mk, _))| *mk);
                    let prev = model
                        .range((Unbounded, Excluded(sk)))
                        .next_back()
                        .map(|(_, (mk, _))| *mk);
                    prop_assert_eq!(key_at(&sut, sut.successor(n)), next);
                    prop_assert_eq!(key_at(&sut, sut.predecessor(n)), prev);
                }
            }
            Op::Mutate(k, d) => {
                if let Some(&n) = live.get(&k) {
                    let v = n.value_mut(&mut sut).expect("live handle should resolve");
                    *v = v.wrapping_add(d);
                    let mv = &mut model.get_mut(&M::sort_key(k)).expect("present").1;
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let got: Vec<(i8, i32)> = sut.iter().map(|(_, k, v)| (*k, *v)).collect();
                let want: Vec<(i8, i32)> = model.values().copied().collect();
                prop_assert_eq!(got, want);
            }
        }

        // Post-conditions after each op.
        sut.assert_well_formed();
        for &n in &stale {
            prop_assert!(!sut.contains_node(n), "removed handles never resolve");
            prop_assert!(n.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(
            key_at(&sut, sut.first()),
            model.values().next().map(|(k, _)| *k)
        );
        prop_assert_eq!(
            key_at(&sut, sut.last()),
            model.values().next_back().map(|(k, _)| *k)
        );
    }

    // Draining yields exactly the model, in order.
    let drained: Vec<(i8, i32)> = sut.drain().collect();
    let want: Vec<(i8, i32)> = model.into_values().collect();
    prop_assert_eq!(drained, want);
    prop_assert!(sut.is_empty());
    Ok(())
}

// Property: state-machine equivalence against an ordered model.
// - Duplicate keys are rejected and the items come back untouched.
// - search/ceiling/floor/higher/lower agree with BTreeMap range queries.
// - successor/predecessor agree with the model's neighbours.
// - Handles are stable while live and never resolve after removal.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run::<Ascending, _>(Natural, ops)?;
    }
}

// Property: same invariants under a reversed comparator, checking that every
// query is relative to the comparator's order rather than `Ord`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_descending(ops in arb_ops()) {
        run::<Descending, _>(|a: &i8, b: &i8| b.cmp(a), ops)?;
    }
}
