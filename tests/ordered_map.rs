// OrderedMap behavior suite.
//
// Each test names the behavior it verifies. The core invariants exercised:
// - Uniqueness: a duplicate add is rejected and leaves the map unchanged.
// - Order: lookups, neighbour queries and cursor walks follow the comparator.
// - Cursors: an entry cursor stays valid across unrelated mutations and is
//   rejected once its own entry is removed.
// - Atomicity: a failing call leaves the map exactly as it was.
use policy_ordmap::{Config, Entry, Error, Inline, Natural, OrderedMap};

type Map = OrderedMap<Inline<i32>, Inline<&'static str>>;

fn walk(m: &Map) -> Vec<(i32, &'static str)> {
    let mut out = Vec::new();
    let mut cur = match m.first_entry() {
        Ok(e) => e,
        Err(Error::MapIsEmpty) => return out,
        Err(e) => panic!("unexpected {e}"),
    };
    loop {
        out.push((m.entry_key(cur).unwrap(), m.entry_value(cur).unwrap()));
        match m.next_entry(cur) {
            Ok(e) => cur = e,
            Err(Error::EndOfSequence) => return out,
            Err(e) => panic!("unexpected {e}"),
        }
    }
}

// Test: neighbour queries around a gap.
// Verifies: ceiling/floor land on either side; removal shifts first.
#[test]
fn ceiling_floor_and_first_after_remove() {
    let mut m = Map::new();
    m.add(&10, &"a").unwrap();
    m.add(&20, &"b").unwrap();

    assert_eq!(m.ceiling(&15), Ok("b"));
    assert_eq!(m.floor(&15), Ok("a"));
    assert_eq!(m.higher(&10), Ok("b"));
    assert_eq!(m.lower(&20), Ok("a"));
    assert_eq!(m.ceiling(&10), Ok("a"), "ceiling is inclusive");
    assert_eq!(m.floor(&20), Ok("b"), "floor is inclusive");
    assert_eq!(m.ceiling(&21), Err(Error::KeyNotFound));
    assert_eq!(m.floor(&9), Err(Error::KeyNotFound));
    assert_eq!(m.higher(&20), Err(Error::KeyNotFound));
    assert_eq!(m.lower(&10), Err(Error::KeyNotFound));

    m.remove(&10).unwrap();
    assert_eq!(m.first(), Ok("b"));
    assert_eq!(m.last(), Ok("b"));
}

// Test: unique keys.
// Verifies: KeyAlreadyExists; the first value survives; count unchanged.
#[test]
fn duplicate_add_is_rejected() {
    let mut m = Map::new();
    m.add(&1, &"one").unwrap();
    assert_eq!(m.add(&1, &"uno"), Err(Error::KeyAlreadyExists));
    assert_eq!(m.count(), 1);
    assert_eq!(m.get(&1), Ok("one"));
}

// Test: lookups on an empty map.
// Verifies: keyed lookups report KeyNotFound; first/last report MapIsEmpty.
#[test]
fn empty_map_errors() {
    let mut m = Map::new();
    assert!(m.is_empty());
    assert_eq!(m.get(&1), Err(Error::KeyNotFound));
    assert_eq!(m.remove(&1), Err(Error::KeyNotFound));
    assert_eq!(m.ceiling(&1), Err(Error::KeyNotFound));
    assert_eq!(m.first(), Err(Error::MapIsEmpty));
    assert_eq!(m.last_entry(), Err(Error::MapIsEmpty));
    assert!(walk(&m).is_empty());
}

// Test: count tracks adds and removes.
#[test]
fn count_tracks_mutations() {
    let mut m = Map::new();
    for k in 0..10 {
        m.add(&k, &"x").unwrap();
    }
    assert_eq!(m.count(), 10);
    for k in (0..10).step_by(2) {
        m.remove(&k).unwrap();
    }
    assert_eq!(m.count(), 5);
    assert_eq!(m.len(), 5);
    assert!(m.contains(&3));
    assert!(!m.contains(&4));
}

// Test: cursor walks in both directions.
// Verifies: first_entry/next_entry yields ascending order ending in
// EndOfSequence; last_entry/prev_entry mirrors it.
#[test]
fn cursor_walks_both_directions() {
    let mut m = Map::new();
    for (k, v) in [(3, "c"), (1, "a"), (2, "b")] {
        m.add(&k, &v).unwrap();
    }
    assert_eq!(walk(&m), vec![(1, "a"), (2, "b"), (3, "c")]);

    let mut back = Vec::new();
    let mut cur = m.last_entry().unwrap();
    loop {
        back.push(cur.key(&m).unwrap());
        match cur.prev(&m) {
            Ok(e) => cur = e,
            Err(e) => {
                assert_eq!(e, Error::EndOfSequence);
                break;
            }
        }
    }
    assert_eq!(back, vec![3, 2, 1]);

    let it: Vec<i32> = m.iter().map(|(_, k, _)| *k).collect();
    assert_eq!(it, vec![1, 2, 3]);
    let rev: Vec<i32> = m.iter().rev().map(|(_, k, _)| *k).collect();
    assert_eq!(rev, vec![3, 2, 1]);
}

// Test: cursor stability.
// Verifies: a cursor survives unrelated adds/removes; after its own entry
// is removed every cursor operation reports EntryIsInvalid.
#[test]
fn cursor_lifecycle() {
    let mut m = Map::new();
    let e: Entry = m.add(&5, &"five").unwrap();
    m.add(&1, &"one").unwrap();
    m.add(&9, &"nine").unwrap();
    m.remove(&1).unwrap();
    assert_eq!(e.value(&m), Ok("five"));
    assert_eq!(m.next_entry(e).and_then(|n| m.entry_key(n)), Ok(9));

    m.remove_entry(e).unwrap();
    assert_eq!(m.entry_key(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.entry_value(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.next_entry(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.prev_entry(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.set_entry_value(e, &"x"), Err(Error::EntryIsInvalid));
    assert_eq!(m.remove_entry(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.count(), 1);

    // Reusing the key yields a fresh cursor; the old one stays dead.
    let e2 = m.add(&5, &"again").unwrap();
    assert_ne!(e, e2);
    assert_eq!(m.entry_value(e), Err(Error::EntryIsInvalid));
    assert_eq!(m.entry_value(e2), Ok("again"));
}

// Test: value replacement through key and cursor.
// Verifies: set/set_entry_value swap the value; keys and order untouched.
#[test]
fn set_and_set_entry_value() {
    let mut m = Map::new();
    let e = m.add(&1, &"a").unwrap();
    m.add(&2, &"b").unwrap();
    m.set(&2, &"B").unwrap();
    e.set_value(&mut m, &"A").unwrap();
    assert_eq!(walk(&m), vec![(1, "A"), (2, "B")]);
    assert_eq!(m.set(&3, &"C"), Err(Error::KeyNotFound));
}

// Test: capacity ceiling.
// Verifies: an add past max_len reports MemoryAllocationFailed and the map
// is unchanged; removing an entry makes room again.
#[test]
fn max_len_rolls_back_add() {
    let mut m: Map = OrderedMap::with_config(Natural, Config::default().with_max_len(2));
    m.add(&1, &"a").unwrap();
    m.add(&2, &"b").unwrap();
    assert_eq!(m.add(&3, &"c"), Err(Error::MemoryAllocationFailed));
    assert_eq!(walk(&m), vec![(1, "a"), (2, "b")]);
    m.remove(&1).unwrap();
    m.add(&3, &"c").unwrap();
    assert_eq!(walk(&m), vec![(2, "b"), (3, "c")]);
}

// Test: custom comparator.
// Verifies: every query is relative to the comparator, not `Ord`.
#[test]
fn descending_comparator_reverses_queries() {
    let mut m: OrderedMap<Inline<i32>, Inline<char>, _> =
        OrderedMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    for (k, v) in [(1, 'a'), (2, 'b'), (3, 'c')] {
        m.add(&k, &v).unwrap();
    }
    assert_eq!(m.first(), Ok('c'));
    assert_eq!(m.last(), Ok('a'));
    assert_eq!(m.higher(&2), Ok('a'));
    assert_eq!(m.lower(&2), Ok('c'));
    assert_eq!(m.ceiling(&0), Err(Error::KeyNotFound));
}

// Test: clear keeps the map usable.
#[test]
fn clear_then_reuse() {
    let mut m = Map::new();
    let e = m.add(&1, &"a").unwrap();
    m.add(&2, &"b").unwrap();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.entry_key(e), Err(Error::EntryIsInvalid));
    m.add(&1, &"z").unwrap();
    assert_eq!(m.get(&1), Ok("z"));
}

// Test: cursor accessor errors.
// Verifies: stepping past either end reports EndOfSequence; a cursor used on
// another map or after removal reports EntryIsInvalid from every accessor.
#[test]
fn entry_accessors_report_ends_and_foreign_cursors() {
    let mut m = Map::new();
    let first = m.add(&1, &"a").unwrap();
    let last = m.add(&2, &"b").unwrap();
    assert_eq!(first.prev(&m), Err(Error::EndOfSequence));
    assert_eq!(last.next(&m), Err(Error::EndOfSequence));

    let mut other = Map::new();
    other.add(&1, &"a").unwrap();
    assert_eq!(first.key(&other), Err(Error::EntryIsInvalid));
    assert_eq!(first.key_ref(&other), Err(Error::EntryIsInvalid));
    assert_eq!(first.value(&other), Err(Error::EntryIsInvalid));
    assert_eq!(first.value_ref(&other), Err(Error::EntryIsInvalid));
    assert_eq!(first.next(&other), Err(Error::EntryIsInvalid));
    assert_eq!(first.set_value(&mut other, &"x"), Err(Error::EntryIsInvalid));
    assert_eq!(other.get(&1), Ok("a"));

    first.remove(&mut m).unwrap();
    assert_eq!(first.key(&m), Err(Error::EntryIsInvalid));
    assert_eq!(first.prev(&m), Err(Error::EntryIsInvalid));
    assert_eq!(last.prev(&m), Err(Error::EndOfSequence));
}
