// SmallFlatMap property tests (model-based). All maps here use four inline
// slots so growth, spill and shrink are exercised constantly.
//
// Property 1: differential equivalence against std::collections::HashMap.
//  - Model: a HashMap driven by the same operation vector.
//  - Operations: insert, remove, get, entry-or-insert, get_mut-assign,
//    shrink_to_fit.
//  - Invariants after each step: len() matches the model; capacity() covers
//    len(); the map is inline exactly when capacity() is the slot count.
//
// Property 2: clone and insertion-order permutations compare equal, and a
//  clone shares nothing with its source.
//
// Property 3: erase_if removes exactly the matching pairs and reports how
//  many.
//
// Property 4: storage state machine. Spilling is one-way under insert and
//  remove; shrink_to_fit is the only way back inline; clear keeps capacity.
//
// Property 5: drain yields exactly the positional range, in order, and
//  repairs the map from its tail.
//
// Property 6: bulk construction resolves duplicate keys to the last
//  occurrence, matching FromIterator on the std maps.
use std::{collections::HashMap, mem};

use proptest::prelude::*;
use small_flat_map::SmallFlatMap;

// Property 1: every operation agrees with the HashMap model.
proptest! {
    #[test]
    fn prop_matches_hashmap(
        ops in proptest::collection::vec((0u8..=5u8, 0i32..16i32, any::<i32>()), 1..200),
    ) {
        let mut fm: SmallFlatMap<4, i32, i32> = SmallFlatMap::new();
        let mut model: HashMap<i32, i32> = HashMap::new();

        for (op, k, v) in ops {
            match op {
                // Insert returns the old value for a duplicate key.
                0 => {
                    prop_assert_eq!(fm.insert(k, v), model.insert(k, v));
                }
                // Remove returns the value that was present, if any.
                1 => {
                    prop_assert_eq!(fm.remove(&k), model.remove(&k));
                }
                2 => {
                    prop_assert_eq!(fm.get(&k), model.get(&k));
                }
                // The vacant arm inserts, the occupied arm keeps the value.
                3 => {
                    prop_assert_eq!(fm.entry(k).or_insert(v), model.entry(k).or_insert(v));
                }
                // Assign through the mutable lookup when present.
                4 => {
                    let (fv, mv) = (fm.get_mut(&k), model.get_mut(&k));
                    prop_assert_eq!(fv.is_some(), mv.is_some());
                    if let (Some(fv), Some(mv)) = (fv, mv) {
                        *fv = v;
                        *mv = v;
                    }
                }
                // Shrinking changes storage, never contents.
                5 => {
                    fm.shrink_to_fit();
                    prop_assert_eq!(fm.capacity(), fm.len().max(4));
                }
                _ => unreachable!(),
            }

            // Storage invariants hold after every operation.
            prop_assert_eq!(fm.len(), model.len());
            prop_assert!(fm.capacity() >= fm.len());
            prop_assert!(fm.capacity() >= 4);
            prop_assert_eq!(fm.is_inline(), fm.capacity() == 4);
        }

        // Final invariant: the same set of pairs, checked in both directions.
        for (k, v) in fm.iter() {
            prop_assert_eq!(model.get(k), Some(v));
        }
        for (k, v) in &model {
            prop_assert_eq!(fm.get(k), Some(v));
        }
    }
}

// Property 2: clones and permutations are equal; a clone is independent.
proptest! {
    #[test]
    fn prop_clone_is_permutation_equal_deep_copy(
        pairs in proptest::collection::hash_map(0i32..32, any::<i32>(), 0..24),
    ) {
        let map: SmallFlatMap<4, i32, i32> = pairs.iter().map(|(&k, &v)| (k, v)).collect();
        let mut clone = map.clone();

        prop_assert_eq!(&clone, &map);
        // A clone is exactly sized: inline when it fits, one tight block
        // otherwise.
        prop_assert_eq!(clone.capacity(), clone.len().max(4));

        // Equality is order-independent: the same pairs inserted ascending
        // and descending compare equal.
        let mut sorted: Vec<(i32, i32)> = pairs.iter().map(|(&k, &v)| (k, v)).collect();
        sorted.sort_unstable();
        let ascending: SmallFlatMap<4, i32, i32> = sorted.iter().copied().collect();
        let descending: SmallFlatMap<4, i32, i32> = sorted.iter().rev().copied().collect();
        prop_assert_eq!(&ascending, &descending);
        prop_assert_eq!(&ascending, &map);

        // Mutating the clone never touches the original.
        clone.insert(99, 1);
        if let Some(&first) = map.keys().next() {
            clone.remove(&first);
            prop_assert!(map.contains_key(&first));
        }
        prop_assert_eq!(map.len(), pairs.len());
        for (&k, &v) in &pairs {
            prop_assert_eq!(map.get(&k), Some(&v));
        }
    }
}

// Property 3: erase_if reports the exact match count and spares the rest.
proptest! {
    #[test]
    fn prop_erase_if_removes_exactly_the_matching_pairs(
        pairs in proptest::collection::hash_map(0i32..48, any::<i32>(), 0..32),
        threshold in 0i32..48,
    ) {
        let mut map: SmallFlatMap<4, i32, i32> = pairs.iter().map(|(&k, &v)| (k, v)).collect();
        let total = map.len();
        let matching = pairs.keys().filter(|&&k| k < threshold).count();

        let removed = map.erase_if(|&k, _| k < threshold);

        prop_assert_eq!(removed, matching);
        prop_assert_eq!(map.len(), total - matching);
        // Survivors all fail the predicate and keep their values.
        for (&k, &v) in map.iter() {
            prop_assert!(k >= threshold);
            prop_assert_eq!(pairs.get(&k), Some(&v));
        }
        for &k in pairs.keys() {
            prop_assert_eq!(map.contains_key(&k), k >= threshold);
        }
    }
}

// Property 4: the inline/spilled state machine.
proptest! {
    #[test]
    fn prop_storage_state_machine(
        ops in proptest::collection::vec((0u8..=3u8, 0usize..64usize), 1..128),
    ) {
        let mut map = SmallFlatMap::<4, u32, u32>::new();
        let mut next_key = 0u32;

        prop_assert!(map.is_inline());
        prop_assert_eq!(map.capacity(), 4);

        for (op, pick) in ops {
            let was_inline = map.is_inline();
            let cap_before = map.capacity();
            match op {
                // Insert a fresh key. May trigger the one-way spill.
                0 => {
                    map.insert(next_key, next_key);
                    next_key += 1;
                    if map.len() > 4 {
                        prop_assert!(!map.is_inline());
                        prop_assert!(map.capacity() > 4);
                    } else if was_inline {
                        prop_assert!(map.is_inline());
                    }
                }
                // Remove some present key. Never changes the storage state.
                1 => {
                    if !map.is_empty() {
                        let k = *map.keys().nth(pick % map.len()).unwrap();
                        prop_assert!(map.remove(&k).is_some());
                        prop_assert_eq!(map.is_inline(), was_inline);
                        prop_assert_eq!(map.capacity(), cap_before);
                    }
                }
                // Shrink: the only way back to inline storage.
                2 => {
                    map.shrink_to_fit();
                    prop_assert_eq!(map.is_inline(), map.len() <= 4);
                    prop_assert_eq!(map.capacity(), map.len().max(4));
                }
                // Clear drops the contents, not the storage.
                3 => {
                    map.clear();
                    prop_assert!(map.is_empty());
                    prop_assert_eq!(map.is_inline(), was_inline);
                    prop_assert_eq!(map.capacity(), cap_before);
                }
                _ => unreachable!(),
            }

            // Spilling is one-way: only shrink_to_fit goes back.
            if !was_inline && op != 2 {
                prop_assert!(!map.is_inline());
            }
            prop_assert!(map.capacity() >= map.len());
            prop_assert!(map.is_inline() || map.capacity() > 4);
        }
    }
}

// Property 5: drain is positional and repairs the gap from the tail.
proptest! {
    #[test]
    fn prop_drain_yields_range_and_repairs_from_tail(
        pairs in proptest::collection::hash_map(0i32..64, any::<i32>(), 0..24),
        raw_bounds in (0usize..=24usize, 0usize..=24usize),
    ) {
        let mut map: SmallFlatMap<4, i32, i32> = pairs.iter().map(|(&k, &v)| (k, v)).collect();
        let snapshot: Vec<(i32, i32)> = map.as_slice().to_vec();
        let len = snapshot.len();

        let (mut start, mut end) = (raw_bounds.0 % (len + 1), raw_bounds.1 % (len + 1));
        if start > end {
            mem::swap(&mut start, &mut end);
        }

        let drained: Vec<(i32, i32)> = map.drain(start..end).collect();

        // The drain yields exactly the positional range, in order.
        prop_assert_eq!(&drained[..], &snapshot[start..end]);
        prop_assert_eq!(map.len(), len - (end - start));

        // What remains is exactly everything outside the range.
        let mut rest: Vec<(i32, i32)> = map.as_slice().to_vec();
        let mut expected: Vec<(i32, i32)> = snapshot[..start]
            .iter()
            .chain(&snapshot[end..])
            .copied()
            .collect();
        rest.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(rest, expected);

        // Draining leaves a usable map behind.
        map.insert(-1, -1);
        prop_assert!(map.contains_key(&-1));
    }
}

// Property 6: duplicate keys in bulk construction resolve to the last
// occurrence.
proptest! {
    #[test]
    fn prop_bulk_construction_keeps_last_duplicate(
        pairs in proptest::collection::vec((0i32..8, any::<i32>()), 0..32),
    ) {
        let map: SmallFlatMap<4, i32, i32> = pairs.iter().copied().collect();
        let model: HashMap<i32, i32> = pairs.iter().copied().collect();

        prop_assert_eq!(map.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
    }
}
