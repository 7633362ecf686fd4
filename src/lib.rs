#![allow(clippy::manual_map)]
#![cfg_attr(feature = "nightly", feature(allocator_api, core_intrinsics))]
#![cfg_attr(feature = "nightly", allow(internal_features))]

//! An unordered flat map that keeps up to `N` entries inline and spills to
//! the heap once it outgrows them.
//!
//! Lookup walks the entries front to back and asks an owned [`Equivalence`]
//! strategy whether a key matches, so keys need neither `Hash` nor `Ord`.
//! For a handful of entries this beats hash maps on constant factors and
//! does not allocate at all.

use core::{
    alloc::Layout,
    mem,
    ops::{Index, RangeBounds},
};
use std::fmt::{self, Debug};

use allocator_api2::alloc::{Allocator, Global};

mod entry;
mod eq;
mod iter;
mod raw;
mod store;

#[cfg(feature = "serde")]
mod serde;

pub use equivalent::Equivalent;

pub use crate::{
    entry::{Entry, OccupiedEntry, VacantEntry},
    eq::{DefaultEquality, Equivalence},
    iter::{Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut},
};
use crate::{raw::util::probe_key, store::Store};

/// The error type for [`try_reserve`](SmallFlatMap::try_reserve).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TryReserveError {
    /// The computed capacity exceeded the map's maximum.
    CapacityOverflow,

    /// The memory allocator returned an error.
    AllocError {
        /// The layout of the allocation request that failed.
        layout: Layout,
    },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TryReserveError::CapacityOverflow => {
                " because the computed capacity exceeded the collection's maximum"
            }
            TryReserveError::AllocError { .. } => " because the memory allocator returned an error",
        };
        f.write_str("memory allocation failed")?;
        f.write_str(reason)
    }
}

impl std::error::Error for TryReserveError {}

/// An unordered map of key-value pairs with `N` inline slots.
///
/// Entries are stored contiguously. Up to `N` of them live inside the map
/// object itself; growing past the current capacity relocates all entries to
/// a heap block from the allocator `A` ("spilling"). Lookup hands each
/// stored key to the owned equality strategy `E`, which defaults to plain
/// `Eq` with `Borrow`-based probing.
///
/// Iteration order is unspecified: removal swaps the last entry into the
/// hole.
///
/// # Examples
///
/// ```
/// use small_flat_map::SmallFlatMap;
///
/// let mut map = SmallFlatMap::<8, &str, i32>::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// assert!(map.is_inline());
/// assert_eq!(map["a"], 1);
/// assert_eq!(map.get("b"), Some(&2));
/// ```
pub struct SmallFlatMap<const N: usize, K, V, E = DefaultEquality, A: Allocator = Global> {
    pub(crate) store: Store<N, (K, V), A>,
    pub(crate) eq: E,
}

impl<const N: usize, K, V, E, A> Debug for SmallFlatMap<N, K, V, E, A>
where
    K: Debug,
    V: Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<const N: usize, K, V, E, A> Default for SmallFlatMap<N, K, V, E, A>
where
    E: Default,
    A: Allocator + Default,
{
    /// Creates an empty `SmallFlatMap<N, K, V, E, A>`, with the `Default`
    /// value for the equality strategy and allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// // The created map is empty and does not allocate memory.
    /// let map: SmallFlatMap<8, u32, String> = SmallFlatMap::default();
    /// assert_eq!(map.capacity(), 8);
    /// ```
    #[inline]
    fn default() -> Self {
        Self::with_equivalence_in(Default::default(), Default::default())
    }
}

impl<const N: usize, K, V, E, A> Clone for SmallFlatMap<N, K, V, E, A>
where
    K: Clone,
    V: Clone,
    E: Clone,
    A: Allocator + Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            eq: self.eq.clone(),
        }
    }

    /// Reuses the destination's storage when its capacity suffices, and
    /// keeps the destination's allocator either way.
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        self.eq.clone_from(&source.eq);
        self.store.clone_from(&source.store);
    }
}

impl<const N: usize, K, V, E, A> SmallFlatMap<N, K, V, E, A>
where
    E: Default,
    A: Allocator + Default,
{
    /// Creates an empty `SmallFlatMap`.
    #[inline]
    pub fn new() -> Self {
        Self::with_equivalence_in(Default::default(), Default::default())
    }

    /// Creates an empty `SmallFlatMap` with the specified capacity.
    ///
    /// The map will be able to hold at least `capacity` elements without
    /// reallocating. If `capacity` is smaller than or eq to N, the map will
    /// not allocate.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_equivalence_in(capacity, Default::default(), Default::default())
    }
}

impl<const N: usize, K, V, E> SmallFlatMap<N, K, V, E> {
    /// Creates an empty `SmallFlatMap` which will use the given strategy to
    /// compare keys.
    ///
    /// The map is initially created with a capacity of N, so it will not
    /// allocate until its size gets bigger than the inline size N.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::{DefaultEquality, SmallFlatMap};
    ///
    /// let mut map = SmallFlatMap::<8, _, _, _>::with_equivalence(DefaultEquality);
    /// map.insert(1, 2);
    /// ```
    #[inline]
    pub const fn with_equivalence(eq: E) -> Self {
        Self::with_equivalence_in(eq, Global)
    }

    /// Creates an empty `SmallFlatMap` with the specified capacity, using
    /// `eq` to compare keys.
    #[inline]
    pub fn with_capacity_and_equivalence(capacity: usize, eq: E) -> Self {
        Self::with_capacity_and_equivalence_in(capacity, eq, Global)
    }
}

impl<const N: usize, K, V, E, A: Allocator> SmallFlatMap<N, K, V, E, A> {
    /// Creates an empty `SmallFlatMap` using `alloc` for spilled storage.
    #[inline]
    pub fn new_in(alloc: A) -> Self
    where
        E: Default,
    {
        Self::with_equivalence_in(Default::default(), alloc)
    }

    /// Creates an empty `SmallFlatMap` with the specified capacity, using
    /// `alloc` for spilled storage.
    #[inline]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self
    where
        E: Default,
    {
        Self::with_capacity_and_equivalence_in(capacity, Default::default(), alloc)
    }

    /// Creates an empty `SmallFlatMap` with the given strategy and
    /// allocator.
    #[inline]
    pub const fn with_equivalence_in(eq: E, alloc: A) -> Self {
        Self {
            store: Store::new_in(alloc),
            eq,
        }
    }

    /// Creates an empty `SmallFlatMap` with the specified capacity,
    /// strategy and allocator.
    #[inline]
    pub fn with_capacity_and_equivalence_in(capacity: usize, eq: E, alloc: A) -> Self {
        Self {
            store: Store::with_capacity_in(capacity, alloc),
            eq,
        }
    }

    /// Whether the entries currently live in the inline slots.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.store.is_inline()
    }

    /// Returns the number of elements the map can hold without reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let map: SmallFlatMap<8, i32, i32> = SmallFlatMap::with_capacity(100);
    /// assert_eq!(map.len(), 0);
    /// assert!(map.capacity() >= 100);
    ///
    /// let map: SmallFlatMap<8, i32, i32> = SmallFlatMap::with_capacity(2);
    /// assert_eq!(map.len(), 0);
    /// assert_eq!(map.capacity(), 8);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Returns the largest capacity the map can ever have: a single
    /// allocation is capped at `isize::MAX` bytes.
    #[inline]
    pub fn max_capacity(&self) -> usize {
        Store::<N, (K, V), A>::max_capacity()
    }

    /// Returns a reference to the map's equality strategy.
    #[inline]
    pub fn equivalence(&self) -> &E {
        &self.eq
    }

    /// Returns a reference to the map's allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.store.allocator()
    }

    /// The entries as a slice of pairs, in iteration order.
    #[inline]
    pub fn as_slice(&self) -> &[(K, V)] {
        self.store.as_slice()
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds
    /// [`max_capacity`](Self::max_capacity); aborts on allocation failure.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    /// Fallible [`reserve`](Self::reserve). On error the map is left
    /// unchanged.
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.store.try_reserve(additional)
    }

    /// Shrinks to the smallest storage that holds the current entries: back
    /// into the inline slots if they fit, otherwise an exactly sized heap
    /// block.
    ///
    /// This is the only way a spilled map returns to inline storage.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let mut map: SmallFlatMap<4, i32, i32> = (0..10).map(|i| (i, i)).collect();
    /// assert!(!map.is_inline());
    /// map.retain(|&k, _| k < 3);
    /// map.shrink_to_fit();
    /// assert!(map.is_inline());
    /// assert_eq!(map.len(), 3);
    /// ```
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.store.shrink_to_fit();
    }

    /// Drops all entries. Keeps the allocated capacity and the storage
    /// state, spilled or not.
    #[inline]
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

impl<const N: usize, K, V, E, A: Allocator> SmallFlatMap<N, K, V, E, A> {
    #[inline]
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        E: Equivalence<K, Q>,
    {
        // Avoid `Option::map` because it bloats LLVM IR.
        match self.get_key_value(key) {
            Some((_, v)) => Some(v),
            None => None,
        }
    }

    /// Returns the key-value pair corresponding to the supplied probe.
    #[inline]
    pub fn get_key_value<Q: ?Sized>(&self, key: &Q) -> Option<(&K, &V)>
    where
        E: Equivalence<K, Q>,
    {
        match self.get_index_of(key) {
            Some(index) => {
                let (k, v) = unsafe { self.store.as_slice().get_unchecked(index) };
                Some((k, v))
            }
            None => None,
        }
    }

    /// Returns a mutable reference to the value corresponding to the probe.
    #[inline]
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        E: Equivalence<K, Q>,
    {
        match self.get_index_of(key) {
            Some(index) => {
                Some(unsafe { &mut self.store.as_mut_slice().get_unchecked_mut(index).1 })
            }
            None => None,
        }
    }

    #[inline]
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        E: Equivalence<K, Q>,
    {
        self.get_index_of(key).is_some()
    }

    /// Returns the position of the key in iteration order.
    #[inline]
    pub fn get_index_of<Q: ?Sized>(&self, key: &Q) -> Option<usize>
    where
        E: Equivalence<K, Q>,
    {
        self.store
            .as_slice()
            .iter()
            .position(probe_key(&self.eq, key))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did have this key present, the value is updated and the
    /// old value is returned. The key is not updated, though.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        E: Equivalence<K>,
    {
        self.insert_full(key, value).1
    }

    /// Like [`insert`](Self::insert), but also reports the position the
    /// pair occupies.
    #[inline]
    pub fn insert_full(&mut self, key: K, value: V) -> (usize, Option<V>)
    where
        E: Equivalence<K>,
    {
        match self.get_index_of(&key) {
            Some(index) => {
                let slot = unsafe { self.store.as_mut_slice().get_unchecked_mut(index) };
                (index, Some(mem::replace(&mut slot.1, value)))
            }
            None => (self.store.push((key, value)), None),
        }
    }

    /// Gets the key's slot in the map for in-place manipulation. The key is
    /// moved into the map only if an insertion happens.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let mut counts = SmallFlatMap::<8, char, u32>::new();
    /// for c in "abracadabra".chars() {
    ///     *counts.entry(c).or_default() += 1;
    /// }
    /// assert_eq!(counts[&'a'], 5);
    /// assert_eq!(counts[&'b'], 2);
    /// ```
    #[inline]
    pub fn entry(&mut self, key: K) -> Entry<'_, N, K, V, E, A>
    where
        E: Equivalence<K>,
    {
        match self.get_index_of(&key) {
            Some(index) => Entry::Occupied(OccupiedEntry { map: self, index }),
            None => Entry::Vacant(VacantEntry { map: self, key }),
        }
    }

    /// Removes a key from the map, returning the value if it was present.
    ///
    /// The last entry in iteration order backfills the hole, so removal
    /// never shifts more than one element but visibly reorders the map.
    #[inline]
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<V>
    where
        E: Equivalence<K, Q>,
    {
        // Avoid `Option::map` because it bloats LLVM IR.
        match self.remove_entry(key) {
            Some((_, v)) => Some(v),
            None => None,
        }
    }

    #[inline]
    pub fn remove_entry<Q: ?Sized>(&mut self, key: &Q) -> Option<(K, V)>
    where
        E: Equivalence<K, Q>,
    {
        match self.get_index_of(key) {
            Some(index) => Some(self.store.swap_remove(index)),
            None => None,
        }
    }
}

impl<const N: usize, K, V, E, A: Allocator> SmallFlatMap<N, K, V, E, A> {
    /// Returns the pair at `index` in iteration order.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        match self.store.as_slice().get(index) {
            Some((k, v)) => Some((k, v)),
            None => None,
        }
    }

    /// Returns the pair at `index`, with the value mutable.
    #[inline]
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        match self.store.as_mut_slice().get_mut(index) {
            Some((k, v)) => Some((&*k, v)),
            None => None,
        }
    }

    /// Removes the pair at `index` in iteration order, backfilling the hole
    /// with the last entry. Returns `None` if `index` is out of bounds.
    #[inline]
    pub fn swap_remove_index(&mut self, index: usize) -> Option<(K, V)> {
        if index >= self.len() {
            return None;
        }
        Some(self.store.swap_remove(index))
    }

    /// Removes the given positional range from the map, returning its pairs
    /// as an iterator. The gap is backfilled from the end of the map when
    /// the iterator drops.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    ///
    /// # Leaking
    ///
    /// If the returned iterator is leaked, the map stays valid but the
    /// drained range and the entries behind it are lost.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let mut map: SmallFlatMap<8, i32, i32> = (0..4).map(|i| (i, i * 10)).collect();
    /// let drained: Vec<_> = map.drain(1..3).collect();
    /// assert_eq!(drained.len(), 2);
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    pub fn drain<R>(&mut self, range: R) -> Drain<'_, N, K, V, A>
    where
        R: RangeBounds<usize>,
    {
        Drain::new(&mut self.store, range)
    }

    /// Removes every pair for which `pred` returns true, returning how many
    /// were removed. Surviving pairs may be reordered.
    ///
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let mut map: SmallFlatMap<8, i32, i32> = (0..8).map(|i| (i, i)).collect();
    /// let removed = map.erase_if(|&k, _| k % 2 == 0);
    /// assert_eq!(removed, 4);
    /// assert_eq!(map.len(), 4);
    /// ```
    pub fn erase_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        let mut index = 0;
        while index < self.store.len() {
            let keep = {
                let slot = &mut self.store.as_mut_slice()[index];
                !pred(&slot.0, &mut slot.1)
            };
            if keep {
                index += 1;
            } else {
                self.store.swap_remove(index);
                removed += 1;
            }
        }
        removed
    }

    /// Retains only the pairs for which `keep` returns true.
    #[inline]
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.erase_if(|k, v| !keep(k, v));
    }
}

impl<const N: usize, K, V, E, A: Allocator> SmallFlatMap<N, K, V, E, A> {
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// An iterator visiting all key-value pairs in arbitrary order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.store.as_slice().iter(),
        }
    }

    /// An iterator visiting all key-value pairs in arbitrary order, with
    /// mutable references to the values.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.store.as_mut_slice().iter_mut(),
        }
    }

    /// An iterator visiting all keys in arbitrary order.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably in arbitrary order.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

/// Permutation equality: two maps are equal when each pair of one has an
/// equal pair in the other, regardless of order. Compares with the element
/// types' own equality, not with the maps' strategies.
impl<const N: usize, K, V, E, A> PartialEq for SmallFlatMap<N, K, V, E, A>
where
    K: PartialEq,
    V: PartialEq,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(k, v)| other.iter().any(|(ok, ov)| k == ok && v == ov))
    }
}

impl<const N: usize, K, V, E, A> Eq for SmallFlatMap<N, K, V, E, A>
where
    K: Eq,
    V: Eq,
    A: Allocator,
{
}

impl<const N: usize, K, V, E, A, Q: ?Sized> Index<&Q> for SmallFlatMap<N, K, V, E, A>
where
    E: Equivalence<K, Q>,
    A: Allocator,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    #[inline]
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<const N: usize, K, V, E, A> Extend<(K, V)> for SmallFlatMap<N, K, V, E, A>
where
    E: Equivalence<K>,
    A: Allocator,
{
    #[inline]
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<const N: usize, K, V, E, A> FromIterator<(K, V)> for SmallFlatMap<N, K, V, E, A>
where
    E: Equivalence<K> + Default,
    A: Allocator + Default,
{
    /// Duplicate keys resolve to the last occurrence.
    #[inline]
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<const N: usize, const M: usize, K, V> From<[(K, V); M]> for SmallFlatMap<N, K, V>
where
    K: Eq,
{
    /// # Examples
    ///
    /// ```
    /// use small_flat_map::SmallFlatMap;
    ///
    /// let map = SmallFlatMap::<4, _, _>::from([(1, 2), (3, 4)]);
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    fn from(arr: [(K, V); M]) -> Self {
        Self::from_iter(arr)
    }
}

impl<const N: usize, K, V, E, A: Allocator> IntoIterator for SmallFlatMap<N, K, V, E, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<N, K, V, A>;

    /// Creates a consuming iterator, that is, one that moves each key-value
    /// pair out of the map in arbitrary order. The map cannot be used after
    /// calling this.
    #[inline]
    fn into_iter(self) -> IntoIter<N, K, V, A> {
        let SmallFlatMap { store, eq: _ } = self;
        IntoIter::new(store)
    }
}

impl<'a, const N: usize, K, V, E, A: Allocator> IntoIterator for &'a SmallFlatMap<N, K, V, E, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, const N: usize, K, V, E, A: Allocator> IntoIterator
    for &'a mut SmallFlatMap<N, K, V, E, A>
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    #[inline]
    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
