use core::mem;

use allocator_api2::alloc::{Allocator, Global};

use crate::{DefaultEquality, SmallFlatMap};

/// A view into a single slot of a [`SmallFlatMap`], occupied or vacant.
///
/// Returned by [`SmallFlatMap::entry`]. The key is moved into the map only
/// when an insertion actually happens; a duplicate key degrades to a view of
/// the existing element.
pub enum Entry<'a, const N: usize, K, V, E = DefaultEquality, A: Allocator = Global> {
    /// The key is present; the variant knows its position.
    Occupied(OccupiedEntry<'a, N, K, V, E, A>),
    /// The key is absent; the variant still owns it.
    Vacant(VacantEntry<'a, N, K, V, E, A>),
}

impl<'a, const N: usize, K, V, E, A: Allocator> Entry<'a, N, K, V, E, A> {
    /// Inserts `default` if vacant and returns a mutable reference to the
    /// value either way.
    #[inline]
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if vacant and returns a mutable
    /// reference to the value either way.
    #[inline]
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts `V::default()` if vacant and returns a mutable reference to
    /// the value either way.
    #[inline]
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(V::default()),
        }
    }

    /// A reference to the entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }

    /// Mutates the value in place if occupied.
    #[inline]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into an occupied slot of a [`SmallFlatMap`].
pub struct OccupiedEntry<'a, const N: usize, K, V, E = DefaultEquality, A: Allocator = Global> {
    pub(crate) map: &'a mut SmallFlatMap<N, K, V, E, A>,
    pub(crate) index: usize,
}

impl<'a, const N: usize, K, V, E, A: Allocator> OccupiedEntry<'a, N, K, V, E, A> {
    /// Position of the entry in iteration order, as used by
    /// [`SmallFlatMap::get_index`].
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.slot().0
    }

    #[inline]
    pub fn get(&self) -> &V {
        &self.slot().1
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        let index = self.index;
        &mut self.map.store.as_mut_slice()[index].1
    }

    /// Converts into a mutable reference bound to the map's lifetime.
    #[inline]
    pub fn into_mut(self) -> &'a mut V {
        &mut self.map.store.as_mut_slice()[self.index].1
    }

    /// Replaces the value, returning the old one.
    #[inline]
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning the value. The last element backfills
    /// the hole, as with [`SmallFlatMap::remove`].
    #[inline]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the key and value.
    #[inline]
    pub fn remove_entry(self) -> (K, V) {
        self.map.store.swap_remove(self.index)
    }

    #[inline]
    fn slot(&self) -> &(K, V) {
        &self.map.store.as_slice()[self.index]
    }
}

/// A view into a vacant slot of a [`SmallFlatMap`]. It owns the probed key.
pub struct VacantEntry<'a, const N: usize, K, V, E = DefaultEquality, A: Allocator = Global> {
    pub(crate) map: &'a mut SmallFlatMap<N, K, V, E, A>,
    pub(crate) key: K,
}

impl<'a, const N: usize, K, V, E, A: Allocator> VacantEntry<'a, N, K, V, E, A> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes the key back out without inserting.
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value and returns a mutable reference to it.
    #[inline]
    pub fn insert(self, value: V) -> &'a mut V {
        let index = self.map.store.push((self.key, value));
        &mut self.map.store.as_mut_slice()[index].1
    }
}
