use core::{
    cmp,
    iter::FusedIterator,
    ops::{Bound, RangeBounds},
    ptr, slice,
};

use allocator_api2::alloc::{Allocator, Global};

use crate::{raw::util::SizedTypeProperties, store::Store};

/// An iterator over the entries of a [`SmallFlatMap`](crate::SmallFlatMap).
pub struct Iter<'a, K, V> {
    pub(crate) inner: slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        // Avoid `Option::map` because it bloats LLVM IR.
        match self.inner.next() {
            Some((k, v)) => Some((k, v)),
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.inner.next_back() {
            Some((k, v)) => Some((k, v)),
            None => None,
        }
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

/// A mutable iterator over the entries of a
/// [`SmallFlatMap`](crate::SmallFlatMap). Keys stay shared; altering a key
/// in place would desynchronize it from the equality strategy.
pub struct IterMut<'a, K, V> {
    pub(crate) inner: slice::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some((k, v)) => Some((&*k, v)),
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.inner.next_back() {
            Some((k, v)) => Some((&*k, v)),
            None => None,
        }
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`SmallFlatMap`](crate::SmallFlatMap).
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        match self.inner.next() {
            Some((k, _)) => Some(k),
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.inner.next_back() {
            Some((k, _)) => Some(k),
            None => None,
        }
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator over the values of a [`SmallFlatMap`](crate::SmallFlatMap).
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        match self.inner.next() {
            Some((_, v)) => Some(v),
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.inner.next_back() {
            Some((_, v)) => Some(v),
            None => None,
        }
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

/// A mutable iterator over the values of a
/// [`SmallFlatMap`](crate::SmallFlatMap).
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        match self.inner.next() {
            Some((_, v)) => Some(v),
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.inner.next_back() {
            Some((_, v)) => Some(v),
            None => None,
        }
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of a
/// [`SmallFlatMap`](crate::SmallFlatMap).
pub struct IntoIter<const N: usize, K, V, A: Allocator = Global> {
    store: Store<N, (K, V), A>,
    head: usize,
    tail: usize,
}

impl<const N: usize, K, V, A: Allocator> IntoIter<N, K, V, A> {
    #[inline]
    pub(crate) fn new(mut store: Store<N, (K, V), A>) -> Self {
        let tail = store.len();
        // The store's own drop must not touch elements this iterator hands
        // out; the iterator drops whatever remains itself.
        unsafe { store.set_len(0) };
        Self {
            store,
            head: 0,
            tail,
        }
    }
}

impl<const N: usize, K, V, A: Allocator> Iterator for IntoIter<N, K, V, A> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        if self.head == self.tail {
            return None;
        }
        let index = self.head;
        self.head += 1;
        Some(unsafe { self.store.as_ptr().add(index).read() })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.tail - self.head;
        (len, Some(len))
    }
}

impl<const N: usize, K, V, A: Allocator> DoubleEndedIterator for IntoIter<N, K, V, A> {
    #[inline]
    fn next_back(&mut self) -> Option<(K, V)> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(unsafe { self.store.as_ptr().add(self.tail).read() })
    }
}

impl<const N: usize, K, V, A: Allocator> ExactSizeIterator for IntoIter<N, K, V, A> {
    #[inline]
    fn len(&self) -> usize {
        self.tail - self.head
    }
}

impl<const N: usize, K, V, A: Allocator> FusedIterator for IntoIter<N, K, V, A> {}

impl<const N: usize, K, V, A: Allocator> Drop for IntoIter<N, K, V, A> {
    fn drop(&mut self) {
        if <(K, V)>::NEEDS_DROP && self.head != self.tail {
            unsafe {
                let ptr = self.store.as_mut_ptr();
                ptr::slice_from_raw_parts_mut(ptr.add(self.head), self.tail - self.head)
                    .drop_in_place();
            }
        }
        // `store` still owns the heap block, if any; its drop returns it.
    }
}

/// A draining iterator over a positional range of a
/// [`SmallFlatMap`](crate::SmallFlatMap).
///
/// The gap left by the range is repaired from the end of the live range when
/// the iterator is dropped. If the iterator is leaked instead, the map stays
/// valid but the drained range and the tail behind it are lost.
pub struct Drain<'a, const N: usize, K, V, A: Allocator = Global> {
    store: &'a mut Store<N, (K, V), A>,
    /// Cursor pair over the not-yet-yielded part of the range.
    iter_idx: usize,
    iter_end: usize,
    /// Fixed position and length of the kept tail behind the range.
    tail_start: usize,
    tail_len: usize,
}

impl<'a, const N: usize, K, V, A: Allocator> Drain<'a, N, K, V, A> {
    pub(crate) fn new<R>(store: &'a mut Store<N, (K, V), A>, range: R) -> Self
    where
        R: RangeBounds<usize>,
    {
        let len = store.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).expect("drain range out of bounds"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).expect("drain range out of bounds"),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        assert!(start <= end && end <= len, "drain range out of bounds");
        // With the length truncated to the range start, leaking the iterator
        // leaks elements but can never double-drop them.
        unsafe { store.set_len(start) };
        Self {
            store,
            iter_idx: start,
            iter_end: end,
            tail_start: end,
            tail_len: len - end,
        }
    }
}

impl<const N: usize, K, V, A: Allocator> Iterator for Drain<'_, N, K, V, A> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        if self.iter_idx == self.iter_end {
            return None;
        }
        let index = self.iter_idx;
        self.iter_idx += 1;
        Some(unsafe { self.store.as_ptr().add(index).read() })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.iter_end - self.iter_idx;
        (len, Some(len))
    }
}

impl<const N: usize, K, V, A: Allocator> DoubleEndedIterator for Drain<'_, N, K, V, A> {
    #[inline]
    fn next_back(&mut self) -> Option<(K, V)> {
        if self.iter_idx == self.iter_end {
            return None;
        }
        self.iter_end -= 1;
        Some(unsafe { self.store.as_ptr().add(self.iter_end).read() })
    }
}

impl<const N: usize, K, V, A: Allocator> ExactSizeIterator for Drain<'_, N, K, V, A> {
    #[inline]
    fn len(&self) -> usize {
        self.iter_end - self.iter_idx
    }
}

impl<const N: usize, K, V, A: Allocator> FusedIterator for Drain<'_, N, K, V, A> {}

impl<const N: usize, K, V, A: Allocator> Drop for Drain<'_, N, K, V, A> {
    fn drop(&mut self) {
        struct TailGuard<'r, 'a, const N: usize, K, V, A: Allocator> {
            drain: &'r mut Drain<'a, N, K, V, A>,
        }

        impl<const N: usize, K, V, A: Allocator> Drop for TailGuard<'_, '_, N, K, V, A> {
            fn drop(&mut self) {
                let drain = &mut *self.drain;
                unsafe {
                    let start = drain.store.len();
                    let gap = drain.tail_start - start;
                    if drain.tail_len > 0 && gap > 0 {
                        // Backfill with the last `min(tail, gap)` elements;
                        // source and gap never overlap.
                        let count = cmp::min(drain.tail_len, gap);
                        let src = drain.tail_start + drain.tail_len - count;
                        let ptr = drain.store.as_mut_ptr();
                        ptr::copy_nonoverlapping(ptr.add(src), ptr.add(start), count);
                    }
                    drain.store.set_len(start + drain.tail_len);
                }
            }
        }

        let drop_start = self.iter_idx;
        let drop_len = self.iter_end - self.iter_idx;
        self.iter_idx = self.iter_end;
        // The tail is repositioned even if one of the element drops panics.
        let guard = TailGuard { drain: self };
        if <(K, V)>::NEEDS_DROP && drop_len != 0 {
            unsafe {
                let ptr = guard.drain.store.as_mut_ptr();
                ptr::slice_from_raw_parts_mut(ptr.add(drop_start), drop_len).drop_in_place();
            }
        }
    }
}
