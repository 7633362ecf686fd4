use core::{
    cmp,
    mem::MaybeUninit,
    ptr::{self, NonNull},
};

use allocator_api2::alloc::{handle_alloc_error, Allocator};

use crate::{
    raw::{
        self,
        util::{likely, unlikely, SizedTypeProperties},
    },
    TryReserveError,
};

/// Flat element storage with `N` inline slots.
///
/// Elements live in exactly one of two regions: the slot array embedded in
/// the struct itself, or a heap block obtained from `A`. The prefix
/// `[0, len)` of the active region is always initialized; everything past it
/// is spare capacity. There are no interior pointers, so the whole store
/// moves bitwise.
pub(crate) struct Store<const N: usize, T, A: Allocator> {
    len: usize,
    state: State<N, T>,
    alloc: A,
}

enum State<const N: usize, T> {
    /// Elements occupy the embedded slot array. Capacity is `N`.
    Inline([MaybeUninit<T>; N]),
    /// Elements occupy a heap block of `cap` slots.
    Spilled { ptr: NonNull<T>, cap: usize },
}

// `NonNull` suppresses the auto impls; the store owns its elements and the
// heap block is reachable through `&mut self` only.
unsafe impl<const N: usize, T: Send, A: Allocator + Send> Send for Store<N, T, A> {}
unsafe impl<const N: usize, T: Sync, A: Allocator + Sync> Sync for Store<N, T, A> {}

#[inline(never)]
fn infallible<T>(result: Result<T, TryReserveError>) -> T {
    match result {
        Ok(value) => value,
        Err(TryReserveError::CapacityOverflow) => panic!("capacity overflow"),
        Err(TryReserveError::AllocError { layout }) => handle_alloc_error(layout),
    }
}

impl<const N: usize, T, A: Allocator> Store<N, T, A> {
    #[inline]
    pub(crate) const fn new_in(alloc: A) -> Self {
        Self {
            len: 0,
            state: State::Inline(unsafe { MaybeUninit::uninit().assume_init() }),
            alloc,
        }
    }

    #[inline]
    pub(crate) fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut store = Self::new_in(alloc);
        if capacity > N {
            // An exact-size block; the caller asked for this much up front.
            infallible(store.relocate(capacity));
        }
        store
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Forces the length of the live prefix.
    ///
    /// # Safety
    ///
    /// `new_len` must not exceed the capacity and the elements in
    /// `[0, new_len)` must be initialized.
    #[inline]
    pub(crate) unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());
        self.len = new_len;
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        match &self.state {
            State::Inline(_) => N,
            State::Spilled { cap, .. } => *cap,
        }
    }

    #[inline]
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self.state, State::Inline(_))
    }

    #[inline]
    pub(crate) fn max_capacity() -> usize {
        raw::max_capacity::<T>()
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const T {
        match &self.state {
            State::Inline(slots) => slots.as_ptr().cast(),
            State::Spilled { ptr, .. } => ptr.as_ptr(),
        }
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.state {
            State::Inline(slots) => slots.as_mut_ptr().cast(),
            State::Spilled { ptr, .. } => ptr.as_ptr(),
        }
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { core::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// Appends `value`, growing the storage if the live prefix fills the
    /// active region. Returns the index the element landed at.
    #[inline]
    pub(crate) fn push(&mut self, value: T) -> usize {
        if unlikely(self.len == self.capacity()) {
            infallible(self.grow_amortized(1));
        }
        unsafe { self.push_unchecked(value) }
    }

    /// # Safety
    ///
    /// There must be spare capacity for at least one more element.
    #[inline]
    pub(crate) unsafe fn push_unchecked(&mut self, value: T) -> usize {
        debug_assert!(self.len < self.capacity());
        let index = self.len;
        self.as_mut_ptr().add(index).write(value);
        self.len = index + 1;
        index
    }

    /// Removes the element at `index` by moving the last live element into
    /// its place. Removing the last element moves nothing.
    #[inline]
    pub(crate) fn swap_remove(&mut self, index: usize) -> T {
        assert!(index < self.len);
        unsafe {
            let ptr = self.as_mut_ptr();
            let value = ptr.add(index).read();
            self.len -= 1;
            if likely(index != self.len) {
                ptr::copy_nonoverlapping(ptr.add(self.len), ptr.add(index), 1);
            }
            value
        }
    }

    /// Drops every live element. Capacity and storage state are retained.
    #[inline]
    pub(crate) fn clear(&mut self) {
        if T::NEEDS_DROP && self.len != 0 {
            let elems = ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), self.len);
            // The length goes to zero first so a panicking drop cannot
            // double-free on a later call.
            self.len = 0;
            unsafe { elems.drop_in_place() };
        } else {
            self.len = 0;
        }
    }

    #[inline]
    pub(crate) fn reserve(&mut self, additional: usize) {
        if unlikely(additional > self.capacity() - self.len) {
            infallible(self.grow_amortized(additional));
        }
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        if additional <= self.capacity() - self.len {
            return Ok(());
        }
        self.grow_amortized(additional)
    }

    /// Moves into the smallest region that holds the live prefix: the inline
    /// slots if it fits there, an exact-size block otherwise.
    pub(crate) fn shrink_to_fit(&mut self) {
        if self.len < self.capacity() {
            infallible(self.relocate(self.len));
        }
    }

    /// Drops all live elements and reinstalls an empty region of at least
    /// `new_cap` slots (the inline slots when `new_cap <= N`).
    pub(crate) fn reset(&mut self, new_cap: usize) {
        self.clear();
        if self.is_inline() && new_cap <= N {
            return;
        }
        if let State::Spilled { ptr, cap } = &self.state {
            let (ptr, cap) = (*ptr, *cap);
            self.state = State::Inline(unsafe { MaybeUninit::uninit().assume_init() });
            unsafe { raw::dealloc_block(&self.alloc, ptr, cap) };
        }
        // The state already rests on the inline slots, so a failed
        // allocation below leaves the store valid and empty.
        if new_cap > N {
            let ptr = infallible(raw::alloc_block::<T, A>(&self.alloc, new_cap));
            self.state = State::Spilled { ptr, cap: new_cap };
        }
    }

    /// Growth rule: at least double the current length, never below `N`,
    /// clamped to [`max_capacity`](raw::max_capacity).
    #[cold]
    fn grow_amortized(&mut self, additional: usize) -> Result<(), TryReserveError> {
        debug_assert!(additional > self.capacity() - self.len);
        let max = Self::max_capacity();
        if max - self.len < additional {
            return Err(TryReserveError::CapacityOverflow);
        }
        let new_cap = match self.len.checked_add(cmp::max(self.len, additional)) {
            Some(requested) => cmp::min(cmp::max(N, requested), max),
            None => max,
        };
        self.relocate(new_cap)
    }

    /// Moves the live prefix into a region of `new_cap` slots and releases
    /// the old block, if any. The move is bitwise, so the only fallible step
    /// is the allocation itself; on error nothing has changed.
    fn relocate(&mut self, new_cap: usize) -> Result<(), TryReserveError> {
        debug_assert!(new_cap >= self.len);
        if new_cap <= N {
            let (old_ptr, old_cap) = match &self.state {
                State::Inline(_) => return Ok(()),
                State::Spilled { ptr, cap } => (*ptr, *cap),
            };
            let mut slots: [MaybeUninit<T>; N] = unsafe { MaybeUninit::uninit().assume_init() };
            unsafe {
                ptr::copy_nonoverlapping(old_ptr.as_ptr(), slots.as_mut_ptr().cast::<T>(), self.len);
                self.state = State::Inline(slots);
                raw::dealloc_block(&self.alloc, old_ptr, old_cap);
            }
        } else {
            let new_ptr = raw::alloc_block::<T, A>(&self.alloc, new_cap)?;
            unsafe {
                ptr::copy_nonoverlapping(self.as_ptr(), new_ptr.as_ptr(), self.len);
                if let State::Spilled { ptr, cap } = &self.state {
                    raw::dealloc_block(&self.alloc, *ptr, *cap);
                }
                self.state = State::Spilled {
                    ptr: new_ptr,
                    cap: new_cap,
                };
            }
        }
        Ok(())
    }
}

impl<const N: usize, T, A: Allocator> Drop for Store<N, T, A> {
    fn drop(&mut self) {
        struct BlockGuard<'a, T, A: Allocator> {
            ptr: NonNull<T>,
            cap: usize,
            alloc: &'a A,
        }

        impl<T, A: Allocator> Drop for BlockGuard<'_, T, A> {
            fn drop(&mut self) {
                unsafe { raw::dealloc_block(self.alloc, self.ptr, self.cap) };
            }
        }

        let len = self.len;
        let elems = ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), len);
        // The block is returned even if one of the element drops panics.
        let _guard = match &self.state {
            State::Inline(_) => None,
            State::Spilled { ptr, cap } => Some(BlockGuard {
                ptr: *ptr,
                cap: *cap,
                alloc: &self.alloc,
            }),
        };
        if T::NEEDS_DROP && len != 0 {
            unsafe { elems.drop_in_place() };
        }
    }
}

impl<const N: usize, T: Clone, A: Allocator + Clone> Clone for Store<N, T, A> {
    fn clone(&self) -> Self {
        let mut new = Self::with_capacity_in(self.len, self.alloc.clone());
        for value in self.as_slice() {
            // Room was reserved up front; the growing prefix is owned by
            // `new`, so a panicking clone drops what was built so far.
            unsafe { new.push_unchecked(value.clone()) };
        }
        new
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        if source.len > self.capacity() {
            self.reset(source.len);
        }
        for value in source.as_slice() {
            unsafe { self.push_unchecked(value.clone()) };
        }
    }
}
