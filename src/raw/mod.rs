pub(crate) mod util;

use core::{alloc::Layout, mem, ptr::NonNull};

use allocator_api2::alloc::Allocator;

use crate::{raw::util::SizedTypeProperties, TryReserveError};

/// Largest number of `T` a single region may hold: allocations are capped at
/// `isize::MAX` bytes. Zero-sized `T` is only bounded by the address space.
pub(crate) const fn max_capacity<T>() -> usize {
    if T::IS_ZERO_SIZED {
        usize::MAX
    } else {
        isize::MAX as usize / mem::size_of::<T>()
    }
}

/// Allocates an uninitialized block with room for `cap` values of `T`.
#[inline]
pub(crate) fn alloc_block<T, A>(alloc: &A, cap: usize) -> Result<NonNull<T>, TryReserveError>
where
    A: Allocator,
{
    let layout = match Layout::array::<T>(cap) {
        Ok(layout) => layout,
        Err(_) => return Err(TryReserveError::CapacityOverflow),
    };
    match alloc.allocate(layout) {
        Ok(block) => Ok(block.cast()),
        Err(_) => Err(TryReserveError::AllocError { layout }),
    }
}

/// Returns a block to the allocator.
///
/// # Safety
///
/// `ptr` must denote a live block of exactly `cap` values of `T` previously
/// obtained from `alloc_block` with the same allocator.
#[inline]
pub(crate) unsafe fn dealloc_block<T, A>(alloc: &A, ptr: NonNull<T>, cap: usize)
where
    A: Allocator,
{
    // The layout was validated when the block was allocated.
    let layout = Layout::array::<T>(cap).unwrap_unchecked();
    alloc.deallocate(ptr.cast(), layout);
}
