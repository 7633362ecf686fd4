// Branch prediction hint. This is currently only available on nightly but it
// consistently improves performance by 10-15%.
#[cfg(not(feature = "nightly"))]
pub(crate) use core::convert::identity as likely;
#[cfg(not(feature = "nightly"))]
pub(crate) use core::convert::identity as unlikely;
#[cfg(feature = "nightly")]
pub(crate) use core::intrinsics::{likely, unlikely};
use core::mem;

use crate::Equivalence;

/// Ensures that a single closure type across uses of this which, in turn prevents multiple
/// instances of any functions like SmallFlatMap::get_index_of from being generated
#[inline]
pub(crate) fn probe_key<'a, E, Q, K, V>(eq: &'a E, probe: &'a Q) -> impl Fn(&(K, V)) -> bool + 'a
where
    Q: ?Sized,
    E: Equivalence<K, Q>,
{
    move |x| eq.equivalent(probe, &x.0)
}

pub(crate) trait SizedTypeProperties: Sized {
    const IS_ZERO_SIZED: bool = mem::size_of::<Self>() == 0;
    const NEEDS_DROP: bool = mem::needs_drop::<Self>();
}

impl<T> SizedTypeProperties for T {}
