use equivalent::Equivalent;

/// Key comparison strategy of a [`SmallFlatMap`](crate::SmallFlatMap).
///
/// The strategy is owned by the map, so it may carry state (a collation
/// table, a tolerance, ...). The probe type `Q` is whatever the caller hands
/// to lookup methods and may differ from the stored key type `K`;
/// implementing the trait for several probe types makes the strategy
/// "transparent": the map can be searched without materializing a full key.
///
/// Implementations must form an equivalence relation per probe type, and all
/// probe types must agree on which stored keys are equal. The map does not
/// verify this.
///
/// ```
/// use small_flat_map::{Equivalence, SmallFlatMap};
///
/// struct AsciiCaseless;
///
/// impl Equivalence<String> for AsciiCaseless {
///     fn equivalent(&self, probe: &String, key: &String) -> bool {
///         probe.eq_ignore_ascii_case(key)
///     }
/// }
///
/// impl Equivalence<String, str> for AsciiCaseless {
///     fn equivalent(&self, probe: &str, key: &String) -> bool {
///         probe.eq_ignore_ascii_case(key)
///     }
/// }
///
/// let mut map = SmallFlatMap::<4, String, u32, AsciiCaseless>::with_equivalence(AsciiCaseless);
/// map.insert("Torte".to_string(), 3);
/// assert_eq!(map.get("TORTE"), Some(&3));
/// assert!(map.contains_key(&"torte".to_string()));
/// ```
pub trait Equivalence<K, Q: ?Sized = K> {
    /// Returns `true` if `probe` identifies `key`.
    fn equivalent(&self, probe: &Q, key: &K) -> bool;
}

/// The default comparison strategy: delegates to [`Equivalent`], which falls
/// back to `Eq` through `Borrow`.
///
/// With this strategy a `SmallFlatMap<N, String, V>` accepts `&str` probes
/// and a `SmallFlatMap<N, Vec<u8>, V>` accepts `&[u8]` probes, without any
/// temporary allocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEquality;

impl<K, Q> Equivalence<K, Q> for DefaultEquality
where
    Q: Equivalent<K> + ?Sized,
{
    #[inline]
    fn equivalent(&self, probe: &Q, key: &K) -> bool {
        probe.equivalent(key)
    }
}
