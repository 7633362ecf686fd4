use core::{fmt, marker::PhantomData};

use allocator_api2::alloc::Allocator;
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{Equivalence, SmallFlatMap};

mod size_hint {
    use core::cmp;

    /// This presumably exists to prevent denial of service attacks.
    ///
    /// Original discussion: https://github.com/serde-rs/serde/issues/1114.
    #[inline]
    pub(super) fn cautious(hint: Option<usize>) -> usize {
        cmp::min(hint.unwrap_or(0), 4096)
    }
}

impl<const N: usize, K, V, E, A> Serialize for SmallFlatMap<N, K, V, E, A>
where
    K: Serialize,
    V: Serialize,
    A: Allocator,
{
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self)
    }
}

impl<'de, const N: usize, K, V, E, A> Deserialize<'de> for SmallFlatMap<N, K, V, E, A>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    E: Equivalence<K> + Default,
    A: Allocator + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor<const N: usize, K, V, E, A: Allocator> {
            marker: PhantomData<SmallFlatMap<N, K, V, E, A>>,
        }

        impl<'de, const N: usize, K, V, E, A> Visitor<'de> for MapVisitor<N, K, V, E, A>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
            E: Equivalence<K> + Default,
            A: Allocator + Default,
        {
            type Value = SmallFlatMap<N, K, V, E, A>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map")
            }

            #[inline]
            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut values = SmallFlatMap::with_capacity_and_equivalence_in(
                    size_hint::cautious(map.size_hint()),
                    E::default(),
                    A::default(),
                );

                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }

                Ok(values)
            }
        }

        let visitor = MapVisitor {
            marker: PhantomData,
        };
        deserializer.deserialize_map(visitor)
    }
}
