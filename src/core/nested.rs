// Generic recursive container keyed by any hashable type.
use std::collections::HashMap;
use std::hash::Hash;

use crate::core::access::NestedMap;

/// A scalar, a sequence, or a mapping of further `Nested` values.
///
/// Only the `Map` variant is indexable through [`NestedMap`]; shapes may be
/// mixed freely at any depth.
#[derive(Clone, Debug)]
pub enum Nested<K, V> {
    Scalar(V),
    Seq(Vec<Nested<K, V>>),
    Map(HashMap<K, Nested<K, V>>),
}

impl<K, V> Nested<K, V>
where
    K: Hash + Eq,
{
    pub fn scalar(value: V) -> Self {
        Nested::Scalar(value)
    }

    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Nested<K, V>)>,
    {
        Nested::Map(entries.into_iter().collect())
    }

    pub fn as_scalar(&self) -> Option<&V> {
        match self {
            Nested::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<K, Nested<K, V>>> {
        match self {
            Nested::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl<K, V> PartialEq for Nested<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Nested::Scalar(a), Nested::Scalar(b)) => a == b,
            (Nested::Seq(a), Nested::Seq(b)) => a == b,
            (Nested::Map(a), Nested::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<K, V> NestedMap for Nested<K, V>
where
    K: Hash + Eq,
{
    type Key = K;

    fn child(&self, key: &K) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }
}
