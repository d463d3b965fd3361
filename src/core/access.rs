// Path traversal over nested mappings with first-missing-key reporting.
use std::borrow::Borrow;
use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// A value that may hold child values addressable by key.
///
/// `child` returns `None` both when the key is absent and when `self` is not
/// mapping-like at all (a scalar or a sequence).
pub trait NestedMap {
    type Key: ?Sized;

    fn child(&self, key: &Self::Key) -> Option<&Self>;
}

impl NestedMap for Value {
    type Key = str;

    fn child(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }
}

/// The first key along a path that could not be resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissingKey<K> {
    key: K,
}

impl<K> MissingKey<K> {
    pub fn new(key: K) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K: fmt::Debug> fmt::Display for MissingKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing key: {:?}", self.key)
    }
}

impl<K: fmt::Debug> StdError for MissingKey<K> {}

impl<K: fmt::Display> From<MissingKey<K>> for Error {
    fn from(err: MissingKey<K>) -> Self {
        Error::new(ErrorKind::NotFound)
            .with_message("missing key")
            .with_key(err.key.to_string())
    }
}

/// Walks `path` from `map`, returning the value at its end.
///
/// An empty path yields `map` itself. Traversal stops at the first key that
/// the current value cannot resolve, and that key is returned in the error.
pub fn access_nested_map<'a, M, K>(map: &'a M, path: &[K]) -> Result<&'a M, MissingKey<K>>
where
    M: NestedMap,
    K: Borrow<M::Key> + Clone,
{
    let mut cursor = map;
    for key in path {
        cursor = cursor
            .child(key.borrow())
            .ok_or_else(|| MissingKey::new(key.clone()))?;
    }
    Ok(cursor)
}
