//! Persistent maps
//!
//! [`APersistentMap`] is the contract every map implements: concrete maps
//! supply lookup, update and iteration, and the trait derives equality,
//! hashing and the key/value projections from those. [`PersistentMap`] is
//! the shared handle stored in [`Value::Map`].
//!
//! Two implementations ship here. [`PersistentArrayMap`] keeps up to
//! [`HASHTABLE_THRESHOLD`] entries in insertion order and is searched
//! linearly; assoc past that size promotes to a [`PersistentHashMap`].

use super::entry::{EntryShape, MapEntry};
use super::key_seq::{KeySeq, ValSeq};
use super::transient::TransientHashMap;
use crate::error::Result;
use crate::hash::HashCache;
use crate::murmur3;
use crate::seq::{self, Seq};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::hash::BuildHasher;
use std::ops::Deref;
use std::sync::Arc;

/// Entries an array map holds before assoc promotes it to a hash map
pub const HASHTABLE_THRESHOLD: usize = 8;

/// Cached hashes carried by maps and sets (sentinel `-1`)
#[derive(Debug, Clone)]
pub struct MapHashes {
    hasheq: HashCache,
    hash_code: HashCache,
}

impl MapHashes {
    /// Empty caches
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasheq: HashCache::for_map(),
            hash_code: HashCache::for_map(),
        }
    }

    /// Murmur3 hash cache
    #[inline]
    #[must_use]
    pub const fn hasheq_cache(&self) -> &HashCache {
        &self.hasheq
    }

    /// Host hash cache
    #[inline]
    #[must_use]
    pub const fn hash_code_cache(&self) -> &HashCache {
        &self.hash_code
    }
}

impl Default for MapHashes {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only dictionary view used by [`APersistentMap::map_equals`]
pub trait MapLookup {
    /// Number of entries
    fn lookup_count(&self) -> usize;

    /// Value stored under `key`
    fn lookup(&self, key: &Value) -> Option<Value>;
}

/// Contract shared by all persistent maps
pub trait APersistentMap: Send + Sync + Debug {
    /// Number of entries
    fn count(&self) -> usize;

    /// Entry stored under `key`
    fn entry_at(&self, key: &Value) -> Option<MapEntry>;

    /// Map with `key` bound to `val`
    fn assoc(&self, key: Value, val: Value) -> PersistentMap;

    /// Map without `key`
    fn without(&self, key: &Value) -> PersistentMap;

    /// Iterate entries as `(key, val)` pairs
    fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)> + '_>;

    /// Empty map of the same kind
    fn empty(&self) -> PersistentMap;

    /// Hash caches of this map
    fn hash_caches(&self) -> &MapHashes;

    /// Editable copy for batched updates
    fn as_transient(&self) -> TransientHashMap;

    /// Seq of entries, each a two-element vector; `None` when empty
    fn seq(&self) -> Option<Seq> {
        seq::from_vec(
            self.entries()
                .map(|(k, v)| Value::vector([k, v]))
                .collect(),
        )
    }

    /// Value stored under `key`
    fn val_at(&self, key: &Value) -> Option<Value> {
        self.entry_at(key).map(|entry| entry.val().clone())
    }

    /// Value stored under `key`, or `not_found`
    fn val_at_or(&self, key: &Value, not_found: Value) -> Value {
        self.val_at(key).unwrap_or(not_found)
    }

    /// Whether `key` is bound
    fn contains_key(&self, key: &Value) -> bool {
        self.entry_at(key).is_some()
    }

    /// Dictionary equality: same count, and every entry found in `other`
    ///
    /// # Errors
    /// Propagates failures comparing lazy values
    fn map_equals(&self, other: &dyn MapLookup) -> Result<bool> {
        if self.count() != other.lookup_count() {
            return Ok(false);
        }
        for (key, val) in self.entries() {
            let Some(found) = other.lookup(&key) else {
                return Ok(false);
            };
            if !val.equiv(&found)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Language equality against any value; only maps can match
    ///
    /// # Errors
    /// Propagates failures comparing lazy values
    fn equiv(&self, other: &Value) -> Result<bool> {
        match other {
            Value::Map(m) => self.map_equals(m),
            _ => Ok(false),
        }
    }

    /// Host hash: sum of `hash(k) ^ hash(v)`, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy values
    fn hash_code(&self) -> Result<i32> {
        self.hash_caches()
            .hash_code
            .get_or_try_init(|| -> Result<i32> {
                self.entries().try_fold(0_i32, |hash, (k, v)| -> Result<i32> {
                    Ok(hash.wrapping_add(k.hash_code()? ^ v.hash_code()?))
                })
            })
    }

    /// Unordered Murmur3 hash over entries, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy values
    fn hasheq(&self) -> Result<i32> {
        self.hash_caches()
            .hasheq
            .get_or_try_init(|| -> Result<i32> {
                let hashes = self
                    .entries()
                    .map(|(k, v)| -> Result<i32> {
                        Ok(murmur3::hash_ordered([k.hasheq()?, v.hasheq()?]))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(murmur3::hash_unordered(hashes))
            })
    }

    /// Seq of keys
    fn keys(&self) -> Option<Seq> {
        KeySeq::create(self.seq())
    }

    /// Seq of values
    fn vals(&self) -> Option<Seq> {
        ValSeq::create(self.seq())
    }
}

/// Shared handle to a persistent map
#[derive(Clone, Debug)]
pub struct PersistentMap(Arc<dyn APersistentMap>);

impl PersistentMap {
    /// The empty array map
    #[must_use]
    pub fn new() -> Self {
        Self::from_impl(PersistentArrayMap::default())
    }

    /// Wrap a concrete map
    #[must_use]
    pub fn from_impl(map: impl APersistentMap + 'static) -> Self {
        Self(Arc::new(map))
    }

    /// Hash map from pairs; later keys win
    #[must_use]
    pub fn hash_map<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Self::from_impl(PersistentHashMap::from_im(pairs.into_iter().collect()))
    }

    /// Array map from pairs, promoting when the distinct keys exceed the threshold
    #[must_use]
    pub fn array_map<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |map, (k, v)| map.assoc(k, v))
    }

    /// Add entries of any accepted shape
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] for malformed entries
    pub fn conj(&self, shape: EntryShape) -> Result<Self> {
        Ok(shape
            .into_pairs("conj")?
            .into_iter()
            .fold(self.clone(), |map, (k, v)| map.assoc(k, v)))
    }

    /// Add entries given as a dynamic value (pair vector, map, seq of pairs)
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] for anything else
    pub fn cons(&self, item: &Value) -> Result<Self> {
        self.conj(EntryShape::classify(item)?)
    }

    /// Whether both handles share the same map
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for PersistentMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for PersistentMap {
    type Target = dyn APersistentMap;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl MapLookup for PersistentMap {
    fn lookup_count(&self) -> usize {
        self.count()
    }

    fn lookup(&self, key: &Value) -> Option<Value> {
        self.val_at(key)
    }
}

impl<S: BuildHasher> MapLookup for HashMap<Value, Value, S> {
    fn lookup_count(&self) -> usize {
        self.len()
    }

    fn lookup(&self, key: &Value) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Hash map over an `im` HAMT
#[derive(Clone, Default)]
pub struct PersistentHashMap {
    map: im::HashMap<Value, Value>,
    hashes: MapHashes,
}

impl PersistentHashMap {
    /// Wrap an `im` map
    #[must_use]
    pub fn from_im(map: im::HashMap<Value, Value>) -> Self {
        Self {
            map,
            hashes: MapHashes::new(),
        }
    }
}

impl APersistentMap for PersistentHashMap {
    fn count(&self) -> usize {
        self.map.len()
    }

    fn entry_at(&self, key: &Value) -> Option<MapEntry> {
        self.map
            .get_key_value(key)
            .map(|(k, v)| MapEntry::new(k.clone(), v.clone()))
    }

    fn assoc(&self, key: Value, val: Value) -> PersistentMap {
        PersistentMap::from_impl(Self::from_im(self.map.update(key, val)))
    }

    fn without(&self, key: &Value) -> PersistentMap {
        PersistentMap::from_impl(Self::from_im(self.map.without(key)))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)> + '_> {
        Box::new(self.map.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    fn empty(&self) -> PersistentMap {
        PersistentMap::from_impl(Self::default())
    }

    fn hash_caches(&self) -> &MapHashes {
        &self.hashes
    }

    fn as_transient(&self) -> TransientHashMap {
        TransientHashMap::new(self.map.clone())
    }
}

impl Debug for PersistentHashMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

/// Small map searched linearly, kept in insertion order
#[derive(Clone)]
pub struct PersistentArrayMap {
    array: Arc<[(Value, Value)]>,
    hashes: MapHashes,
}

impl PersistentArrayMap {
    fn from_vec(array: Vec<(Value, Value)>) -> Self {
        Self {
            array: array.into(),
            hashes: MapHashes::new(),
        }
    }

    fn index_of(&self, key: &Value) -> Option<usize> {
        self.array.iter().position(|(k, _)| k == key)
    }
}

impl Default for PersistentArrayMap {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl APersistentMap for PersistentArrayMap {
    fn count(&self) -> usize {
        self.array.len()
    }

    fn entry_at(&self, key: &Value) -> Option<MapEntry> {
        self.index_of(key).map(|i| {
            let (k, v) = &self.array[i];
            MapEntry::new(k.clone(), v.clone())
        })
    }

    fn assoc(&self, key: Value, val: Value) -> PersistentMap {
        let mut array = self.array.to_vec();
        match self.index_of(&key) {
            Some(i) => array[i].1 = val,
            None if array.len() >= HASHTABLE_THRESHOLD => {
                tracing::trace!(count = array.len(), "promoting array map to hash map");
                array.push((key, val));
                return PersistentMap::hash_map(array);
            }
            None => array.push((key, val)),
        }
        PersistentMap::from_impl(Self::from_vec(array))
    }

    fn without(&self, key: &Value) -> PersistentMap {
        match self.index_of(key) {
            Some(i) => {
                let mut array = self.array.to_vec();
                array.remove(i);
                PersistentMap::from_impl(Self::from_vec(array))
            }
            None => PersistentMap::from_impl(self.clone()),
        }
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)> + '_> {
        Box::new(self.array.iter().cloned())
    }

    fn empty(&self) -> PersistentMap {
        PersistentMap::new()
    }

    fn hash_caches(&self) -> &MapHashes {
        &self.hashes
    }

    fn as_transient(&self) -> TransientHashMap {
        TransientHashMap::new(self.array.iter().cloned().collect())
    }
}

impl Debug for PersistentArrayMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.array.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn kv(pairs: &[(&str, i64)]) -> Vec<(Value, Value)> {
        pairs
            .iter()
            .map(|(k, v)| (Value::keyword(k), Value::Long(*v)))
            .collect()
    }

    #[test]
    fn assoc_returns_new_map() {
        let a = PersistentMap::array_map(kv(&[("a", 1)]));
        let b = a.assoc(Value::keyword("b"), Value::Long(2));
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 2);
        assert_eq!(a.val_at(&Value::keyword("b")), None);
        assert_eq!(b.val_at(&Value::keyword("b")), Some(Value::Long(2)));
    }

    #[test]
    fn array_map_keeps_insertion_order() {
        let m = PersistentMap::array_map(kv(&[("z", 1), ("a", 2), ("m", 3)]));
        let keys: Vec<Value> = seq::iter(m.keys()).collect::<Result<_>>().unwrap();
        assert_eq!(keys, vec![Value::keyword("z"), Value::keyword("a"), Value::keyword("m")]);
        let vals: Vec<Value> = seq::iter(m.vals()).collect::<Result<_>>().unwrap();
        assert_eq!(vals, vec![Value::Long(1), Value::Long(2), Value::Long(3)]);
    }

    #[test]
    fn array_map_promotes_past_threshold() {
        let pairs = (0..=8).map(|i| (Value::Long(i), Value::Long(i * 10)));
        let m = PersistentMap::array_map(pairs);
        assert_eq!(m.count(), 9);
        assert_eq!(m.val_at(&Value::Long(8)), Some(Value::Long(80)));
    }

    #[test]
    fn equality_ignores_implementation() {
        let pairs = kv(&[("a", 1), ("b", 2)]);
        let array = PersistentMap::array_map(pairs.clone());
        let hash = PersistentMap::hash_map(pairs.into_iter().rev());
        assert_eq!(Value::Map(array.clone()), Value::Map(hash.clone()));
        assert_eq!(array.hasheq().unwrap(), hash.hasheq().unwrap());
        assert_eq!(array.hash_code().unwrap(), hash.hash_code().unwrap());
    }

    #[test]
    fn equality_against_host_map() {
        let m = PersistentMap::hash_map(kv(&[("a", 1)]));
        let mut host = HashMap::new();
        host.insert(Value::keyword("a"), Value::Long(1));
        assert!(m.map_equals(&host).unwrap());
        host.insert(Value::keyword("b"), Value::Long(2));
        assert!(!m.map_equals(&host).unwrap());
    }

    #[test]
    fn only_maps_are_equivalent() {
        let m = PersistentMap::new();
        assert!(!m.equiv(&Value::vector([])).unwrap());
        assert!(m.equiv(&Value::Map(PersistentMap::hash_map([]))).unwrap());
    }

    #[test]
    fn cons_accepts_pairs_and_maps() {
        let m = PersistentMap::new()
            .cons(&Value::vector([Value::keyword("a"), Value::Long(1)]))
            .unwrap()
            .cons(&Value::Map(PersistentMap::hash_map(kv(&[("b", 2)]))))
            .unwrap();
        assert_eq!(m.count(), 2);
        let err = m.cons(&Value::vector([Value::Long(1), Value::Long(2), Value::Long(3)]));
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn empty_map_hashes() {
        let m = PersistentMap::new();
        assert_eq!(m.hasheq().unwrap(), -15_128_758);
        assert_eq!(m.hash_code().unwrap(), 0);
        assert!(m.seq().is_none());
    }

    #[test]
    fn without_missing_key_is_noop() {
        let m = PersistentMap::array_map(kv(&[("a", 1)]));
        assert_eq!(m.without(&Value::keyword("x")).count(), 1);
        assert_eq!(m.without(&Value::keyword("a")).count(), 0);
    }
}
