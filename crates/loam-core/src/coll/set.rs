//! Persistent sets
//!
//! A set is a map from each element to itself. [`APersistentSet`] derives
//! membership, counting, seqs, equality and hashing from that
//! implementation map.

use super::key_seq::KeySeq;
use super::map::{MapHashes, PersistentMap};
use super::transient::TransientHashSet;
use crate::error::Result;
use crate::murmur3;
use crate::seq::Seq;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::hash::BuildHasher;
use std::ops::Deref;
use std::sync::Arc;

/// Read-only membership view used by [`APersistentSet::set_equals`]
pub trait SetLookup {
    /// Number of elements
    fn lookup_count(&self) -> usize;

    /// Whether `key` is an element
    fn lookup_contains(&self, key: &Value) -> bool;
}

/// Contract shared by all persistent sets
pub trait APersistentSet: Send + Sync + Debug {
    /// Backing map, element to element
    fn impl_map(&self) -> &PersistentMap;

    /// Hash caches of this set
    fn hash_caches(&self) -> &MapHashes;

    /// Set with `item` added
    fn conj(&self, item: Value) -> PersistentSet;

    /// Set without `key`
    fn disjoin(&self, key: &Value) -> PersistentSet;

    /// Empty set of the same kind
    fn empty(&self) -> PersistentSet;

    /// Editable copy for batched updates
    fn as_transient(&self) -> TransientHashSet;

    /// Whether `key` is an element
    fn contains(&self, key: &Value) -> bool {
        self.impl_map().contains_key(key)
    }

    /// The stored element equal to `key`
    fn get(&self, key: &Value) -> Option<Value> {
        self.impl_map().val_at(key)
    }

    /// Number of elements
    fn count(&self) -> usize {
        self.impl_map().count()
    }

    /// Seq of elements, `None` when empty
    fn seq(&self) -> Option<Seq> {
        KeySeq::create(self.impl_map().seq())
    }

    /// Iterate elements
    fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        Box::new(self.impl_map().entries().map(|(k, _)| k))
    }

    /// Same count and every element of `self` present in `other`
    fn set_equals(&self, other: &dyn SetLookup) -> bool {
        self.count() == other.lookup_count() && self.iter().all(|k| other.lookup_contains(&k))
    }

    /// Language equality against any value; only sets can match
    ///
    /// # Errors
    /// Never fails; the signature matches map equality
    fn equiv(&self, other: &Value) -> Result<bool> {
        Ok(match other {
            Value::Set(s) => self.set_equals(s),
            _ => false,
        })
    }

    /// Host hash: sum of element hashes, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy elements
    fn hash_code(&self) -> Result<i32> {
        self.hash_caches()
            .hash_code_cache()
            .get_or_try_init(|| -> Result<i32> {
                self.iter().try_fold(0_i32, |hash, k| -> Result<i32> {
                    Ok(hash.wrapping_add(k.hash_code()?))
                })
            })
    }

    /// Unordered Murmur3 hash over elements, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy elements
    fn hasheq(&self) -> Result<i32> {
        self.hash_caches()
            .hasheq_cache()
            .get_or_try_init(|| -> Result<i32> {
                let hashes = self
                    .iter()
                    .map(|k| k.hasheq())
                    .collect::<Result<Vec<_>>>()?;
                Ok(murmur3::hash_unordered(hashes))
            })
    }
}

/// Shared handle to a persistent set
#[derive(Clone, Debug)]
pub struct PersistentSet(Arc<dyn APersistentSet>);

impl PersistentSet {
    /// The empty hash set
    #[must_use]
    pub fn new() -> Self {
        Self::from_impl(PersistentHashSet::default())
    }

    /// Wrap a concrete set
    #[must_use]
    pub fn from_impl(set: impl APersistentSet + 'static) -> Self {
        Self(Arc::new(set))
    }

    /// Hash set of `items`
    #[must_use]
    pub fn hash_set<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let pairs = items.into_iter().map(|item| (item.clone(), item));
        let impl_map = PersistentMap::hash_map(pairs);
        Self::from_impl(PersistentHashSet::from_map(impl_map))
    }

    /// Whether both handles share the same set
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for PersistentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for PersistentSet {
    type Target = dyn APersistentSet;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl SetLookup for PersistentSet {
    fn lookup_count(&self) -> usize {
        self.count()
    }

    fn lookup_contains(&self, key: &Value) -> bool {
        self.contains(key)
    }
}

impl<S: BuildHasher> SetLookup for HashSet<Value, S> {
    fn lookup_count(&self) -> usize {
        self.len()
    }

    fn lookup_contains(&self, key: &Value) -> bool {
        self.contains(key)
    }
}

/// Set over a hash map implementation
#[derive(Clone)]
pub struct PersistentHashSet {
    impl_map: PersistentMap,
    hashes: MapHashes,
}

impl PersistentHashSet {
    /// Set whose elements are the keys of `impl_map`
    ///
    /// Each key must map to itself.
    #[must_use]
    pub fn from_map(impl_map: PersistentMap) -> Self {
        Self {
            impl_map,
            hashes: MapHashes::new(),
        }
    }
}

impl Default for PersistentHashSet {
    fn default() -> Self {
        Self::from_map(PersistentMap::hash_map([]))
    }
}

impl APersistentSet for PersistentHashSet {
    fn impl_map(&self) -> &PersistentMap {
        &self.impl_map
    }

    fn hash_caches(&self) -> &MapHashes {
        &self.hashes
    }

    fn conj(&self, item: Value) -> PersistentSet {
        if self.contains(&item) {
            return PersistentSet::from_impl(self.clone());
        }
        PersistentSet::from_impl(Self::from_map(self.impl_map.assoc(item.clone(), item)))
    }

    fn disjoin(&self, key: &Value) -> PersistentSet {
        PersistentSet::from_impl(Self::from_map(self.impl_map.without(key)))
    }

    fn empty(&self) -> PersistentSet {
        PersistentSet::new()
    }

    fn as_transient(&self) -> TransientHashSet {
        TransientHashSet::new(self.impl_map.as_transient())
    }
}

impl Debug for PersistentHashSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn longs(xs: &[i64]) -> PersistentSet {
        PersistentSet::hash_set(xs.iter().copied().map(Value::Long))
    }

    #[test]
    fn conj_and_disjoin_are_persistent() {
        let a = longs(&[1, 2]);
        let b = a.conj(Value::Long(3));
        let c = b.disjoin(&Value::Long(1));
        assert_eq!(a.count(), 2);
        assert_eq!(b.count(), 3);
        assert_eq!(c.count(), 2);
        assert!(!c.contains(&Value::Long(1)));
        assert!(a.contains(&Value::Long(1)));
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(longs(&[1, 1, 1]).count(), 1);
        assert_eq!(longs(&[1]).conj(Value::Long(1)).count(), 1);
    }

    #[test]
    fn get_returns_stored_element() {
        let s = PersistentSet::hash_set([Value::BigInt(crate::BigInt::from_i64(5))]);
        assert!(matches!(s.get(&Value::Long(5)), Some(Value::BigInt(_))));
    }

    #[test]
    fn equality_and_hash_ignore_order() {
        let a = longs(&[1, 2, 3]);
        let b = longs(&[3, 2, 1]);
        assert_eq!(Value::Set(a.clone()), Value::Set(b.clone()));
        assert_eq!(a.hasheq().unwrap(), 439_094_965);
        assert_eq!(a.hasheq().unwrap(), b.hasheq().unwrap());
        assert_eq!(a.hash_code().unwrap(), 6);
    }

    #[test]
    fn equality_against_host_set() {
        let a = longs(&[1, 2]);
        let host: HashSet<Value> = [Value::Long(1), Value::Long(2)].into_iter().collect();
        assert!(a.set_equals(&host));
        assert!(!longs(&[1]).set_equals(&host));
    }

    #[test]
    fn sets_are_not_sequential() {
        let s = longs(&[1]);
        assert!(!s.equiv(&Value::vector([Value::Long(1)])).unwrap());
    }

    #[test]
    fn seq_lists_elements() {
        let mut items: Vec<i64> = crate::seq::iter(longs(&[4, 5, 6]).seq())
            .map(|v| match v.unwrap() {
                Value::Long(n) => n,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        items.sort_unstable();
        assert_eq!(items, vec![4, 5, 6]);
        assert!(PersistentSet::new().seq().is_none());
    }
}
