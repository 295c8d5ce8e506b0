//! Persistent collections
//!
//! Maps, sets, vectors and queues that never change once built. Every
//! "modifying" operation returns a new collection sharing structure with the
//! old one. Maps and sets also expose a transient builder for batched
//! construction; see [`transient`].
//!
//! # Overview
//!
//! - [`APersistentMap`] / [`PersistentMap`]: map contract and shared handle
//! - [`APersistentSet`] / [`PersistentSet`]: set contract over an implementation map
//! - [`PersistentVector`]: indexed collection with a chunked seq
//! - [`PersistentQueue`]: FIFO queue used by agents
//! - [`KeySeq`] / [`ValSeq`]: projections over a map's entry seq
//! - [`EntryShape`]: the argument shapes accepted by map `conj`

mod entry;
mod key_seq;
mod map;
mod queue;
mod set;
pub mod transient;
mod vector;

pub use entry::{EntryShape, MapEntry};
pub use key_seq::{KeySeq, ValSeq};
pub use map::{
    APersistentMap, MapHashes, MapLookup, PersistentArrayMap, PersistentHashMap, PersistentMap,
    HASHTABLE_THRESHOLD,
};
pub use queue::PersistentQueue;
pub use set::{APersistentSet, PersistentHashSet, PersistentSet, SetLookup};
pub use transient::{ATransientMap, ATransientSet, TransientHashMap, TransientHashSet};
pub use vector::PersistentVector;

use crate::error::{Error, Result};
use crate::seq::Seq;
use crate::value::Value;

/// Host-style mutators, all of which fail on persistent structures
///
/// Callers that treat a persistent collection as a mutable host container
/// get [`Error::Immutable`] instead of a silent copy.
pub trait MutableCollection {
    /// Kind named in the error message
    const KIND: &'static str;

    /// # Errors
    /// Always [`Error::Immutable`]
    fn add(&mut self, _item: Value) -> Result<bool> {
        Err(Error::Immutable { kind: Self::KIND })
    }

    /// # Errors
    /// Always [`Error::Immutable`]
    fn remove(&mut self, _item: &Value) -> Result<bool> {
        Err(Error::Immutable { kind: Self::KIND })
    }

    /// # Errors
    /// Always [`Error::Immutable`]
    fn clear(&mut self) -> Result<()> {
        Err(Error::Immutable { kind: Self::KIND })
    }

    /// # Errors
    /// Always [`Error::Immutable`]
    fn insert(&mut self, _key: Value, _val: Value) -> Result<Option<Value>> {
        Err(Error::Immutable { kind: Self::KIND })
    }

    /// # Errors
    /// Always [`Error::Immutable`]
    fn set_at(&mut self, _index: usize, _val: Value) -> Result<Value> {
        Err(Error::Immutable { kind: Self::KIND })
    }
}

impl MutableCollection for Seq {
    const KIND: &'static str = "sequence";
}

impl MutableCollection for PersistentVector {
    const KIND: &'static str = "vector";
}

impl MutableCollection for PersistentMap {
    const KIND: &'static str = "map";
}

impl MutableCollection for PersistentSet {
    const KIND: &'static str = "set";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq;

    #[test]
    fn host_mutators_fail() {
        let mut map = PersistentMap::new();
        assert!(matches!(
            map.insert(Value::Long(1), Value::Long(2)),
            Err(Error::Immutable { kind: "map" })
        ));
        let mut set = PersistentSet::new();
        assert!(matches!(set.add(Value::Nil), Err(Error::Immutable { kind: "set" })));
        let mut v = PersistentVector::new();
        assert!(matches!(v.clear(), Err(Error::Immutable { kind: "vector" })));
        let mut s = seq::list([Value::Long(1)]);
        assert!(matches!(
            s.remove(&Value::Long(1)),
            Err(Error::Immutable { kind: "sequence" })
        ));
        assert!(s.set_at(0, Value::Nil).unwrap_err().is_usage_error());
        assert_eq!(map.count(), 0);
    }
}
