//! Transient maps and sets
//!
//! A transient is a single-owner editable copy of a persistent collection,
//! used to build a large collection without allocating a new version per
//! update. Its life has two states:
//!
//! 1. **Editable**: created by `as_transient()`; updated in place
//! 2. **Sealed**: after one call to `persistent()`, which hands back the
//!    finished persistent collection
//!
//! Every operation checks the state first. Anything called on a sealed
//! transient fails with [`Error::TransientSealed`], a usage error, and leaves
//! the collection it produced untouched. Operations take `&mut self`, so the
//! borrow checker enforces the single writer.
//!
//! # Example
//!
//! ```
//! use loam_core::coll::{APersistentMap, ATransientMap, PersistentMap};
//! use loam_core::Value;
//!
//! let mut t = PersistentMap::new().as_transient();
//! t.assoc(Value::keyword("a"), Value::Long(1))?
//!     .assoc(Value::keyword("b"), Value::Long(2))?;
//! let m = t.persistent()?;
//! assert_eq!(m.count(), 2);
//! assert!(t.assoc(Value::keyword("c"), Value::Long(3)).is_err());
//! # Ok::<(), loam_core::Error>(())
//! ```

use super::entry::EntryShape;
use super::map::{PersistentHashMap, PersistentMap};
use super::set::{PersistentHashSet, PersistentSet};
use crate::error::{Error, Result};
use crate::value::Value;

/// Editable map protocol
///
/// Implementors supply the unchecked `do_*` operations and the editability
/// test; the provided methods check the state before delegating.
pub trait ATransientMap {
    /// Fail unless still editable
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn ensure_editable(&self) -> Result<()>;

    /// Bind `key` to `val` in place
    fn do_assoc(&mut self, key: Value, val: Value);

    /// Remove `key` in place
    fn do_without(&mut self, key: &Value);

    /// Value under `key`
    fn do_val_at(&self, key: &Value) -> Option<Value>;

    /// Number of entries
    fn do_count(&self) -> usize;

    /// Seal and hand back the contents
    fn do_persistent(&mut self) -> PersistentMap;

    /// Bind `key` to `val`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn assoc(&mut self, key: Value, val: Value) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.ensure_editable()?;
        self.do_assoc(key, val);
        Ok(self)
    }

    /// Remove `key`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn without(&mut self, key: &Value) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.ensure_editable()?;
        self.do_without(key);
        Ok(self)
    }

    /// Value under `key`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn val_at(&self, key: &Value) -> Result<Option<Value>> {
        self.ensure_editable()?;
        Ok(self.do_val_at(key))
    }

    /// Number of entries
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn count(&self) -> Result<usize> {
        self.ensure_editable()?;
        Ok(self.do_count())
    }

    /// Add entries of any accepted shape
    ///
    /// The whole argument is validated before anything is written.
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`, or
    /// [`Error::InvalidArgument`] for malformed entries
    fn conj(&mut self, shape: EntryShape) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.ensure_editable()?;
        for (key, val) in shape.into_pairs("conj")? {
            self.do_assoc(key, val);
        }
        Ok(self)
    }

    /// Add entries given as a dynamic value
    ///
    /// # Errors
    /// As [`ATransientMap::conj`], plus [`Error::InvalidArgument`] for values
    /// that are not entry-like at all
    fn conj_value(&mut self, item: &Value) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.ensure_editable()?;
        self.conj(EntryShape::classify(item)?)
    }

    /// Seal the transient and return the persistent map
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] if already sealed
    fn persistent(&mut self) -> Result<PersistentMap> {
        self.ensure_editable()?;
        Ok(self.do_persistent())
    }
}

/// Editable hash map
#[derive(Debug, Clone)]
pub struct TransientHashMap {
    map: im::HashMap<Value, Value>,
    editable: bool,
}

impl TransientHashMap {
    /// Editable copy of `map`; the source is shared, not mutated
    #[must_use]
    pub fn new(map: im::HashMap<Value, Value>) -> Self {
        Self {
            map,
            editable: true,
        }
    }
}

impl ATransientMap for TransientHashMap {
    fn ensure_editable(&self) -> Result<()> {
        if self.editable {
            Ok(())
        } else {
            Err(Error::TransientSealed)
        }
    }

    fn do_assoc(&mut self, key: Value, val: Value) {
        self.map.insert(key, val);
    }

    fn do_without(&mut self, key: &Value) {
        self.map.remove(key);
    }

    fn do_val_at(&self, key: &Value) -> Option<Value> {
        self.map.get(key).cloned()
    }

    fn do_count(&self) -> usize {
        self.map.len()
    }

    fn do_persistent(&mut self) -> PersistentMap {
        self.editable = false;
        PersistentMap::from_impl(PersistentHashMap::from_im(std::mem::take(&mut self.map)))
    }
}

/// Editable set protocol over an editable implementation map
pub trait ATransientSet {
    /// Editable map backing the set
    type Impl: ATransientMap;

    /// Backing map
    fn impl_map(&self) -> &Self::Impl;

    /// Backing map, mutably
    fn impl_map_mut(&mut self) -> &mut Self::Impl;

    /// Persistent set over a sealed implementation map
    fn wrap(&self, impl_map: PersistentMap) -> PersistentSet;

    /// Add `item`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn conj(&mut self, item: Value) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.impl_map_mut().assoc(item.clone(), item)?;
        Ok(self)
    }

    /// Remove `key`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn disjoin(&mut self, key: &Value) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.impl_map_mut().without(key)?;
        Ok(self)
    }

    /// Whether `key` is an element
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn contains(&self, key: &Value) -> Result<bool> {
        Ok(self.impl_map().val_at(key)?.is_some())
    }

    /// The stored element equal to `key`
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn get(&self, key: &Value) -> Result<Option<Value>> {
        self.impl_map().val_at(key)
    }

    /// Number of elements
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] after `persistent()`
    fn count(&self) -> Result<usize> {
        self.impl_map().count()
    }

    /// Seal the transient and return the persistent set
    ///
    /// # Errors
    /// Returns [`Error::TransientSealed`] if already sealed
    fn persistent(&mut self) -> Result<PersistentSet> {
        let sealed = self.impl_map_mut().persistent()?;
        Ok(self.wrap(sealed))
    }
}

/// Editable hash set
#[derive(Debug, Clone)]
pub struct TransientHashSet {
    impl_map: TransientHashMap,
}

impl TransientHashSet {
    /// Set over an editable element-to-element map
    #[must_use]
    pub fn new(impl_map: TransientHashMap) -> Self {
        Self { impl_map }
    }
}

impl ATransientSet for TransientHashSet {
    type Impl = TransientHashMap;

    fn impl_map(&self) -> &Self::Impl {
        &self.impl_map
    }

    fn impl_map_mut(&mut self) -> &mut Self::Impl {
        &mut self.impl_map
    }

    fn wrap(&self, impl_map: PersistentMap) -> PersistentSet {
        PersistentSet::from_impl(PersistentHashSet::from_map(impl_map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coll::{APersistentMap, APersistentSet};
    use pretty_assertions::assert_eq;

    fn k(name: &str) -> Value {
        Value::keyword(name)
    }

    #[test]
    fn source_map_is_untouched() {
        let source = PersistentMap::hash_map([(k("a"), Value::Long(1))]);
        let mut t = source.as_transient();
        t.assoc(k("b"), Value::Long(2)).unwrap();
        t.without(&k("a")).unwrap();
        assert_eq!(source.count(), 1);
        assert_eq!(source.val_at(&k("a")), Some(Value::Long(1)));
        assert_eq!(t.count().unwrap(), 1);
    }

    #[test]
    fn sealed_transient_rejects_everything() {
        let mut t = PersistentMap::new().as_transient();
        t.assoc(k("a"), Value::Long(1)).unwrap();
        let done = t.persistent().unwrap();

        assert!(matches!(t.assoc(k("b"), Value::Nil), Err(Error::TransientSealed)));
        assert!(matches!(t.without(&k("a")), Err(Error::TransientSealed)));
        assert!(matches!(t.val_at(&k("a")), Err(Error::TransientSealed)));
        assert!(matches!(t.count(), Err(Error::TransientSealed)));
        assert!(matches!(t.persistent(), Err(Error::TransientSealed)));
        assert!(t.conj((k("c"), Value::Nil).into()).unwrap_err().is_usage_error());

        assert_eq!(done.count(), 1);
        assert_eq!(done.val_at(&k("a")), Some(Value::Long(1)));
    }

    #[test]
    fn conj_shapes() {
        let mut t = PersistentMap::new().as_transient();
        t.conj_value(&Value::vector([k("a"), Value::Long(1)]))
            .unwrap()
            .conj_value(&Value::Map(PersistentMap::hash_map([(k("b"), Value::Long(2))])))
            .unwrap()
            .conj((k("c"), Value::Long(3)).into())
            .unwrap();
        assert_eq!(t.count().unwrap(), 3);

        let err = t.conj_value(&Value::vector([k("d")])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!err.is_usage_error());
        assert_eq!(t.count().unwrap(), 3);
    }

    #[test]
    fn set_transient_lifecycle() {
        let source = PersistentSet::hash_set([Value::Long(1)]);
        let mut t = source.as_transient();
        t.conj(Value::Long(2)).unwrap().conj(Value::Long(3)).unwrap();
        t.disjoin(&Value::Long(1)).unwrap();
        assert!(t.contains(&Value::Long(2)).unwrap());
        assert!(!t.contains(&Value::Long(1)).unwrap());
        assert_eq!(t.get(&Value::Long(3)).unwrap(), Some(Value::Long(3)));

        let done = t.persistent().unwrap();
        assert_eq!(done.count(), 2);
        assert_eq!(source.count(), 1);
        assert!(matches!(t.conj(Value::Long(9)), Err(Error::TransientSealed)));
        assert!(matches!(t.count(), Err(Error::TransientSealed)));
        assert_eq!(done.count(), 2);
    }

    #[test]
    fn nil_element_is_found() {
        let mut t = PersistentSet::new().as_transient();
        t.conj(Value::Nil).unwrap();
        assert!(t.contains(&Value::Nil).unwrap());
    }
}
