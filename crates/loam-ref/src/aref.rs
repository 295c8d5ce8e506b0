//! Shared reference behavior: validators and watches
//!
//! Every reference type embeds a [`RefCore`] and implements [`IRef`] on top
//! of it. Watches are stored in an immutable map that is replaced on each
//! change, so notification iterates a snapshot without holding a lock.

use crate::error::RefError;
use loam_core::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// State predicate; `Ok(false)` rejects the state
pub type Validator = Arc<dyn Fn(&Value) -> loam_core::Result<bool> + Send + Sync>;

/// Change callback: `(key, reference, old, new)`
pub type WatchFn =
    Arc<dyn Fn(&Value, &dyn IRef, &Value, &Value) -> loam_core::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Validator`]
pub fn validator<F>(f: F) -> Validator
where
    F: Fn(&Value) -> loam_core::Result<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`WatchFn`]
pub fn watch<F>(f: F) -> WatchFn
where
    F: Fn(&Value, &dyn IRef, &Value, &Value) -> loam_core::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run `validator` against `state`
///
/// # Errors
/// Returns [`RefError::Validation`] on rejection, or the validator's own error
pub fn validate(validator: Option<&Validator>, state: &Value) -> Result<(), RefError> {
    let Some(check) = validator else {
        return Ok(());
    };
    if check(state)? {
        Ok(())
    } else {
        Err(RefError::Validation)
    }
}

/// Validator slot and watch table
#[derive(Default)]
pub struct RefCore {
    validator: RwLock<Option<Validator>>,
    watches: RwLock<im::HashMap<Value, WatchFn>>,
}

impl RefCore {
    /// Empty core
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current validator
    #[must_use]
    pub fn validator(&self) -> Option<Validator> {
        self.validator.read().clone()
    }

    /// Validate `state` against the current validator
    ///
    /// # Errors
    /// As [`validate`]
    pub fn validate(&self, state: &Value) -> Result<(), RefError> {
        validate(self.validator().as_ref(), state)
    }

    /// Call every watch with `(old, new)`, in no particular order
    ///
    /// # Errors
    /// Stops at the first failing watch and returns its error
    pub fn notify_watches(&self, reference: &dyn IRef, old: &Value, new: &Value) -> Result<(), RefError> {
        let snapshot = self.watches.read().clone();
        for (key, f) in &snapshot {
            f(key, reference, old, new)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RefCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCore")
            .field("validator", &self.validator.read().is_some())
            .field("watches", &self.watches.read().len())
            .finish()
    }
}

/// Reference with a current value, a validator and watches
pub trait IRef: Send + Sync {
    /// Current value
    fn deref(&self) -> Value;

    /// Embedded validator and watch state
    fn ref_core(&self) -> &RefCore;

    /// Replace the validator; the current value must pass it first
    ///
    /// # Errors
    /// Returns [`RefError::Validation`] if the current value is rejected, in
    /// which case the old validator stays
    fn set_validator(&self, validator: Option<Validator>) -> Result<(), RefError> {
        validate(validator.as_ref(), &self.deref())?;
        *self.ref_core().validator.write() = validator;
        Ok(())
    }

    /// Current validator
    fn validator(&self) -> Option<Validator> {
        self.ref_core().validator()
    }

    /// Register `f` under `key`, replacing any previous watch with that key
    fn add_watch(&self, key: Value, f: WatchFn) {
        let mut watches = self.ref_core().watches.write();
        *watches = watches.update(key, f);
    }

    /// Drop the watch under `key`
    fn remove_watch(&self, key: &Value) {
        let mut watches = self.ref_core().watches.write();
        *watches = watches.without(key);
    }

    /// Keys of registered watches
    fn watch_keys(&self) -> Vec<Value> {
        self.ref_core().watches.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct Cell {
        value: Mutex<Value>,
        core: RefCore,
    }

    impl IRef for Cell {
        fn deref(&self) -> Value {
            self.value.lock().clone()
        }

        fn ref_core(&self) -> &RefCore {
            &self.core
        }
    }

    #[test]
    fn set_validator_checks_current_state() {
        let cell = Cell::default();
        *cell.value.lock() = Value::Long(-1);
        let positive = validator(|v| Ok(matches!(v, Value::Long(n) if *n > 0)));
        assert!(cell.set_validator(Some(positive)).unwrap_err().is_validation());
        assert!(cell.validator().is_none());

        *cell.value.lock() = Value::Long(1);
        cell.set_validator(Some(validator(|_| Ok(true)))).unwrap();
        assert!(cell.validator().is_some());
    }

    #[test]
    fn validator_errors_propagate() {
        let failing = validator(|_| Err(loam_core::Error::user("nope")));
        let err = validate(Some(&failing), &Value::Nil).unwrap_err();
        assert!(matches!(err, RefError::Core(_)));
    }

    #[test]
    fn watches_fire_and_can_be_removed() {
        let cell = Cell::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        cell.add_watch(
            Value::keyword("w"),
            watch(move |key, r, old, new| {
                log.lock().push((key.clone(), r.deref(), old.clone(), new.clone()));
                Ok(())
            }),
        );
        assert_eq!(cell.watch_keys(), vec![Value::keyword("w")]);

        cell.core
            .notify_watches(&cell, &Value::Long(0), &Value::Long(1))
            .unwrap();
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].3, Value::Long(1));

        cell.remove_watch(&Value::keyword("w"));
        cell.core
            .notify_watches(&cell, &Value::Long(1), &Value::Long(2))
            .unwrap();
        assert_eq!(seen.lock().len(), 1);
        assert!(cell.watch_keys().is_empty());
    }
}
