//! Atom: uncoordinated synchronous reference
//!
//! The state lives in an [`ArcSwap`]. Updates read a snapshot, compute the
//! new value, validate it and publish it with compare-and-swap. A lost race
//! recomputes from the fresh snapshot, so the update function may run more
//! than once and must be free of side effects.

use crate::aref::{IRef, RefCore, Validator};
use crate::error::RefError;
use arc_swap::ArcSwap;
use loam_core::{Func, Value};
use std::sync::Arc;

/// Compare-and-swap reference
#[derive(Debug)]
pub struct Atom {
    state: ArcSwap<Value>,
    core: RefCore,
}

impl Atom {
    /// Create an atom holding `state`
    #[must_use]
    pub fn new(state: Value) -> Self {
        Self {
            state: ArcSwap::from_pointee(state),
            core: RefCore::new(),
        }
    }

    /// Create an atom whose state must always satisfy `validator`
    ///
    /// # Errors
    /// Returns [`RefError::Validation`] if `state` is rejected
    pub fn with_validator(state: Value, validator: Validator) -> Result<Self, RefError> {
        let atom = Self::new(state);
        atom.set_validator(Some(validator))?;
        Ok(atom)
    }

    /// Apply `update` until its result is published; returns `(old, new)`
    ///
    /// # Errors
    /// Update and validator failures surface at once without retrying; watch
    /// failures surface after the new state is published
    pub fn update_vals<F>(&self, mut update: F) -> Result<(Value, Value), RefError>
    where
        F: FnMut(&Value) -> loam_core::Result<Value>,
    {
        loop {
            let current = self.state.load_full();
            let next = update(&current)?;
            self.core.validate(&next)?;
            let next = Arc::new(next);
            let prev = self.state.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*prev, &current) {
                self.core.notify_watches(self, &current, &next)?;
                return Ok(((*current).clone(), (*next).clone()));
            }
            tracing::trace!("atom update lost a race, retrying");
        }
    }

    /// Apply `update` and return the new state
    ///
    /// # Errors
    /// As [`Atom::update_vals`]
    pub fn update<F>(&self, update: F) -> Result<Value, RefError>
    where
        F: FnMut(&Value) -> loam_core::Result<Value>,
    {
        self.update_vals(update).map(|(_, new)| new)
    }

    /// Set the state to `f(state, args...)`; returns the new state
    ///
    /// # Errors
    /// As [`Atom::update_vals`]
    pub fn swap(&self, f: &Func, args: &[Value]) -> Result<Value, RefError> {
        self.update(|current| f.apply_to(current.clone(), args))
    }

    /// As [`Atom::swap`], returning `(old, new)`
    ///
    /// # Errors
    /// As [`Atom::update_vals`]
    pub fn swap_vals(&self, f: &Func, args: &[Value]) -> Result<(Value, Value), RefError> {
        self.update_vals(|current| f.apply_to(current.clone(), args))
    }

    /// Set the state to `new` if it is currently `old` and no writer intervenes
    ///
    /// Returns `Ok(false)` without touching the atom otherwise.
    ///
    /// # Errors
    /// Returns [`RefError::Validation`] if `new` is rejected
    pub fn compare_and_set(&self, old: &Value, new: Value) -> Result<bool, RefError> {
        self.core.validate(&new)?;
        let current = self.state.load_full();
        if *current != *old {
            return Ok(false);
        }
        let next = Arc::new(new);
        let prev = self.state.compare_and_swap(&current, Arc::clone(&next));
        if !Arc::ptr_eq(&*prev, &current) {
            return Ok(false);
        }
        self.core.notify_watches(self, &current, &next)?;
        Ok(true)
    }

    /// Set the state to `new` unconditionally; returns `new`
    ///
    /// # Errors
    /// Returns [`RefError::Validation`] if `new` is rejected
    pub fn reset(&self, new: Value) -> Result<Value, RefError> {
        self.reset_vals(new).map(|(_, new)| new)
    }

    /// As [`Atom::reset`], returning `(old, new)`
    ///
    /// # Errors
    /// Returns [`RefError::Validation`] if `new` is rejected
    pub fn reset_vals(&self, new: Value) -> Result<(Value, Value), RefError> {
        self.core.validate(&new)?;
        let next = Arc::new(new);
        let old = self.state.swap(Arc::clone(&next));
        self.core.notify_watches(self, &old, &next)?;
        Ok(((*old).clone(), (*next).clone()))
    }
}

impl IRef for Atom {
    fn deref(&self) -> Value {
        (**self.state.load()).clone()
    }

    fn ref_core(&self) -> &RefCore {
        &self.core
    }
}
