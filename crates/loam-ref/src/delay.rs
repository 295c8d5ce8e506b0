//! Delay: a computation run at most once, on first demand

use crate::error::RefError;
use loam_core::{Func, Value};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;

/// Deferred zero-argument computation with a cached outcome
///
/// The first `force` runs the thunk while other callers wait; every later
/// call returns the stored value or error. The thunk is dropped once it ran.
pub struct Delay {
    thunk: Mutex<Option<Func>>,
    outcome: OnceCell<Result<Value, RefError>>,
}

impl Delay {
    /// Delay over `thunk`
    #[must_use]
    pub fn new(thunk: Func) -> Self {
        Self {
            thunk: Mutex::new(Some(thunk)),
            outcome: OnceCell::new(),
        }
    }

    /// Delay over a closure
    #[must_use]
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn() -> loam_core::Result<Value> + Send + Sync + 'static,
    {
        Self::new(Func::anonymous(move |_| body()))
    }

    /// Value of the computation, running it if needed
    ///
    /// # Errors
    /// Returns the thunk's failure, the same one on every call
    pub fn force(&self) -> Result<Value, RefError> {
        if let Some(done) = self.outcome.get() {
            return done.clone();
        }
        self.outcome
            .get_or_init(|| {
                let thunk = self.thunk.lock().take();
                match thunk {
                    Some(f) => f.invoke0().map_err(RefError::from),
                    None => Err(loam_core::Error::user("delay thunk missing").into()),
                }
            })
            .clone()
    }

    /// Check if the computation ran
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.outcome.get().is_some()
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome.get() {
            Some(Ok(value)) => f.debug_tuple("Delay").field(value).finish(),
            Some(Err(err)) => f.debug_tuple("Delay").field(err).finish(),
            None => f.write_str("Delay(pending)"),
        }
    }
}
