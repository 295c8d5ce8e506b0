//! Future: a value computed on its own thread
//!
//! Cancellation is cooperative. [`Future::cancel`] marks the future as
//! cancelled and wakes every waiter at once; the computation sees the flag
//! through its [`CancelToken`] and may stop early. Whatever it returns
//! after cancellation is discarded.
//!
//! A body that panics settles the future as failed.

use crate::error::RefError;
use crate::executor::{self, DispatchMode};
use loam_core::{Func, Value};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation flag shared with the computation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Check if cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

#[derive(Debug)]
enum Outcome {
    Pending,
    Done(Result<Value, RefError>),
    Cancelled,
}

#[derive(Debug)]
struct Shared {
    outcome: Mutex<Outcome>,
    settled: Condvar,
    token: CancelToken,
}

impl Shared {
    fn settle(&self, outcome: Outcome) -> bool {
        let mut slot = self.outcome.lock();
        if !matches!(*slot, Outcome::Pending) {
            return false;
        }
        *slot = outcome;
        self.settled.notify_all();
        true
    }
}

/// Handle to a value being computed on a dedicated thread
#[derive(Debug, Clone)]
pub struct Future(Arc<Shared>);

impl Future {
    /// Start `body` on a new thread
    ///
    /// # Errors
    /// Returns [`RefError::Dispatch`] if the thread cannot be started
    pub fn spawn<F>(body: F) -> Result<Self, RefError>
    where
        F: FnOnce(&CancelToken) -> loam_core::Result<Value> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            outcome: Mutex::new(Outcome::Pending),
            settled: Condvar::new(),
            token: CancelToken::default(),
        });
        let worker = Arc::clone(&shared);
        executor::dispatcher()
            .dispatch(
                DispatchMode::Solo,
                Box::new(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&worker.token)))
                        .unwrap_or_else(|_| Err(loam_core::Error::user("future panicked")))
                        .map_err(RefError::FutureFailed);
                    if !worker.settle(Outcome::Done(result)) {
                        tracing::debug!("discarding result of cancelled future");
                    }
                }),
            )
            .map_err(|err| RefError::Dispatch(err.to_string()))?;
        Ok(Self(shared))
    }

    /// Start a zero-argument function on a new thread
    ///
    /// # Errors
    /// As [`Future::spawn`]
    pub fn call(f: Func) -> Result<Self, RefError> {
        Self::spawn(move |_| f.invoke0())
    }

    /// Block for the value
    ///
    /// # Errors
    /// Returns [`RefError::Cancelled`] or [`RefError::FutureFailed`]
    pub fn deref(&self) -> Result<Value, RefError> {
        let mut slot = self.0.outcome.lock();
        loop {
            if let Some(result) = Self::read(&slot) {
                return result;
            }
            self.0.settled.wait(&mut slot);
        }
    }

    /// Block for the value at most `timeout`, then give `timeout_value`
    ///
    /// # Errors
    /// As [`Future::deref`]
    pub fn deref_timeout(&self, timeout: Duration, timeout_value: Value) -> Result<Value, RefError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.deref();
        };
        let mut slot = self.0.outcome.lock();
        loop {
            if let Some(result) = Self::read(&slot) {
                return result;
            }
            if self.0.settled.wait_until(&mut slot, deadline).timed_out() {
                return Self::read(&slot).unwrap_or(Ok(timeout_value));
            }
        }
    }

    /// Check if the future finished, failed or was cancelled
    #[must_use]
    pub fn is_done(&self) -> bool {
        !matches!(*self.0.outcome.lock(), Outcome::Pending)
    }

    /// Check if the future was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.0.outcome.lock(), Outcome::Cancelled)
    }

    /// Request cancellation; returns `false` if the future already settled
    pub fn cancel(&self) -> bool {
        let cancelled = self.0.settle(Outcome::Cancelled);
        if cancelled {
            self.0.token.cancel();
            tracing::debug!("future cancelled");
        }
        cancelled
    }

    fn read(outcome: &Outcome) -> Option<Result<Value, RefError>> {
        match outcome {
            Outcome::Pending => None,
            Outcome::Done(result) => Some(result.clone()),
            Outcome::Cancelled => Some(Err(RefError::Cancelled)),
        }
    }
}
