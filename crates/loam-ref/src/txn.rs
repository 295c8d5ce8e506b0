//! Transaction hook
//!
//! Agent sends made while a transaction runs on the current thread are
//! handed to that transaction instead of being queued. The transaction
//! decides when (and whether) to release them, typically on commit.

use crate::agent::Action;
use std::cell::RefCell;
use std::sync::Arc;

/// Receiver for agent actions dispatched inside a transaction
pub trait Transaction: Send + Sync {
    /// Hold `action` until the transaction settles
    fn enqueue(&self, action: Action);
}

thread_local! {
    static RUNNING: RefCell<Option<Arc<dyn Transaction>>> = const { RefCell::new(None) };
}

/// Transaction running on the current thread
#[must_use]
pub fn running() -> Option<Arc<dyn Transaction>> {
    RUNNING.with(|slot| slot.borrow().clone())
}

/// Guard installing a transaction for the current thread
///
/// The previous transaction (if any) is restored on drop.
#[must_use = "the transaction is removed when the scope is dropped"]
pub struct TransactionScope {
    previous: Option<Arc<dyn Transaction>>,
}

impl TransactionScope {
    /// Make `txn` the running transaction until the guard drops
    pub fn enter(txn: Arc<dyn Transaction>) -> Self {
        let previous = RUNNING.with(|slot| slot.borrow_mut().replace(txn));
        Self { previous }
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        RUNNING.with(|slot| *slot.borrow_mut() = previous);
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("nested", &self.previous.is_some())
            .finish()
    }
}
