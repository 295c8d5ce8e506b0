//! Once-only deferred sequences
//!
//! A [`LazySeq`] moves through three stages:
//!
//! 1. **Unrealized**: holds the thunk
//! 2. **Staged**: the thunk ran and was dropped; its raw result is held and
//!    may itself be another lazy sequence
//! 3. **Realized**: the final canonical seq (or `None`)
//!
//! The thunk runs under a per-instance mutex, so concurrent first readers
//! block and observe one result. Once realized, reads skip the lock. A thunk
//! that fails leaves the sequence unrealized and the error goes to the caller.

use super::{empty_list, ISeq, ItemVisitor, Seq};
use crate::error::Result;
use crate::func::Func;
use crate::murmur3;
use crate::value::Value;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt::{self, Debug, Formatter};

enum Stage {
    Unrealized(Func),
    Staged(Value),
    Realized,
}

/// A sequence computed on first access
pub struct LazySeq {
    stage: Mutex<Stage>,
    realized: OnceCell<Option<Seq>>,
}

impl LazySeq {
    /// Defer `thunk`, a zero-argument function returning anything seqable
    #[must_use]
    pub fn new(thunk: Func) -> Self {
        Self {
            stage: Mutex::new(Stage::Unrealized(thunk)),
            realized: OnceCell::new(),
        }
    }

    /// Defer a closure
    #[must_use]
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(Func::new("lazy-seq", move |_| body()))
    }

    /// Whether the thunk has already run
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.realized.get().is_some() || !matches!(*self.stage.lock(), Stage::Unrealized(_))
    }

    /// Run the thunk if needed and return its raw result
    fn sval(&self) -> Result<Value> {
        let mut stage = self.stage.lock();
        self.sval_locked(&mut stage)
    }

    fn sval_locked(&self, stage: &mut Stage) -> Result<Value> {
        match stage {
            Stage::Unrealized(thunk) => {
                let produced = thunk.invoke0()?;
                *stage = Stage::Staged(produced.clone());
                Ok(produced)
            }
            Stage::Staged(produced) => Ok(produced.clone()),
            Stage::Realized => Ok(self.realized.get().cloned().flatten().into()),
        }
    }

    /// Realize and return the canonical seq
    ///
    /// Nested lazy results are unwrapped before the final seq coercion.
    ///
    /// # Errors
    /// Propagates failures from the thunk (or a nested thunk), and
    /// [`crate::Error::NotSeqable`] if the thunk produced a scalar
    pub fn seq(&self) -> Result<Option<Seq>> {
        if let Some(done) = self.realized.get() {
            return Ok(done.clone());
        }

        let mut stage = self.stage.lock();
        if let Some(done) = self.realized.get() {
            return Ok(done.clone());
        }

        let mut produced = self.sval_locked(&mut stage)?;
        loop {
            let inner = match &produced {
                Value::Seq(s) => match s.as_lazy() {
                    Some(lazy) => lazy.sval()?,
                    None => break,
                },
                _ => break,
            };
            produced = inner;
        }

        let canonical = produced.seq()?;
        let done = self.realized.get_or_init(|| canonical);
        *stage = Stage::Realized;
        Ok(done.clone())
    }
}

impl ISeq for LazySeq {
    fn first(&self) -> Result<Value> {
        match self.seq()? {
            Some(s) => s.first(),
            None => Ok(Value::Nil),
        }
    }

    fn next(&self) -> Result<Option<Seq>> {
        match self.seq()? {
            Some(s) => s.next(),
            None => Ok(None),
        }
    }

    fn more(&self) -> Result<Seq> {
        match self.seq()? {
            Some(s) => s.more(),
            None => Ok(empty_list()),
        }
    }

    fn count(&self) -> Result<usize> {
        self.seq()?.map_or(Ok(0), |s| s.count())
    }

    fn for_each_item(&self, visit: &mut ItemVisitor<'_>) -> Result<()> {
        match self.seq()? {
            Some(s) => s.for_each_item(visit),
            None => Ok(()),
        }
    }

    fn hasheq(&self) -> Result<i32> {
        match self.seq()? {
            Some(s) => s.hasheq(),
            None => Ok(murmur3::hash_ordered(std::iter::empty())),
        }
    }

    fn hash_code(&self) -> Result<i32> {
        match self.seq()? {
            Some(s) => s.hash_code(),
            None => Ok(1),
        }
    }

    fn as_lazy(&self) -> Option<&LazySeq> {
        Some(self)
    }
}

impl Debug for LazySeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySeq")
            .field("realized", &self.realized.get().is_some())
            .finish()
    }
}
