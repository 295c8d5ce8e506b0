//! Infinite repetition of a finite sequence

use super::{empty_list, IReduce, ISeq, Seq, SeqHashes};
use crate::error::Result;
use crate::func::Func;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Loops over `all` forever, starting at `current`
pub struct Cycle {
    all: Seq,
    current: Seq,
    next: OnceCell<Seq>,
    hashes: SeqHashes,
}

impl Cycle {
    fn node(all: Seq, current: Seq) -> Self {
        Self {
            all,
            current,
            next: OnceCell::new(),
            hashes: SeqHashes::new(),
        }
    }

    /// Cycle over `coll`; an empty collection gives the empty list
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSeqable`] if `coll` has no seq view, and
    /// propagates failures while realizing its head
    pub fn create(coll: &Value) -> Result<Seq> {
        match coll.seq()? {
            Some(all) => Ok(Arc::new(Self::node(Arc::clone(&all), all))),
            None => Ok(empty_list()),
        }
    }

    /// Position after `at`, wrapping back to the start
    fn advance(&self, at: &Seq) -> Result<Seq> {
        Ok(at.next()?.unwrap_or_else(|| Arc::clone(&self.all)))
    }
}

impl ISeq for Cycle {
    fn first(&self) -> Result<Value> {
        self.current.first()
    }

    fn next(&self) -> Result<Option<Seq>> {
        let next = self.next.get_or_try_init(|| -> Result<Seq> {
            let current = self.advance(&self.current)?;
            Ok(Arc::new(Self::node(Arc::clone(&self.all), current)))
        })?;
        Ok(Some(Arc::clone(next)))
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }

    fn as_reduce(&self) -> Option<&dyn IReduce> {
        Some(self)
    }
}

impl IReduce for Cycle {
    fn reduce(&self, f: &Func) -> Result<Value> {
        let mut acc = self.current.first()?;
        let mut s = self.advance(&self.current)?;
        loop {
            acc = f.invoke2(acc, s.first()?)?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            s = self.advance(&s)?;
        }
    }

    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        let mut s = Arc::clone(&self.current);
        loop {
            acc = f.invoke2(acc, s.first()?)?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            s = self.advance(&s)?;
        }
    }
}

impl Debug for Cycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cycle")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
