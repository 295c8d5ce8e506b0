//! `x, f(x), f(f(x)), ...`
//!
//! Each node computes its value from the previous seed on first access and
//! caches it, so `f` runs at most once per position no matter how many
//! readers walk the sequence.

use super::{IReduce, ISeq, Seq, SeqHashes};
use crate::error::Result;
use crate::func::Func;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Infinite sequence of repeated applications of `f`
pub struct Iterate {
    f: Func,
    prev_seed: Option<Value>,
    seed: OnceCell<Value>,
    next: OnceCell<Seq>,
    hashes: SeqHashes,
}

impl Iterate {
    /// Sequence starting at `seed`
    #[must_use]
    pub fn create(f: Func, seed: Value) -> Seq {
        Arc::new(Self {
            f,
            prev_seed: None,
            seed: OnceCell::with_value(seed),
            next: OnceCell::new(),
            hashes: SeqHashes::new(),
        })
    }

    fn following(f: Func, prev_seed: Value) -> Self {
        Self {
            f,
            prev_seed: Some(prev_seed),
            seed: OnceCell::new(),
            next: OnceCell::new(),
            hashes: SeqHashes::new(),
        }
    }

    /// Whether this node's value has been computed
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.seed.get().is_some()
    }

    fn seed(&self) -> Result<&Value> {
        self.seed.get_or_try_init(|| {
            let prev = self.prev_seed.clone().unwrap_or_default();
            self.f.invoke1(prev)
        })
    }
}

impl ISeq for Iterate {
    fn first(&self) -> Result<Value> {
        self.seed().cloned()
    }

    fn next(&self) -> Result<Option<Seq>> {
        let next = self.next.get_or_try_init(|| -> Result<Seq> {
            let seed = self.seed()?.clone();
            Ok(Arc::new(Self::following(self.f.clone(), seed)))
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

impl IReduce for Iterate {
    fn reduce(&self, rf: &Func) -> Result<Value> {
        let first = self.seed()?.clone();
        let mut v = self.f.invoke1(first.clone())?;
        let mut acc = first;
        loop {
            acc = rf.invoke2(acc, v.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            v = self.f.invoke1(v)?;
        }
    }

    fn reduce_init(&self, rf: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        let mut v = self.seed()?.clone();
        loop {
            acc = rf.invoke2(acc, v.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            v = self.f.invoke1(v)?;
        }
    }
}

impl Debug for Iterate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iterate")
            .field("f", &self.f)
            .field("seed", &self.seed.get())
            .finish_non_exhaustive()
    }
}
