//! Generic numeric range
//!
//! Produces `start, start + step, ...` while the value has not passed `end`,
//! for any numeric type. Elements are produced 32 at a time: the first access
//! to a node forces its chunk and caches it, and the node for the following
//! chunk is created at the same time. A zero step repeats `start` forever.

use super::{
    empty_list, seq_of, Chunk, ChunkBuffer, IChunkedSeq, IReduce, ISeq,
    Repeat, Seq, SeqHashes, CHUNK_SIZE,
};
use crate::error::Result;
use crate::func::Func;
use crate::numeric;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Termination test chosen by the sign of the step
#[derive(Debug, Clone)]
enum Bound {
    /// Stop once the value reaches or passes `end` going up
    Ascending(Value),
    /// Stop once the value reaches or passes `end` going down
    Descending(Value),
}

impl Bound {
    fn exceeded(&self, value: &Value) -> Result<bool> {
        Ok(match self {
            Self::Ascending(end) => numeric::compare(value, end)? != Ordering::Less,
            Self::Descending(end) => numeric::compare(value, end)? != Ordering::Greater,
        })
    }
}

struct Forced {
    chunk: Chunk,
    chunk_next: Option<Seq>,
}

/// Chunked lazy range over any numeric type
pub struct Range {
    start: Value,
    step: Value,
    bound: Bound,
    forced: OnceCell<Forced>,
    next: OnceCell<Option<Seq>>,
    hashes: SeqHashes,
}

impl Range {
    fn node(start: Value, step: Value, bound: Bound) -> Self {
        Self {
            start,
            step,
            bound,
            forced: OnceCell::new(),
            next: OnceCell::new(),
            hashes: SeqHashes::new(),
        }
    }

    /// `0, 1, ... end-1`; empty unless `end > 0`
    ///
    /// # Errors
    /// Returns [`crate::Error::NotANumber`] for a non-numeric `end`
    pub fn to(end: Value) -> Result<Seq> {
        if numeric::is_pos(&end)? {
            let bound = Bound::Ascending(end);
            return Ok(Arc::new(Self::node(Value::Long(0), Value::Long(1), bound)));
        }
        Ok(empty_list())
    }

    /// `start, start+1, ... end-1`; empty unless `start < end`
    ///
    /// # Errors
    /// Returns [`crate::Error::NotANumber`] for non-numeric bounds
    pub fn between(start: Value, end: Value) -> Result<Seq> {
        if numeric::compare(&start, &end)? != Ordering::Less {
            return Ok(empty_list());
        }
        Ok(Arc::new(Self::node(start, Value::Long(1), Bound::Ascending(end))))
    }

    /// `start, start+step, ...` up to but excluding `end`
    ///
    /// Reversed bounds and `start == end` give the empty list. A zero step
    /// with distinct bounds repeats `start` forever.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotANumber`] for non-numeric arguments
    pub fn stepped(start: Value, end: Value, step: Value) -> Result<Seq> {
        let order = numeric::compare(&start, &end)?;
        let ascending = numeric::is_pos(&step)?;
        let descending = numeric::is_neg(&step)?;
        if (ascending && order == Ordering::Greater)
            || (descending && order == Ordering::Less)
            || order == Ordering::Equal
        {
            return Ok(empty_list());
        }
        if !ascending && !descending {
            return Ok(Repeat::infinite(start));
        }
        let bound = if ascending {
            Bound::Ascending(end)
        } else {
            Bound::Descending(end)
        };
        Ok(Arc::new(Self::node(start, step, bound)))
    }

    fn force(&self) -> Result<&Forced> {
        self.forced.get_or_try_init(|| {
            let mut buffer = ChunkBuffer::new(CHUNK_SIZE);
            let mut value = self.start.clone();
            while buffer.count() < CHUNK_SIZE {
                buffer.add(value.clone())?;
                value = numeric::add_p(&value, &self.step)?;
                if self.bound.exceeded(&value)? {
                    return Ok(Forced {
                        chunk: Arc::new(buffer.chunk()),
                        chunk_next: None,
                    });
                }
            }
            let rest = Self::node(value, self.step.clone(), self.bound.clone());
            Ok(Forced {
                chunk: Arc::new(buffer.chunk()),
                chunk_next: Some(Arc::new(rest)),
            })
        })
    }
}

impl ISeq for Range {
    fn first(&self) -> Result<Value> {
        Ok(self.start.clone())
    }

    fn next(&self) -> Result<Option<Seq>> {
        self.next
            .get_or_try_init(|| {
                let forced = self.force()?;
                if forced.chunk.count() > 1 {
                    let smaller = forced.chunk.drop_first()?;
                    let rest = Self {
                        start: smaller.nth(0)?,
                        step: self.step.clone(),
                        bound: self.bound.clone(),
                        forced: OnceCell::with_value(Forced {
                            chunk: smaller,
                            chunk_next: forced.chunk_next.clone(),
                        }),
                        next: OnceCell::new(),
                        hashes: SeqHashes::new(),
                    };
                    return Ok(Some(Arc::new(rest) as Seq));
                }
                self.chunked_next()
            })
            .cloned()
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }

    fn as_chunked(&self) -> Option<&dyn IChunkedSeq> {
        Some(self)
    }

    fn as_reduce(&self) -> Option<&dyn IReduce> {
        Some(self)
    }
}

impl IChunkedSeq for Range {
    fn chunked_first(&self) -> Result<Chunk> {
        Ok(Arc::clone(&self.force()?.chunk))
    }

    fn chunked_next(&self) -> Result<Option<Seq>> {
        match &self.force()?.chunk_next {
            Some(rest) => seq_of(rest),
            None => Ok(None),
        }
    }
}

impl IReduce for Range {
    fn reduce(&self, f: &Func) -> Result<Value> {
        let mut acc = self.start.clone();
        let mut i = numeric::add_p(&self.start, &self.step)?;
        while !self.bound.exceeded(&i)? {
            acc = f.invoke2(acc, i.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            i = numeric::add_p(&i, &self.step)?;
        }
        Ok(acc)
    }

    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        let mut i = self.start.clone();
        loop {
            acc = f.invoke2(acc, i.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            i = numeric::add_p(&i, &self.step)?;
            if self.bound.exceeded(&i)? {
                return Ok(acc);
            }
        }
    }
}

impl Debug for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("start", &self.start)
            .field("step", &self.step)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl Debug for Forced {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forced")
            .field("chunk", &self.chunk)
            .field("has_next", &self.chunk_next.is_some())
            .finish()
    }
}
