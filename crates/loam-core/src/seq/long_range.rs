//! Counted range over `i64`
//!
//! The element count is computed up front, which makes `count` constant-time
//! and lets `next`, `drop` and chunking work by arithmetic alone. Ranges whose
//! count does not fit an `i32` are handed to the generic [`Range`].

use super::{
    empty_list, Chunk, IChunk, IChunkedSeq, IReduce, ISeq, Range, Repeat, Seq, SeqHashes,
    CHUNK_SIZE,
};
use crate::error::{Error, Result};
use crate::func::Func;
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Element at `start + step * i`, checked against overflow
fn offset(start: i64, step: i64, i: usize) -> Result<i64> {
    let i = i64::try_from(i).map_err(|_| Error::invalid("long range index overflow"))?;
    step.checked_mul(i)
        .and_then(|delta| start.checked_add(delta))
        .ok_or_else(|| Error::invalid("long range index overflow"))
}

/// Arithmetic progression of longs with a known count
pub struct LongRange {
    start: i64,
    end: i64,
    step: i64,
    count: usize,
    hashes: SeqHashes,
}

impl LongRange {
    fn node(start: i64, end: i64, step: i64, count: usize) -> Self {
        Self {
            start,
            end,
            step,
            count,
            hashes: SeqHashes::new(),
        }
    }

    /// `0, 1, ... end-1`; empty unless `end > 0`
    #[must_use]
    pub fn to(end: i64) -> Seq {
        Self::between(0, end)
    }

    /// `start, start+1, ... end-1`; empty unless `start < end`
    #[must_use]
    pub fn between(start: i64, end: i64) -> Seq {
        if start >= end {
            return empty_list();
        }
        Self::counted_or_generic(start, end, 1)
    }

    /// `start, start+step, ...` up to but excluding `end`
    ///
    /// A zero step gives the empty list when `start == end` and repeats
    /// `start` forever otherwise.
    #[must_use]
    pub fn stepped(start: i64, end: i64, step: i64) -> Seq {
        match step {
            0 if start == end => empty_list(),
            0 => Repeat::infinite(Value::Long(start)),
            s if s > 0 && end <= start => empty_list(),
            s if s < 0 && end >= start => empty_list(),
            _ => Self::counted_or_generic(start, end, step),
        }
    }

    /// Number of elements in `[start, end)` by `step`, `None` past `i32::MAX`
    fn range_count(start: i64, end: i64, step: i64) -> Option<usize> {
        let (start, end, step) = (i128::from(start), i128::from(end), i128::from(step));
        let adjust = if step > 0 { -1 } else { 1 };
        let count = (end - start + step + adjust) / step;
        if count > i128::from(i32::MAX) {
            return None;
        }
        usize::try_from(count).ok()
    }

    fn counted_or_generic(start: i64, end: i64, step: i64) -> Seq {
        match Self::range_count(start, end, step) {
            Some(count) => Arc::new(Self::node(start, end, step, count)),
            None => Range::stepped(Value::Long(start), Value::Long(end), Value::Long(step))
                .unwrap_or_else(|_| empty_list()),
        }
    }

    /// Skip `n` elements in constant time
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the new start overflows
    pub fn drop(&self, n: usize) -> Result<Option<Seq>> {
        if n == 0 {
            return Ok(Some(Arc::new(Self::node(self.start, self.end, self.step, self.count))));
        }
        if n < self.count {
            let start = offset(self.start, self.step, n)?;
            return Ok(Some(Arc::new(Self::node(start, self.end, self.step, self.count - n))));
        }
        Ok(None)
    }
}

impl ISeq for LongRange {
    fn first(&self) -> Result<Value> {
        Ok(Value::Long(self.start))
    }

    fn next(&self) -> Result<Option<Seq>> {
        if self.count > 1 {
            let start = offset(self.start, self.step, 1)?;
            return Ok(Some(Arc::new(Self::node(start, self.end, self.step, self.count - 1))));
        }
        Ok(None)
    }

    fn counted(&self) -> Option<usize> {
        Some(self.count)
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

impl IChunkedSeq for LongRange {
    fn chunked_first(&self) -> Result<Chunk> {
        Ok(Arc::new(LongChunk::new(
            self.start,
            self.step,
            self.count.min(CHUNK_SIZE),
        )))
    }

    fn chunked_next(&self) -> Result<Option<Seq>> {
        if self.count <= CHUNK_SIZE {
            return Ok(None);
        }
        let start = offset(self.start, self.step, CHUNK_SIZE)?;
        Ok(Some(Arc::new(Self::node(
            start,
            self.end,
            self.step,
            self.count - CHUNK_SIZE,
        ))))
    }
}

impl IReduce for LongRange {
    fn reduce(&self, f: &Func) -> Result<Value> {
        let mut acc = Value::Long(self.start);
        let mut i = self.start;
        for _ in 1..self.count {
            i += self.step;
            acc = f.invoke2(acc, Value::Long(i))?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
        }
        Ok(acc)
    }

    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        let mut i = self.start;
        for n in 0..self.count {
            if n > 0 {
                i += self.step;
            }
            acc = f.invoke2(acc, Value::Long(i))?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
        }
        Ok(acc)
    }
}

impl Debug for LongRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongRange")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("step", &self.step)
            .field("count", &self.count)
            .finish()
    }
}

/// Arithmetic chunk: `count` longs from `start` by `step`
#[derive(Debug, Clone, Copy)]
pub struct LongChunk {
    start: i64,
    step: i64,
    count: usize,
}

impl LongChunk {
    /// Chunk of `count` elements
    #[inline]
    #[must_use]
    pub const fn new(start: i64, step: i64, count: usize) -> Self {
        Self { start, step, count }
    }

    /// First element
    #[inline]
    #[must_use]
    pub const fn first(&self) -> i64 {
        self.start
    }
}

impl IChunk for LongChunk {
    fn nth(&self, i: usize) -> Result<Value> {
        if i >= self.count {
            return Err(Error::IndexOutOfBounds {
                index: i,
                count: self.count,
            });
        }
        Ok(Value::Long(offset(self.start, self.step, i)?))
    }

    fn count(&self) -> usize {
        self.count
    }

    fn drop_first(&self) -> Result<Chunk> {
        if self.count <= 1 {
            return Err(Error::invalid("drop_first of empty chunk"));
        }
        Ok(Arc::new(Self::new(
            self.start + self.step,
            self.step,
            self.count - 1,
        )))
    }

    fn reduce(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        let mut x = self.start;
        for n in 0..self.count {
            if n > 0 {
                x += self.step;
            }
            acc = f.invoke2(acc, Value::Long(x))?;
            if acc.is_reduced() {
                return Ok(acc);
            }
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq;
    use pretty_assertions::assert_eq;

    fn items(s: Seq) -> Vec<i64> {
        seq::to_vec(&Value::Seq(s))
            .unwrap()
            .into_iter()
            .map(|v| match v {
                Value::Long(n) => n,
                other => panic!("expected long, got {other:?}"),
            })
            .collect()
    }

    fn plus() -> Func {
        Func::new("+", |args| match args {
            [Value::Long(a), Value::Long(b)] => Ok(Value::Long(a + b)),
            _ => Err(Error::user("bad args")),
        })
    }

    #[test]
    fn boundaries() {
        assert!(LongRange::between(0, 0).is_empty_list());
        assert!(LongRange::to(-3).is_empty_list());
        assert_eq!(items(LongRange::stepped(0, 5, 2)), [0, 2, 4]);
        assert_eq!(items(LongRange::stepped(5, 0, -2)), [5, 3, 1]);
        assert!(LongRange::stepped(3, 3, 0).is_empty_list());
        assert!(LongRange::stepped(5, 0, 2).is_empty_list());
    }

    #[test]
    fn zero_step_is_infinite() {
        let s = LongRange::stepped(7, 9, 0);
        let taken: Vec<Value> = seq::iter(Some(s)).take(50).collect::<Result<_>>().unwrap();
        assert!(taken.iter().all(|v| *v == Value::Long(7)));
        assert_eq!(taken.len(), 50);
    }

    #[test]
    fn count_is_constant_time() {
        let s = LongRange::stepped(0, 1_000_000, 3);
        assert_eq!(s.counted(), Some(333_334));
        assert_eq!(s.count().unwrap(), 333_334);
    }

    #[test]
    fn huge_ranges_fall_back_to_generic() {
        let s = LongRange::between(0, i64::MAX);
        assert_eq!(s.counted(), None);
        assert_eq!(s.first().unwrap(), Value::Long(0));
    }

    #[test]
    fn drop_skips_ahead() {
        let s = LongRange::node(0, 10, 1, 10);
        assert_eq!(items(s.drop(7).unwrap().unwrap()), [7, 8, 9]);
        assert!(s.drop(10).unwrap().is_none());
        assert_eq!(s.drop(0).unwrap().unwrap().counted(), Some(10));
    }

    #[test]
    fn chunks_and_reduction() {
        let s = LongRange::to(100);
        let chunked = s.as_chunked().unwrap();
        let first = chunked.chunked_first().unwrap();
        assert_eq!(first.count(), CHUNK_SIZE);
        assert_eq!(first.nth(31).unwrap(), Value::Long(31));
        assert_eq!(chunked.chunked_next().unwrap().unwrap().counted(), Some(68));

        let total = seq::reduce(&Value::Seq(s.clone()), &plus(), None).unwrap();
        assert_eq!(total, Value::Long(4950));
        let seeded = seq::reduce(&Value::Seq(s), &plus(), Some(Value::Long(50))).unwrap();
        assert_eq!(seeded, Value::Long(5000));
    }

    #[test]
    fn long_chunk_drop_first() {
        let chunk = LongChunk::new(10, 5, 2);
        let rest = chunk.drop_first().unwrap();
        assert_eq!(rest.nth(0).unwrap(), Value::Long(15));
        assert!(rest.drop_first().is_err());
    }
}
