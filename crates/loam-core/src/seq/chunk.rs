//! Chunks and chunked sequences
//!
//! A chunk is a fixed window of up to [`CHUNK_SIZE`] elements. Generators
//! and vectors hand out whole chunks so reductions can run a tight loop over
//! each window instead of allocating one node per element.

use super::{empty_list, seq_of, Chunk, IChunk, IChunkedSeq, ISeq, Seq, SeqHashes};
use crate::error::{Error, Result};
use crate::func::Func;
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Elements per chunk produced by ranges and vectors
pub const CHUNK_SIZE: usize = 32;

/// A window `[off, end)` over a shared array
#[derive(Clone)]
pub struct ArrayChunk {
    array: Arc<[Value]>,
    off: usize,
    end: usize,
}

impl ArrayChunk {
    /// Chunk over the whole array
    #[must_use]
    pub fn new(array: Arc<[Value]>) -> Self {
        let end = array.len();
        Self { array, off: 0, end }
    }

    /// Chunk over `array[off..end]`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`] if the window exceeds the array
    pub fn window(array: Arc<[Value]>, off: usize, end: usize) -> Result<Self> {
        if off > end || end > array.len() {
            return Err(Error::IndexOutOfBounds {
                index: end,
                count: array.len(),
            });
        }
        Ok(Self { array, off, end })
    }
}

impl IChunk for ArrayChunk {
    fn nth(&self, i: usize) -> Result<Value> {
        self.array[self.off..self.end]
            .get(i)
            .cloned()
            .ok_or(Error::IndexOutOfBounds {
                index: i,
                count: self.end - self.off,
            })
    }

    fn count(&self) -> usize {
        self.end - self.off
    }

    fn drop_first(&self) -> Result<Chunk> {
        if self.off == self.end {
            return Err(Error::invalid("drop_first of empty chunk"));
        }
        Ok(Arc::new(Self {
            array: Arc::clone(&self.array),
            off: self.off + 1,
            end: self.end,
        }))
    }

    fn reduce(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        for item in &self.array[self.off..self.end] {
            acc = f.invoke2(acc, item.clone())?;
            if acc.is_reduced() {
                return Ok(acc);
            }
        }
        Ok(acc)
    }
}

impl Debug for ArrayChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayChunk")
            .field("off", &self.off)
            .field("end", &self.end)
            .finish()
    }
}

/// Capacity-bounded builder that seals into an [`ArrayChunk`]
///
/// `chunk` consumes the buffer, so it cannot be appended to afterwards.
#[derive(Debug)]
pub struct ChunkBuffer {
    buffer: Vec<Value>,
    capacity: usize,
}

impl ChunkBuffer {
    /// Empty buffer holding at most `capacity` elements
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an element
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`] when the buffer is full
    pub fn add(&mut self, item: Value) -> Result<()> {
        if self.buffer.len() >= self.capacity {
            return Err(Error::IndexOutOfBounds {
                index: self.buffer.len(),
                count: self.capacity,
            });
        }
        self.buffer.push(item);
        Ok(())
    }

    /// Elements added so far
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.buffer.len()
    }

    /// Seal into a chunk
    #[must_use]
    pub fn chunk(self) -> ArrayChunk {
        ArrayChunk::new(self.buffer.into())
    }
}

/// A chunk followed by the rest of a sequence
pub struct ChunkedCons {
    chunk: Chunk,
    more: Option<Seq>,
    hashes: SeqHashes,
}

impl ChunkedCons {
    /// Build from a non-empty chunk and an optional rest
    #[must_use]
    pub fn new(chunk: Chunk, more: Option<Seq>) -> Self {
        Self {
            chunk,
            more,
            hashes: SeqHashes::new(),
        }
    }

    /// Build a seq, skipping straight to `more` when `chunk` is empty
    ///
    /// # Errors
    /// Propagates failures while realizing `more`
    pub fn create(chunk: Chunk, more: Option<Seq>) -> Result<Option<Seq>> {
        if chunk.count() == 0 {
            return match more {
                Some(rest) => seq_of(&rest),
                None => Ok(None),
            };
        }
        Ok(Some(Arc::new(Self::new(chunk, more))))
    }
}

impl ISeq for ChunkedCons {
    fn first(&self) -> Result<Value> {
        self.chunk.nth(0)
    }

    fn next(&self) -> Result<Option<Seq>> {
        if self.chunk.count() > 1 {
            let rest = Self::new(self.chunk.drop_first()?, self.more.clone());
            return Ok(Some(Arc::new(rest)));
        }
        self.chunked_next()
    }

    fn more(&self) -> Result<Seq> {
        if self.chunk.count() > 1 {
            let rest = Self::new(self.chunk.drop_first()?, self.more.clone());
            return Ok(Arc::new(rest));
        }
        self.chunked_more()
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }

    fn as_chunked(&self) -> Option<&dyn IChunkedSeq> {
        Some(self)
    }
}

impl IChunkedSeq for ChunkedCons {
    fn chunked_first(&self) -> Result<Chunk> {
        Ok(Arc::clone(&self.chunk))
    }

    fn chunked_next(&self) -> Result<Option<Seq>> {
        match &self.more {
            Some(rest) => seq_of(rest),
            None => Ok(None),
        }
    }

    fn chunked_more(&self) -> Result<Seq> {
        Ok(self.more.clone().unwrap_or_else(empty_list))
    }
}

impl Debug for ChunkedCons {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedCons")
            .field("chunk", &self.chunk)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq;

    fn chunk_of(xs: &[i64]) -> Chunk {
        let mut buffer = ChunkBuffer::new(xs.len());
        for x in xs {
            buffer.add(Value::Long(*x)).unwrap();
        }
        Arc::new(buffer.chunk())
    }

    fn sum() -> Func {
        Func::new("+", |args| match args {
            [Value::Long(a), Value::Long(b)] => Ok(Value::Long(a + b)),
            _ => Err(Error::user("bad args")),
        })
    }

    #[test]
    fn buffer_rejects_overflow() {
        let mut buffer = ChunkBuffer::new(1);
        buffer.add(Value::Long(1)).unwrap();
        assert!(buffer.add(Value::Long(2)).is_err());
        assert_eq!(buffer.count(), 1);
    }

    #[test]
    fn drop_first_walks_the_window() {
        let chunk = chunk_of(&[1, 2]);
        let rest = chunk.drop_first().unwrap();
        assert_eq!(rest.count(), 1);
        assert_eq!(rest.nth(0).unwrap(), Value::Long(2));
        let empty = rest.drop_first().unwrap();
        assert!(empty.drop_first().is_err());
    }

    #[test]
    fn chunk_reduce_keeps_reduced_wrapper() {
        let stop_at_three = Func::anonymous(|args| match args {
            [Value::Long(acc), Value::Long(x)] if acc + x >= 3 => {
                Ok(Value::reduced(Value::Long(acc + x)))
            }
            [Value::Long(acc), Value::Long(x)] => Ok(Value::Long(acc + x)),
            _ => Err(Error::user("bad args")),
        });
        let out = chunk_of(&[1, 2, 3, 4]).reduce(&stop_at_three, Value::Long(0)).unwrap();
        assert!(out.is_reduced());
        assert_eq!(out.unreduced(), Value::Long(3));
    }

    #[test]
    fn chunked_cons_spans_chunks() {
        let tail = ChunkedCons::create(chunk_of(&[3, 4]), None).unwrap();
        let head = ChunkedCons::create(chunk_of(&[1, 2]), tail).unwrap();
        let items = seq::to_vec(&Value::from(head.clone())).unwrap();
        assert_eq!(items, [1, 2, 3, 4].map(Value::Long));
        assert_eq!(
            seq::reduce(&Value::from(head), &sum(), Some(Value::Long(0))).unwrap(),
            Value::Long(10)
        );
    }

    #[test]
    fn empty_chunk_skips_to_rest() {
        let rest = seq::from_vec(vec![Value::Long(7)]);
        let s = ChunkedCons::create(chunk_of(&[]), rest).unwrap().unwrap();
        assert_eq!(s.first().unwrap(), Value::Long(7));
    }
}
