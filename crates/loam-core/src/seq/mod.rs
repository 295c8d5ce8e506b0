//! Sequence abstraction
//!
//! Every sequence is a chain of immutable nodes behind [`Seq`]
//! (`Arc<dyn ISeq>`). A node supplies `first` and `next`; the trait derives
//! counting, hashing and element walking from those two, and concrete types
//! override the parts they can do better (constant-time counts, chunked
//! traversal, direct reduction).
//!
//! `next` returns `Ok(None)` at the end, never an error. `more` returns the
//! canonical [`EmptyList`] instead, which is itself a sequence object.
//!
//! # Overview
//!
//! - [`Cons`], [`EmptyList`], [`ArraySeq`]: plain nodes
//! - [`LazySeq`]: once-only, thread-safe deferred computation
//! - [`ArrayChunk`], [`ChunkBuffer`], [`ChunkedCons`]: chunked traversal
//! - [`Range`], [`LongRange`], [`Cycle`], [`Iterate`], [`Repeat`]: generators

mod chunk;
mod cons;
mod cycle;
mod iterate;
mod lazy;
mod long_range;
mod range;
mod repeat;

pub use chunk::{ArrayChunk, ChunkBuffer, ChunkedCons, CHUNK_SIZE};
pub use cons::{empty_list, ArraySeq, Cons, EmptyList};
pub use cycle::Cycle;
pub use iterate::Iterate;
pub use lazy::LazySeq;
pub use long_range::{LongChunk, LongRange};
pub use range::Range;
pub use repeat::Repeat;

use crate::error::Result;
use crate::func::Func;
use crate::hash::HashCache;
use crate::murmur3;
use crate::value::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle to a sequence node
pub type Seq = Arc<dyn ISeq>;

/// Shared handle to a chunk
pub type Chunk = Arc<dyn IChunk>;

/// Cached hashes carried by sequence nodes
#[derive(Debug, Clone)]
pub struct SeqHashes {
    hasheq: HashCache,
    hash_code: HashCache,
}

impl SeqHashes {
    /// Empty caches
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasheq: HashCache::for_seq(),
            hash_code: HashCache::for_seq(),
        }
    }

    /// Murmur3 hash cache
    #[inline]
    #[must_use]
    pub const fn hasheq_cache(&self) -> &HashCache {
        &self.hasheq
    }

    /// Host hash cache
    #[inline]
    #[must_use]
    pub const fn hash_code_cache(&self) -> &HashCache {
        &self.hash_code
    }
}

impl Default for SeqHashes {
    fn default() -> Self {
        Self::new()
    }
}

/// Visitor passed to [`ISeq::for_each_item`]; return `false` to stop
pub type ItemVisitor<'a> = dyn FnMut(Value) -> Result<bool> + 'a;

/// A persistent sequence node
pub trait ISeq: Send + Sync + Debug {
    /// Head element
    ///
    /// # Errors
    /// Propagates failures from lazily computed elements
    fn first(&self) -> Result<Value>;

    /// Rest of the sequence, `None` when exhausted
    ///
    /// # Errors
    /// Propagates failures from lazily computed tails
    fn next(&self) -> Result<Option<Seq>>;

    /// Rest of the sequence, the canonical empty list when exhausted
    ///
    /// # Errors
    /// Propagates failures from lazily computed tails
    fn more(&self) -> Result<Seq> {
        Ok(self.next()?.unwrap_or_else(empty_list))
    }

    /// Constant-time element count, if this node knows it
    fn counted(&self) -> Option<usize> {
        None
    }

    /// Element count
    ///
    /// Walks the chain, stopping early at the first node with a
    /// constant-time count.
    ///
    /// # Errors
    /// Propagates failures from lazily computed tails
    fn count(&self) -> Result<usize> {
        if let Some(n) = self.counted() {
            return Ok(n);
        }
        let mut i = 1;
        let mut cursor = self.next()?;
        while let Some(node) = cursor {
            if let Some(n) = node.counted() {
                return Ok(i + n);
            }
            i += 1;
            cursor = node.next()?;
        }
        Ok(i)
    }

    /// Visit elements in order until the visitor returns `false`
    ///
    /// # Errors
    /// Propagates failures from the visitor or from lazy elements
    fn for_each_item(&self, visit: &mut ItemVisitor<'_>) -> Result<()> {
        if !visit(self.first()?)? {
            return Ok(());
        }
        let mut cursor = self.next()?;
        while let Some(node) = cursor {
            if !visit(node.first()?)? {
                return Ok(());
            }
            cursor = node.next()?;
        }
        Ok(())
    }

    /// Hash caches, for node types that memoize
    fn hash_caches(&self) -> Option<&SeqHashes> {
        None
    }

    /// Ordered Murmur3 hash of the elements, memoized when possible
    ///
    /// # Errors
    /// Propagates failures from lazy elements
    fn hasheq(&self) -> Result<i32> {
        let compute = || -> Result<i32> {
            let mut hashes = Vec::new();
            self.for_each_item(&mut |item: Value| -> Result<bool> {
                hashes.push(item.hasheq()?);
                Ok(true)
            })?;
            Ok(murmur3::hash_ordered(hashes))
        };
        match self.hash_caches() {
            Some(caches) => caches.hasheq.get_or_try_init(compute),
            None => compute(),
        }
    }

    /// Host-style ordered hash (`31*h + hash`), memoized when possible
    ///
    /// # Errors
    /// Propagates failures from lazy elements
    fn hash_code(&self) -> Result<i32> {
        let compute = || -> Result<i32> {
            let mut hash: i32 = 1;
            self.for_each_item(&mut |item: Value| -> Result<bool> {
                hash = hash.wrapping_mul(31).wrapping_add(item.hash_code()?);
                Ok(true)
            })?;
            Ok(hash)
        };
        match self.hash_caches() {
            Some(caches) => caches.hash_code.get_or_try_init(compute),
            None => compute(),
        }
    }

    /// Downcast to a lazy sequence
    fn as_lazy(&self) -> Option<&LazySeq> {
        None
    }

    /// Check for the canonical empty list
    fn is_empty_list(&self) -> bool {
        false
    }

    /// Chunked traversal view
    fn as_chunked(&self) -> Option<&dyn IChunkedSeq> {
        None
    }

    /// Direct reduction view
    fn as_reduce(&self) -> Option<&dyn IReduce> {
        None
    }
}

/// A fixed-size immutable window of elements
pub trait IChunk: Send + Sync + Debug {
    /// Element at `i`
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfBounds`] past the window
    fn nth(&self, i: usize) -> Result<Value>;

    /// Number of elements in the window
    fn count(&self) -> usize;

    /// Same window without its first element
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] when nothing can be dropped
    fn drop_first(&self) -> Result<Chunk>;

    /// Fold the window; a [`Value::Reduced`] result is returned still wrapped
    ///
    /// # Errors
    /// Propagates failures from `f`
    fn reduce(&self, f: &Func, init: Value) -> Result<Value>;
}

/// A sequence that can be walked one chunk at a time
pub trait IChunkedSeq: ISeq {
    /// Current chunk
    ///
    /// # Errors
    /// Propagates failures while computing the chunk
    fn chunked_first(&self) -> Result<Chunk>;

    /// Sequence after the current chunk, `None` when exhausted
    ///
    /// # Errors
    /// Propagates failures while computing the rest
    fn chunked_next(&self) -> Result<Option<Seq>>;

    /// Sequence after the current chunk, empty list when exhausted
    ///
    /// # Errors
    /// Propagates failures while computing the rest
    fn chunked_more(&self) -> Result<Seq> {
        Ok(self.chunked_next()?.unwrap_or_else(empty_list))
    }
}

/// Direct reduction without materializing nodes
///
/// Both methods stop at a [`Value::Reduced`] result and return it unwrapped.
pub trait IReduce {
    /// Reduce using the first element as the initial accumulator
    ///
    /// # Errors
    /// Propagates failures from `f`
    fn reduce(&self, f: &Func) -> Result<Value>;

    /// Reduce from an explicit initial accumulator
    ///
    /// # Errors
    /// Propagates failures from `f`
    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value>;
}

/// Canonicalize a node: realize lazies and map the empty list to `None`
///
/// # Errors
/// Propagates failures raised while realizing a lazy sequence
pub fn seq_of(s: &Seq) -> Result<Option<Seq>> {
    if let Some(lazy) = s.as_lazy() {
        return lazy.seq();
    }
    if s.is_empty_list() {
        return Ok(None);
    }
    Ok(Some(Arc::clone(s)))
}

/// Prepend `item` to anything seqable
///
/// # Errors
/// Returns [`crate::Error::NotSeqable`] if `coll` has no seq view
pub fn cons(item: Value, coll: &Value) -> Result<Seq> {
    let rest = match coll {
        Value::Nil => None,
        Value::Seq(s) => Some(Arc::clone(s)),
        other => other.seq()?,
    };
    Ok(Arc::new(Cons::new(item, rest)))
}

/// Build a counted list from values
#[must_use]
pub fn list<I>(items: I) -> Seq
where
    I: IntoIterator<Item = Value>,
{
    from_vec(items.into_iter().collect()).unwrap_or_else(empty_list)
}

/// Array-backed seq over `items`, `None` when empty
#[must_use]
pub fn from_vec(items: Vec<Value>) -> Option<Seq> {
    if items.is_empty() {
        None
    } else {
        Some(Arc::new(ArraySeq::new(items.into())))
    }
}

/// Fallible iterator over the elements of a canonical seq
#[derive(Debug)]
pub struct SeqIter {
    cursor: Option<Seq>,
    pending: Option<crate::Error>,
}

impl Iterator for SeqIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        let node = self.cursor.take()?;
        let item = match node.first() {
            Ok(item) => item,
            Err(err) => return Some(Err(err)),
        };
        match node.next() {
            Ok(rest) => self.cursor = rest,
            Err(err) => self.pending = Some(err),
        }
        Some(Ok(item))
    }
}

/// Iterate a canonical seq (as returned by [`Value::seq`])
#[inline]
#[must_use]
pub fn iter(head: Option<Seq>) -> SeqIter {
    SeqIter {
        cursor: head,
        pending: None,
    }
}

/// Element-wise equality of two sequential values
///
/// # Errors
/// Propagates failures raised while realizing either side
pub fn equiv_sequential(a: &Value, b: &Value) -> Result<bool> {
    let known = |v: &Value| match v {
        Value::Vector(vec) => Some(vec.count()),
        Value::Seq(s) => s.counted(),
        _ => None,
    };
    if let (Some(x), Some(y)) = (known(a), known(b)) {
        if x != y {
            return Ok(false);
        }
    }

    let mut left = iter(a.seq()?);
    let mut right = iter(b.seq()?);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ok(true),
            (Some(x), Some(y)) => {
                if !x?.equiv(&y?)? {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
    }
}

/// Reduce any seqable value
///
/// Uses a collection's direct reduction when available, chunk-at-a-time
/// reduction for chunked seqs, and a plain walk otherwise. With no `init`
/// an empty collection reduces to `f()`.
///
/// # Errors
/// Propagates failures from `f` or from realizing `coll`
pub fn reduce(coll: &Value, f: &Func, init: Option<Value>) -> Result<Value> {
    let Some(head) = coll.seq()? else {
        return match init {
            Some(init) => Ok(init),
            None => f.invoke0(),
        };
    };

    if let Some(direct) = head.as_reduce() {
        return match init {
            Some(init) => direct.reduce_init(f, init),
            None => direct.reduce(f),
        };
    }

    let (mut acc, mut cursor) = match init {
        Some(init) => (init, Some(head)),
        None => (head.first()?, head.next()?),
    };
    while let Some(node) = cursor {
        if let Some(chunked) = node.as_chunked() {
            acc = chunked.chunked_first()?.reduce(f, acc)?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            cursor = chunked.chunked_next()?;
        } else {
            acc = f.invoke2(acc, node.first()?)?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
            cursor = node.next()?;
        }
    }
    Ok(acc)
}

/// Collect a seqable value into a `Vec`
///
/// # Errors
/// Propagates failures raised while realizing `coll`
pub fn to_vec(coll: &Value) -> Result<Vec<Value>> {
    iter(coll.seq()?).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn longs(xs: &[i64]) -> Value {
        Value::list(xs.iter().copied().map(Value::Long))
    }

    fn add() -> Func {
        Func::new("+", |args| match args {
            [Value::Long(a), Value::Long(b)] => Ok(Value::Long(a + b)),
            [] => Ok(Value::Long(0)),
            _ => Err(Error::user("bad args")),
        })
    }

    #[test]
    fn count_short_circuits_on_counted_tail() {
        let tail = list([Value::Long(2), Value::Long(3)]);
        let s = cons(Value::Long(1), &Value::Seq(tail)).unwrap();
        assert_eq!(s.counted(), None);
        assert_eq!(s.count().unwrap(), 3);
    }

    #[test]
    fn more_returns_empty_list() {
        let s = list([Value::Long(1)]);
        assert!(s.next().unwrap().is_none());
        assert!(s.more().unwrap().is_empty_list());
    }

    #[test]
    fn equality_requires_equal_length() {
        assert_ne!(longs(&[1, 2]), longs(&[1, 2, 3]));
        assert_ne!(longs(&[1, 2, 3]), longs(&[1, 2]));
        assert_eq!(longs(&[1, 2, 3]), longs(&[1, 2, 3]));
        assert_ne!(longs(&[1]), Value::Long(1));
    }

    #[test]
    fn hasheq_is_memoized_on_nodes() {
        let s = list([Value::Long(1), Value::Long(2), Value::Long(3)]);
        assert_eq!(s.hasheq().unwrap(), 736_442_005);
        assert_eq!(s.hash_caches().and_then(|c| c.hasheq.cached()), Some(736_442_005));
    }

    #[test]
    fn reduce_walks_plain_seqs() {
        assert_eq!(reduce(&longs(&[1, 2, 3]), &add(), None).unwrap(), Value::Long(6));
        assert_eq!(
            reduce(&longs(&[1, 2, 3]), &add(), Some(Value::Long(10))).unwrap(),
            Value::Long(16)
        );
        assert_eq!(reduce(&Value::Nil, &add(), None).unwrap(), Value::Long(0));
    }

    #[test]
    fn iterator_collects() {
        let items = to_vec(&longs(&[4, 5])).unwrap();
        assert_eq!(items, vec![Value::Long(4), Value::Long(5)]);
    }
}
