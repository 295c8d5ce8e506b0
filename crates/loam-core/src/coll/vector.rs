//! Persistent vector

use crate::error::{Error, Result};
use crate::murmur3;
use crate::seq::{ArrayChunk, ChunkedCons, LazySeq, Seq, SeqHashes, CHUNK_SIZE};
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Indexed persistent collection backed by an RRB vector
///
/// Its seq is chunked: each node carries a window of up to [`CHUNK_SIZE`]
/// elements, and the node for the next window is built lazily.
#[derive(Clone, Default)]
pub struct PersistentVector {
    items: im::Vector<Value>,
    hashes: Arc<SeqHashes>,
}

impl PersistentVector {
    /// Empty vector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn from_items(items: im::Vector<Value>) -> Self {
        Self {
            items,
            hashes: Arc::new(SeqHashes::new()),
        }
    }

    /// Element count
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether the vector has no elements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `i`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`] past the end
    pub fn nth(&self, i: usize) -> Result<Value> {
        self.items.get(i).cloned().ok_or(Error::IndexOutOfBounds {
            index: i,
            count: self.items.len(),
        })
    }

    /// Element at `i`, if present
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.items.get(i)
    }

    /// Append `item`
    #[must_use]
    pub fn conj(&self, item: Value) -> Self {
        let mut items = self.items.clone();
        items.push_back(item);
        Self::from_items(items)
    }

    /// Replace the element at `i`; `i == count` appends
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`] when `i > count`
    pub fn assoc_n(&self, i: usize, item: Value) -> Result<Self> {
        let count = self.items.len();
        if i == count {
            return Ok(self.conj(item));
        }
        if i > count {
            return Err(Error::IndexOutOfBounds { index: i, count });
        }
        Ok(Self::from_items(self.items.update(i, item)))
    }

    /// Drop the last element
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] on an empty vector
    pub fn pop(&self) -> Result<Self> {
        let mut items = self.items.clone();
        match items.pop_back() {
            Some(_) => Ok(Self::from_items(items)),
            None => Err(Error::invalid("can't pop empty vector")),
        }
    }

    /// Borrowing iterator
    #[inline]
    pub fn iter(&self) -> im::vector::Iter<'_, Value> {
        self.items.iter()
    }

    /// Chunked seq, `None` when empty
    #[must_use]
    pub fn seq(&self) -> Option<Seq> {
        chunk_seq(&self.items, 0)
    }

    /// Ordered Murmur3 hash, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy elements
    pub fn hasheq(&self) -> Result<i32> {
        self.hashes.hasheq_cache().get_or_try_init(|| -> Result<i32> {
            let hashes = self.items.iter().map(Value::hasheq).collect::<Result<Vec<_>>>()?;
            Ok(murmur3::hash_ordered(hashes))
        })
    }

    /// Host-style ordered hash, memoized
    ///
    /// # Errors
    /// Propagates failures hashing lazy elements
    pub fn hash_code(&self) -> Result<i32> {
        self.hashes.hash_code_cache().get_or_try_init(|| -> Result<i32> {
            self.items.iter().try_fold(1_i32, |hash, item| -> Result<i32> {
                Ok(hash.wrapping_mul(31).wrapping_add(item.hash_code()?))
            })
        })
    }
}

/// Seq over `items[offset..]`, one chunk at a time
fn chunk_seq(items: &im::Vector<Value>, offset: usize) -> Option<Seq> {
    if offset >= items.len() {
        return None;
    }
    let end = (offset + CHUNK_SIZE).min(items.len());
    let window: Arc<[Value]> = items.skip(offset).take(end - offset).into_iter().collect();
    let more = (end < items.len()).then(|| {
        let items = items.clone();
        Arc::new(LazySeq::from_fn(move || Ok(chunk_seq(&items, end).into()))) as Seq
    });
    Some(Arc::new(ChunkedCons::new(Arc::new(ArrayChunk::new(window)), more)))
}

impl FromIterator<Value> for PersistentVector {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl Debug for PersistentVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
