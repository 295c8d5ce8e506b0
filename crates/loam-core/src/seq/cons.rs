//! Plain sequence nodes

use super::{seq_of, IReduce, ISeq, ItemVisitor, Seq, SeqHashes};
use crate::error::Result;
use crate::func::Func;
use crate::murmur3;
use crate::value::Value;
use once_cell::sync::Lazy;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

static EMPTY: Lazy<Seq> = Lazy::new(|| Arc::new(EmptyList));

/// The canonical empty list
#[inline]
#[must_use]
pub fn empty_list() -> Seq {
    Arc::clone(&EMPTY)
}

/// Terminator returned by `more()` on exhausted sequences
///
/// Behaves as an empty sequential collection: its canonical seq is `None`.
#[derive(Debug)]
pub struct EmptyList;

impl ISeq for EmptyList {
    fn first(&self) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn next(&self) -> Result<Option<Seq>> {
        Ok(None)
    }

    fn more(&self) -> Result<Seq> {
        Ok(empty_list())
    }

    fn counted(&self) -> Option<usize> {
        Some(0)
    }

    fn for_each_item(&self, _visit: &mut ItemVisitor<'_>) -> Result<()> {
        Ok(())
    }

    fn hasheq(&self) -> Result<i32> {
        Ok(murmur3::hash_ordered(std::iter::empty()))
    }

    fn hash_code(&self) -> Result<i32> {
        Ok(1)
    }

    fn is_empty_list(&self) -> bool {
        true
    }
}

/// A head element prepended to an arbitrary rest
pub struct Cons {
    first: Value,
    more: Option<Seq>,
    hashes: SeqHashes,
}

impl Cons {
    /// Prepend `first` to `more`
    #[must_use]
    pub fn new(first: Value, more: Option<Seq>) -> Self {
        Self {
            first,
            more,
            hashes: SeqHashes::new(),
        }
    }
}

impl ISeq for Cons {
    fn first(&self) -> Result<Value> {
        Ok(self.first.clone())
    }

    fn next(&self) -> Result<Option<Seq>> {
        match &self.more {
            Some(rest) => seq_of(rest),
            None => Ok(None),
        }
    }

    fn more(&self) -> Result<Seq> {
        Ok(self.more.clone().unwrap_or_else(empty_list))
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }
}

impl Debug for Cons {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cons")
            .field("first", &self.first)
            .finish_non_exhaustive()
    }
}

/// Counted sequence over a shared array
pub struct ArraySeq {
    array: Arc<[Value]>,
    index: usize,
    hashes: SeqHashes,
}

impl ArraySeq {
    /// Seq over the whole array; the array must not be empty
    #[must_use]
    pub fn new(array: Arc<[Value]>) -> Self {
        Self::at(array, 0)
    }

    fn at(array: Arc<[Value]>, index: usize) -> Self {
        Self {
            array,
            index,
            hashes: SeqHashes::new(),
        }
    }
}

impl ISeq for ArraySeq {
    fn first(&self) -> Result<Value> {
        Ok(self.array.get(self.index).cloned().unwrap_or_default())
    }

    fn next(&self) -> Result<Option<Seq>> {
        if self.index + 1 < self.array.len() {
            Ok(Some(Arc::new(Self::at(Arc::clone(&self.array), self.index + 1))))
        } else {
            Ok(None)
        }
    }

    fn counted(&self) -> Option<usize> {
        Some(self.array.len().saturating_sub(self.index))
    }

    fn for_each_item(&self, visit: &mut ItemVisitor<'_>) -> Result<()> {
        for item in &self.array[self.index..] {
            if !visit(item.clone())? {
                break;
            }
        }
        Ok(())
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }

    fn as_reduce(&self) -> Option<&dyn IReduce> {
        Some(self)
    }
}

impl IReduce for ArraySeq {
    fn reduce(&self, f: &Func) -> Result<Value> {
        let mut items = self.array[self.index..].iter();
        let mut acc = items.next().cloned().unwrap_or_default();
        for item in items {
            acc = f.invoke2(acc, item.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
        }
        Ok(acc)
    }

    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        for item in &self.array[self.index..] {
            acc = f.invoke2(acc, item.clone())?;
            if acc.is_reduced() {
                return Ok(acc.unreduced());
            }
        }
        Ok(acc)
    }
}

impl Debug for ArraySeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArraySeq")
            .field("index", &self.index)
            .field("len", &self.array.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_canonical() {
        assert!(Arc::ptr_eq(&empty_list(), &empty_list()));
        assert_eq!(empty_list().count().unwrap(), 0);
        assert!(seq_of(&empty_list()).unwrap().is_none());
    }

    #[test]
    fn cons_next_skips_empty_rest() {
        let c = Cons::new(Value::Long(1), Some(empty_list()));
        assert!(c.next().unwrap().is_none());
        assert!(c.more().unwrap().is_empty_list());
    }

    #[test]
    fn array_seq_counts_remaining() {
        let s = ArraySeq::new(vec![Value::Long(1), Value::Long(2), Value::Long(3)].into());
        let rest = s.next().unwrap().unwrap();
        assert_eq!(rest.counted(), Some(2));
        assert_eq!(rest.first().unwrap(), Value::Long(2));
    }
}
