//! Key and value projections over a seq of map entries

use crate::error::{Error, Result};
use crate::seq::{ISeq, Seq, SeqHashes};
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Element `i` of an entry yielded by a map seq
fn entry_part(entry: Value, i: usize) -> Result<Value> {
    match entry {
        Value::Vector(pair) if pair.count() == 2 => pair.nth(i),
        other => Err(Error::invalid(format!(
            "{} is not a map entry",
            other.type_name()
        ))),
    }
}

/// Seq of the keys of a map seq
pub struct KeySeq {
    entries: Seq,
    hashes: SeqHashes,
}

impl KeySeq {
    /// Project `entries`; `None` stays `None`
    #[must_use]
    pub fn create(entries: Option<Seq>) -> Option<Seq> {
        entries.map(|entries| {
            Arc::new(Self {
                entries,
                hashes: SeqHashes::new(),
            }) as Seq
        })
    }
}

impl ISeq for KeySeq {
    fn first(&self) -> Result<Value> {
        entry_part(self.entries.first()?, 0)
    }

    fn next(&self) -> Result<Option<Seq>> {
        Ok(Self::create(self.entries.next()?))
    }

    fn counted(&self) -> Option<usize> {
        self.entries.counted()
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }
}

impl Debug for KeySeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySeq")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// Seq of the values of a map seq
pub struct ValSeq {
    entries: Seq,
    hashes: SeqHashes,
}

impl ValSeq {
    /// Project `entries`; `None` stays `None`
    #[must_use]
    pub fn create(entries: Option<Seq>) -> Option<Seq> {
        entries.map(|entries| {
            Arc::new(Self {
                entries,
                hashes: SeqHashes::new(),
            }) as Seq
        })
    }
}

impl ISeq for ValSeq {
    fn first(&self) -> Result<Value> {
        entry_part(self.entries.first()?, 1)
    }

    fn next(&self) -> Result<Option<Seq>> {
        Ok(Self::create(self.entries.next()?))
    }

    fn counted(&self) -> Option<usize> {
        self.entries.counted()
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }
}

impl Debug for ValSeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValSeq")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq;

    fn entries() -> Option<Seq> {
        seq::from_vec(vec![
            Value::vector([Value::keyword("a"), Value::Long(1)]),
            Value::vector([Value::keyword("b"), Value::Long(2)]),
        ])
    }

    #[test]
    fn projects_keys_and_values() {
        let keys = seq::to_vec(&KeySeq::create(entries()).into()).unwrap();
        assert_eq!(keys, vec![Value::keyword("a"), Value::keyword("b")]);
        let vals = seq::to_vec(&ValSeq::create(entries()).into()).unwrap();
        assert_eq!(vals, vec![Value::Long(1), Value::Long(2)]);
    }

    #[test]
    fn counts_come_from_the_entry_seq() {
        let keys = KeySeq::create(entries()).unwrap();
        assert_eq!(keys.counted(), Some(2));
    }

    #[test]
    fn empty_stays_empty() {
        assert!(KeySeq::create(None).is_none());
        assert!(ValSeq::create(None).is_none());
    }

    #[test]
    fn non_entries_fail() {
        let keys = KeySeq::create(seq::from_vec(vec![Value::Long(1)])).unwrap();
        assert!(keys.first().is_err());
    }
}
