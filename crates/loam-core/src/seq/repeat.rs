//! Repetition of a single value, counted or infinite

use super::{empty_list, IReduce, ISeq, Seq, SeqHashes};
use crate::error::Result;
use crate::func::Func;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

/// `val` repeated `count` times, or forever
pub struct Repeat {
    count: Option<u64>,
    val: Value,
    next: OnceCell<Option<Seq>>,
    this: Weak<Repeat>,
    hashes: SeqHashes,
}

impl Repeat {
    fn build(count: Option<u64>, val: Value) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            count,
            val,
            next: OnceCell::new(),
            this: this.clone(),
            hashes: SeqHashes::new(),
        })
    }

    /// `val` forever; `next` on an infinite repeat returns the same node
    #[must_use]
    pub fn infinite(val: Value) -> Seq {
        Self::build(None, val)
    }

    /// `val` repeated `count` times; empty unless `count > 0`
    #[must_use]
    pub fn times(count: i64, val: Value) -> Seq {
        match u64::try_from(count) {
            Ok(n) if n > 0 => Self::build(Some(n), val) as Seq,
            _ => empty_list(),
        }
    }
}

impl ISeq for Repeat {
    fn first(&self) -> Result<Value> {
        Ok(self.val.clone())
    }

    fn next(&self) -> Result<Option<Seq>> {
        let Some(n) = self.count else {
            return Ok(self.this.upgrade().map(|this| this as Seq));
        };
        let next = self
            .next
            .get_or_init(|| (n > 1).then(|| Self::build(Some(n - 1), self.val.clone()) as Seq));
        Ok(next.clone())
    }

    fn counted(&self) -> Option<usize> {
        self.count.and_then(|n| usize::try_from(n).ok())
    }

    fn hash_caches(&self) -> Option<&SeqHashes> {
        Some(&self.hashes)
    }

    fn as_reduce(&self) -> Option<&dyn IReduce> {
        Some(self)
    }
}

impl IReduce for Repeat {
    fn reduce(&self, f: &Func) -> Result<Value> {
        let mut acc = self.val.clone();
        match self.count {
            None => loop {
                acc = f.invoke2(acc, self.val.clone())?;
                if acc.is_reduced() {
                    return Ok(acc.unreduced());
                }
            },
            Some(n) => {
                for _ in 1..n {
                    acc = f.invoke2(acc, self.val.clone())?;
                    if acc.is_reduced() {
                        return Ok(acc.unreduced());
                    }
                }
                Ok(acc)
            }
        }
    }

    fn reduce_init(&self, f: &Func, init: Value) -> Result<Value> {
        let mut acc = init;
        match self.count {
            None => loop {
                acc = f.invoke2(acc, self.val.clone())?;
                if acc.is_reduced() {
                    return Ok(acc.unreduced());
                }
            },
            Some(n) => {
                for _ in 0..n {
                    acc = f.invoke2(acc, self.val.clone())?;
                    if acc.is_reduced() {
                        return Ok(acc.unreduced());
                    }
                }
                Ok(acc)
            }
        }
    }
}

impl Debug for Repeat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeat")
            .field("count", &self.count)
            .field("val", &self.val)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq;

    #[test]
    fn non_positive_count_is_empty() {
        assert!(Repeat::times(0, Value::Nil).is_empty_list());
        assert!(Repeat::times(-4, Value::Nil).is_empty_list());
    }

    #[test]
    fn counted_repeat_ends() {
        let s = Repeat::times(3, Value::keyword("x"));
        let items = seq::to_vec(&Value::Seq(s.clone())).unwrap();
        assert_eq!(items, vec![Value::keyword("x"); 3]);
        assert_eq!(s.counted(), Some(3));
    }

    #[test]
    fn infinite_repeat_loops_on_itself() {
        let s = Repeat::infinite(Value::Long(1));
        let next = s.next().unwrap().unwrap();
        assert!(Arc::ptr_eq(&s, &next));
    }

    #[test]
    fn reduce_stops_infinite_repeat() {
        let s = Repeat::infinite(Value::Long(2));
        let until_ten = Func::anonymous(|args| match args {
            [Value::Long(acc), Value::Long(x)] if acc + x >= 10 => {
                Ok(Value::reduced(Value::Long(acc + x)))
            }
            [Value::Long(acc), Value::Long(x)] => Ok(Value::Long(acc + x)),
            _ => Err(crate::Error::user("bad args")),
        });
        assert_eq!(
            seq::reduce(&Value::Seq(s), &until_ten, None).unwrap(),
            Value::Long(10)
        );
    }
}
