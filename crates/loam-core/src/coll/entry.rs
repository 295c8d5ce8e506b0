//! Map entries and the argument shapes accepted by map `conj`

use crate::error::{Error, Result};
use crate::seq::{self, Seq};
use crate::value::Value;

/// A key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapEntry {
    key: Value,
    val: Value,
}

impl MapEntry {
    /// Pair `key` with `val`
    #[inline]
    #[must_use]
    pub const fn new(key: Value, val: Value) -> Self {
        Self { key, val }
    }

    /// The key
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &Value {
        &self.key
    }

    /// The value
    #[inline]
    #[must_use]
    pub const fn val(&self) -> &Value {
        &self.val
    }

    /// Split into `(key, val)`
    #[inline]
    #[must_use]
    pub fn into_pair(self) -> (Value, Value) {
        (self.key, self.val)
    }

    /// The entry as a two-element vector, the form map seqs yield
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::vector([self.key.clone(), self.val.clone()])
    }
}

impl From<(Value, Value)> for MapEntry {
    fn from((key, val): (Value, Value)) -> Self {
        Self::new(key, val)
    }
}

/// What a map `conj` can be given
#[derive(Debug, Clone)]
pub enum EntryShape {
    /// A typed entry
    Entry(MapEntry),
    /// An indexable value that must hold exactly a key and a value
    Pair(Value),
    /// A seq whose elements are pairs (a map's own seq, for instance)
    Entries(Option<Seq>),
}

impl EntryShape {
    /// Classify a dynamic value
    ///
    /// Vectors are pairs, maps and seqs are runs of entries, and `nil` is an
    /// empty run.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for anything else
    pub fn classify(item: &Value) -> Result<Self> {
        match item {
            Value::Vector(_) => Ok(Self::Pair(item.clone())),
            Value::Nil | Value::Map(_) | Value::Seq(_) => Ok(Self::Entries(item.seq()?)),
            other => Err(Error::invalid(format!(
                "don't know how to conj a {} onto a map",
                other.type_name()
            ))),
        }
    }

    /// Normalize to key/value pairs
    ///
    /// `context` names the operation in error messages.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] when a pair does not have exactly
    /// two elements or a run contains something other than pairs
    pub fn into_pairs(self, context: &str) -> Result<Vec<(Value, Value)>> {
        match self {
            Self::Entry(entry) => Ok(vec![entry.into_pair()]),
            Self::Pair(item) => Ok(vec![pair_of(&item, context)?]),
            Self::Entries(head) => seq::iter(head)
                .map(|item| match item? {
                    entry @ Value::Vector(_) => pair_of(&entry, context),
                    other => Err(Error::invalid(format!(
                        "{} is not a map entry",
                        other.type_name()
                    ))),
                })
                .collect(),
        }
    }
}

impl From<MapEntry> for EntryShape {
    fn from(entry: MapEntry) -> Self {
        Self::Entry(entry)
    }
}

impl From<(Value, Value)> for EntryShape {
    fn from(pair: (Value, Value)) -> Self {
        Self::Entry(pair.into())
    }
}

fn pair_of(item: &Value, context: &str) -> Result<(Value, Value)> {
    match item {
        Value::Vector(v) if v.count() == 2 => Ok((v.nth(0)?, v.nth(1)?)),
        Value::Vector(_) => Err(Error::invalid(format!(
            "vector arg to map {context} must be a pair"
        ))),
        other => Err(Error::invalid(format!(
            "{} is not a map entry",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pair_must_have_two_elements() {
        let bad = EntryShape::classify(&Value::vector([Value::Long(1)])).unwrap();
        let err = bad.into_pairs("conj").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: vector arg to map conj must be a pair"
        );
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(matches!(
            EntryShape::classify(&Value::Long(3)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn seq_of_pairs_normalizes() {
        let run = Value::list([
            Value::vector([Value::keyword("a"), Value::Long(1)]),
            Value::vector([Value::keyword("b"), Value::Long(2)]),
        ]);
        let pairs = EntryShape::classify(&run).unwrap().into_pairs("conj").unwrap();
        assert_eq!(
            pairs,
            vec![
                (Value::keyword("a"), Value::Long(1)),
                (Value::keyword("b"), Value::Long(2)),
            ]
        );
    }

    #[test]
    fn seq_with_non_entry_fails() {
        let run = Value::list([Value::Long(1)]);
        assert!(EntryShape::classify(&run).unwrap().into_pairs("conj").is_err());
    }

    #[test]
    fn typed_entry_passes_through() {
        let shape = EntryShape::from((Value::Long(1), Value::Nil));
        assert_eq!(
            shape.into_pairs("conj").unwrap(),
            vec![(Value::Long(1), Value::Nil)]
        );
    }
}
