//! The dynamic value type
//!
//! [`Value`] is what every collection holds and every function receives. It
//! is cheap to clone: scalars are inline and everything else sits behind an
//! `Arc`. Equality (`PartialEq`) is the language's equivalence and `Hash` is
//! the matching Murmur3-based `hasheq`, so values can key `im` maps directly.

use crate::coll::{PersistentMap, PersistentSet, PersistentVector};
use crate::error::{Error, Result};
use crate::func::Func;
use crate::hash::{double_hash_code, long_hash_code, string_hash_code};
use crate::murmur3;
use crate::numeric::{self, BigInt, Ratio};
use crate::seq::{self, Seq};
use crate::symbol::{Keyword, Symbol};
use std::fmt::{self, Debug, Display, Formatter, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Host hash codes of the boolean values
const TRUE_HASH: i32 = 1231;
const FALSE_HASH: i32 = 1237;

/// Elements printed by `Debug` before a sequence is elided
const DEBUG_PRINT_LIMIT: usize = 32;

/// A dynamically typed runtime value
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Nil,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Long(i64),
    /// Double-precision float
    Double(f64),
    /// Arbitrary-precision integer
    BigInt(BigInt),
    /// Exact ratio
    Ratio(Ratio),
    /// Character
    Char(char),
    /// Immutable string
    Str(Arc<str>),
    /// Symbol
    Symbol(Symbol),
    /// Keyword
    Keyword(Keyword),
    /// Sequence (possibly lazy, possibly empty)
    Seq(Seq),
    /// Persistent vector
    Vector(PersistentVector),
    /// Persistent map
    Map(PersistentMap),
    /// Persistent set
    Set(PersistentSet),
    /// Function
    Fn(Func),
    /// Early-termination marker produced inside reductions
    Reduced(Arc<Value>),
}

impl Value {
    /// Build a string value
    #[inline]
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }

    /// Build a keyword value from `"name"` or `"ns/name"`
    #[inline]
    #[must_use]
    pub fn keyword(qualified: &str) -> Self {
        Self::Keyword(Keyword::parse(qualified))
    }

    /// Build a symbol value from `"name"` or `"ns/name"`
    #[inline]
    #[must_use]
    pub fn symbol(qualified: &str) -> Self {
        Self::Symbol(Symbol::parse(qualified))
    }

    /// Build a vector value
    #[must_use]
    pub fn vector<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Vector(items.into_iter().collect())
    }

    /// Build a list (sequence) value
    #[must_use]
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Seq(seq::list(items))
    }

    /// Wrap a value to stop a reduction early
    #[inline]
    #[must_use]
    pub fn reduced(value: Value) -> Self {
        Self::Reduced(Arc::new(value))
    }

    /// Check for the early-termination marker
    #[inline]
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        matches!(self, Self::Reduced(_))
    }

    /// Strip one early-termination marker, if present
    #[inline]
    #[must_use]
    pub fn unreduced(self) -> Self {
        match self {
            Self::Reduced(inner) => (*inner).clone(),
            other => other,
        }
    }

    /// Type name used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::BigInt(_) => "bigint",
            Self::Ratio(_) => "ratio",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Keyword(_) => "keyword",
            Self::Seq(_) => "seq",
            Self::Vector(_) => "vector",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Fn(_) => "fn",
            Self::Reduced(_) => "reduced",
        }
    }

    /// `nil` check
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Truthiness: everything except `nil` and `false`
    #[inline]
    #[must_use]
    pub fn truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Numeric check
    #[inline]
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Long(_) | Self::Double(_) | Self::BigInt(_) | Self::Ratio(_)
        )
    }

    /// Ordered, positionally comparable collection (seqs and vectors)
    #[inline]
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Seq(_) | Self::Vector(_))
    }

    /// Canonical seq view
    ///
    /// `nil` and empty collections yield `None`; lazy sequences are realized.
    ///
    /// # Errors
    /// Returns [`Error::NotSeqable`] for scalars, or any error raised while
    /// realizing a lazy sequence
    pub fn seq(&self) -> Result<Option<Seq>> {
        match self {
            Self::Nil => Ok(None),
            Self::Seq(s) => seq::seq_of(s),
            Self::Vector(v) => Ok(v.seq()),
            Self::Map(m) => Ok(m.seq()),
            Self::Set(s) => Ok(s.seq()),
            Self::Str(s) => Ok(seq::from_vec(s.chars().map(Self::Char).collect())),
            other => Err(Error::NotSeqable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Element count
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for values without a count
    pub fn count(&self) -> Result<usize> {
        match self {
            Self::Nil => Ok(0),
            Self::Str(s) => Ok(s.chars().count()),
            Self::Seq(s) => s.count(),
            Self::Vector(v) => Ok(v.count()),
            Self::Map(m) => Ok(m.count()),
            Self::Set(s) => Ok(s.count()),
            other => Err(Error::invalid(format!(
                "count not supported on {}",
                other.type_name()
            ))),
        }
    }

    /// Language equality
    ///
    /// # Errors
    /// Propagates failures raised while realizing lazy sequences
    pub fn equiv(&self, other: &Value) -> Result<bool> {
        if let Some(same) = numeric::num_equiv(self, other) {
            return Ok(same);
        }
        Ok(match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Keyword(a), Self::Keyword(b)) => a == b,
            (Self::Fn(a), Self::Fn(b)) => a.ptr_eq(b),
            (Self::Reduced(a), Self::Reduced(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), _) => a.equiv(other)?,
            (Self::Set(a), _) => a.equiv(other)?,
            _ if self.is_sequential() && other.is_sequential() => {
                seq::equiv_sequential(self, other)?
            }
            _ => false,
        })
    }

    /// Murmur3-based hash consistent with [`Value::equiv`]
    ///
    /// # Errors
    /// Propagates failures raised while realizing lazy sequences
    pub fn hasheq(&self) -> Result<i32> {
        Ok(match self {
            Self::Nil => 0,
            Self::Bool(true) => TRUE_HASH,
            Self::Bool(false) => FALSE_HASH,
            Self::Long(n) => murmur3::hash_long(*n),
            Self::Double(d) => double_hash_code(*d),
            Self::BigInt(b) => b.hasheq(),
            Self::Ratio(r) => r.hasheq(),
            Self::Char(c) => u32::from(*c) as i32,
            Self::Str(s) => murmur3::hash_string(s),
            Self::Symbol(s) => s.hasheq(),
            Self::Keyword(k) => k.hasheq(),
            Self::Seq(s) => s.hasheq()?,
            Self::Vector(v) => v.hasheq()?,
            Self::Map(m) => m.hasheq()?,
            Self::Set(s) => s.hasheq()?,
            Self::Fn(f) => f.identity_hash(),
            Self::Reduced(inner) => inner.hasheq()?,
        })
    }

    /// Host-style hash (31-multiplier ordered, XOR/sum unordered)
    ///
    /// # Errors
    /// Propagates failures raised while realizing lazy sequences
    pub fn hash_code(&self) -> Result<i32> {
        Ok(match self {
            Self::Nil => 0,
            Self::Bool(true) => TRUE_HASH,
            Self::Bool(false) => FALSE_HASH,
            Self::Long(n) => long_hash_code(*n),
            Self::Double(d) => double_hash_code(*d),
            Self::BigInt(b) => b.hash_code(),
            Self::Ratio(r) => r.hash_code(),
            Self::Char(c) => u32::from(*c) as i32,
            Self::Str(s) => string_hash_code(s),
            Self::Symbol(s) => s.hash_code(),
            Self::Keyword(k) => k.hash_code(),
            Self::Seq(s) => s.hash_code()?,
            Self::Vector(v) => v.hash_code()?,
            Self::Map(m) => m.hash_code()?,
            Self::Set(s) => s.hash_code()?,
            Self::Fn(f) => f.identity_hash(),
            Self::Reduced(inner) => inner.hash_code()?,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equiv(other).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "equality check failed while realizing a sequence");
            false
        })
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let hash = self.hasheq().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "hash failed while realizing a sequence");
            0
        });
        state.write_i32(hash);
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Long(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Self::Keyword(k)
    }
}

impl From<Seq> for Value {
    fn from(s: Seq) -> Self {
        Self::Seq(s)
    }
}

impl From<Option<Seq>> for Value {
    fn from(s: Option<Seq>) -> Self {
        s.map_or(Self::Nil, Self::Seq)
    }
}

impl From<PersistentVector> for Value {
    fn from(v: PersistentVector) -> Self {
        Self::Vector(v)
    }
}

impl From<PersistentMap> for Value {
    fn from(m: PersistentMap) -> Self {
        Self::Map(m)
    }
}

impl From<PersistentSet> for Value {
    fn from(s: PersistentSet) -> Self {
        Self::Set(s)
    }
}

impl From<Func> for Value {
    fn from(f: Func) -> Self {
        Self::Fn(f)
    }
}

fn write_char_literal(f: &mut Formatter<'_>, c: char) -> fmt::Result {
    match c {
        ' ' => f.write_str("\\space"),
        '\n' => f.write_str("\\newline"),
        '\t' => f.write_str("\\tab"),
        '\r' => f.write_str("\\return"),
        other => write!(f, "\\{other}"),
    }
}

fn write_string_literal(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

fn write_items(
    f: &mut Formatter<'_>,
    items: impl Iterator<Item = Result<Value>>,
    limit: Option<usize>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if limit.is_some_and(|max| i >= max) {
            return f.write_str(" ...");
        }
        if i > 0 {
            f.write_char(' ')?;
        }
        match item {
            Ok(v) => write_value(f, &v, limit)?,
            Err(err) => return write!(f, "#<error {err}>"),
        }
    }
    Ok(())
}

fn write_value(f: &mut Formatter<'_>, value: &Value, limit: Option<usize>) -> fmt::Result {
    match value {
        Value::Nil => f.write_str("nil"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Long(n) => write!(f, "{n}"),
        Value::Double(d) => write!(f, "{d:?}"),
        Value::BigInt(b) => write!(f, "{b}"),
        Value::Ratio(r) => write!(f, "{r}"),
        Value::Char(c) => write_char_literal(f, *c),
        Value::Str(s) => write_string_literal(f, s),
        Value::Symbol(s) => write!(f, "{s}"),
        Value::Keyword(k) => write!(f, "{k}"),
        Value::Seq(s) => {
            f.write_char('(')?;
            match seq::seq_of(s) {
                Ok(head) => write_items(f, seq::iter(head), limit)?,
                Err(err) => write!(f, "#<error {err}>")?,
            }
            f.write_char(')')
        }
        Value::Vector(v) => {
            f.write_char('[')?;
            write_items(f, v.iter().cloned().map(Ok), limit)?;
            f.write_char(']')
        }
        Value::Map(m) => {
            f.write_char('{')?;
            for (i, (k, v)) in m.entries().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, &k, limit)?;
                f.write_char(' ')?;
                write_value(f, &v, limit)?;
            }
            f.write_char('}')
        }
        Value::Set(s) => {
            f.write_str("#{")?;
            write_items(f, s.iter().map(Ok), limit)?;
            f.write_char('}')
        }
        Value::Fn(func) => write!(f, "{func:?}"),
        Value::Reduced(inner) => {
            f.write_str("#<reduced ")?;
            write_value(f, inner, limit)?;
            f.write_char('>')
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_value(f, self, None)
    }
}

impl Debug for Value {
    /// Like `Display`, but long or infinite sequences are elided
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_value(f, self, Some(DEBUG_PRINT_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Long(0).truthy());
        assert!(Value::string("").truthy());
    }

    #[test]
    fn vectors_and_lists_are_equal() {
        let v = Value::vector([Value::Long(1), Value::Long(2)]);
        let l = Value::list([Value::Long(1), Value::Long(2)]);
        assert_eq!(v, l);
        assert_eq!(v.hasheq().unwrap(), l.hasheq().unwrap());
    }

    #[test]
    fn empty_sequentials_are_equal() {
        let v = Value::vector([]);
        let l = Value::list([]);
        assert_eq!(v, l);
        assert_eq!(v.hasheq().unwrap(), -2_017_569_654);
        assert_eq!(l.hasheq().unwrap(), -2_017_569_654);
    }

    #[test]
    fn seq_of_empty_is_none() {
        assert!(Value::vector([]).seq().unwrap().is_none());
        assert!(Value::string("").seq().unwrap().is_none());
        assert!(Value::Nil.seq().unwrap().is_none());
        assert!(matches!(
            Value::Long(1).seq(),
            Err(Error::NotSeqable { type_name: "long" })
        ));
    }

    #[test]
    fn printing() {
        let v = Value::vector([
            Value::Long(1),
            Value::string("a\"b"),
            Value::keyword("k"),
            Value::Char(' '),
            Value::Nil,
        ]);
        assert_eq!(v.to_string(), r#"[1 "a\"b" :k \space nil]"#);
        assert_eq!(Value::list([Value::Long(1)]).to_string(), "(1)");
    }

    #[test]
    fn reduced_round_trip() {
        let r = Value::reduced(Value::Long(5));
        assert!(r.is_reduced());
        assert_eq!(r.unreduced(), Value::Long(5));
    }

    #[test]
    fn hash_matches_across_integer_categories() {
        let big = Value::BigInt(BigInt::from_i64(7));
        assert_eq!(big, Value::Long(7));
        assert_eq!(big.hasheq().unwrap(), Value::Long(7).hasheq().unwrap());
    }
}
