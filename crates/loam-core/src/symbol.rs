//! Interned symbols and keywords
//!
//! Provides [`Symbol`] and [`Keyword`], both deduplicated through process-wide
//! intern tables. The tables hold weak references: an identifier nobody uses
//! any more can be dropped, and the next `intern` of the same name builds a
//! fresh instance in place of the dead entry.
//!
//! Symbols compare by namespace and name. Keywords compare by identity,
//! which the intern table makes equivalent to comparing their symbols.

use crate::hash::{hash_combine, string_hash_code};
use crate::murmur3;
use crate::value::Value;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

type SymbolKey = (Option<Box<str>>, Box<str>);

static SYMBOLS: Lazy<DashMap<SymbolKey, Weak<SymbolInner>>> = Lazy::new(DashMap::new);
static KEYWORDS: Lazy<DashMap<Symbol, Weak<KeywordInner>>> = Lazy::new(DashMap::new);

/// Keyword hashes are offset from their symbol's hash by this constant
const KEYWORD_HASH_OFFSET: i32 = 0x9e37_79b9_u32 as i32;

struct SymbolInner {
    ns: Option<Arc<str>>,
    name: Arc<str>,
    hasheq: i32,
    hash_code: i32,
}

/// A possibly namespace-qualified identifier
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

impl Symbol {
    /// Intern a symbol from an optional namespace and a name
    #[must_use]
    pub fn intern(ns: Option<&str>, name: &str) -> Self {
        let key: SymbolKey = (ns.map(Into::into), name.into());
        let mut slot = SYMBOLS.entry(key).or_insert_with(Weak::new);
        if let Some(live) = slot.upgrade() {
            return Self(live);
        }

        let name_hash = murmur3::hash_string(name);
        let ns_hash = ns.map_or(0, murmur3::hash_string);
        let inner = Arc::new(SymbolInner {
            ns: ns.map(Arc::from),
            name: Arc::from(name),
            hasheq: hash_combine(name_hash, ns_hash),
            hash_code: hash_combine(string_hash_code(name), ns.map_or(0, string_hash_code)),
        });
        *slot = Arc::downgrade(&inner);
        Self(inner)
    }

    /// Intern from `"ns/name"` or `"name"` notation
    ///
    /// The string is split at its first `/`; a lone `"/"` is a plain name.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        match qualified.find('/') {
            Some(i) if qualified != "/" => Self::intern(Some(&qualified[..i]), &qualified[i + 1..]),
            _ => Self::intern(None, qualified),
        }
    }

    /// Namespace part, if qualified
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.ns.as_deref()
    }

    /// Name part
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Murmur3-based hash consistent with equality
    #[inline]
    #[must_use]
    pub fn hasheq(&self) -> i32 {
        self.0.hasheq
    }

    /// Host-style hash
    #[inline]
    #[must_use]
    pub fn hash_code(&self) -> i32 {
        self.0.hash_code
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.name == other.0.name && self.0.ns == other.0.ns)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.0.hasheq);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    /// Unqualified symbols sort before qualified ones; then namespace, then name
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace()
            .cmp(&other.namespace())
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            Some(ns) => write!(f, "{ns}/{}", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

struct KeywordInner {
    sym: Symbol,
    hasheq: i32,
}

/// A self-evaluating interned identifier (`:name`, `:ns/name`)
#[derive(Clone)]
pub struct Keyword(Arc<KeywordInner>);

impl Keyword {
    /// Intern the keyword for `sym`
    #[must_use]
    pub fn intern(sym: Symbol) -> Self {
        let hasheq = sym.hasheq().wrapping_add(KEYWORD_HASH_OFFSET);
        let mut slot = KEYWORDS.entry(sym.clone()).or_insert_with(Weak::new);
        if let Some(live) = slot.upgrade() {
            return Self(live);
        }
        let inner = Arc::new(KeywordInner { sym, hasheq });
        *slot = Arc::downgrade(&inner);
        Self(inner)
    }

    /// Intern from an optional namespace and a name
    #[inline]
    #[must_use]
    pub fn intern_ns(ns: Option<&str>, name: &str) -> Self {
        Self::intern(Symbol::intern(ns, name))
    }

    /// Intern from `"ns/name"` or `"name"` notation (no leading colon)
    #[inline]
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        Self::intern(Symbol::parse(qualified))
    }

    /// Look up a live keyword without creating one
    #[must_use]
    pub fn find(sym: &Symbol) -> Option<Self> {
        KEYWORDS
            .get(sym)
            .and_then(|slot| slot.upgrade())
            .map(Self)
    }

    /// Underlying symbol
    #[inline]
    #[must_use]
    pub fn sym(&self) -> &Symbol {
        &self.0.sym
    }

    /// Namespace part, if qualified
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.sym.namespace()
    }

    /// Name part
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.sym.name()
    }

    /// Murmur3-based hash (symbol hash plus a fixed offset)
    #[inline]
    #[must_use]
    pub fn hasheq(&self) -> i32 {
        self.0.hasheq
    }

    /// Host-style hash
    #[inline]
    #[must_use]
    pub fn hash_code(&self) -> i32 {
        self.0.sym.hash_code().wrapping_add(KEYWORD_HASH_OFFSET)
    }

    /// Use the keyword as a lookup function
    ///
    /// Maps yield the associated value, sets yield the keyword when present;
    /// anything else (or a miss) yields `not_found`.
    #[must_use]
    pub fn invoke(&self, target: &Value, not_found: &Value) -> Value {
        let key = Value::Keyword(self.clone());
        match target {
            Value::Map(map) => map.val_at(&key).unwrap_or_else(|| not_found.clone()),
            Value::Set(set) if set.contains(&key) => key,
            _ => not_found.clone(),
        }
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Keyword {}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.0.hasheq);
    }
}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sym().cmp(other.sym())
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.sym())
    }
}

impl Debug for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let a = Symbol::intern(Some("user"), "x");
        let b = Symbol::parse("user/x");
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn parse_splits_on_first_slash() {
        let sym = Symbol::parse("a/b/c");
        assert_eq!(sym.namespace(), Some("a"));
        assert_eq!(sym.name(), "b/c");

        let slash = Symbol::parse("/");
        assert_eq!(slash.namespace(), None);
        assert_eq!(slash.name(), "/");
    }

    #[test]
    fn keyword_identity_and_hash() {
        let k1 = Keyword::parse("ns/k");
        let k2 = Keyword::intern_ns(Some("ns"), "k");
        assert_eq!(k1, k2);
        assert_eq!(
            k1.hasheq(),
            k1.sym().hasheq().wrapping_add(KEYWORD_HASH_OFFSET)
        );
        assert_eq!(k1.to_string(), ":ns/k");
    }

    #[test]
    fn dead_keywords_are_replaced() {
        let sym = Symbol::intern(Some("test.dead"), "transient-kw");
        {
            let _kw = Keyword::intern(sym.clone());
            assert!(Keyword::find(&sym).is_some());
        }
        assert!(Keyword::find(&sym).is_none());
        let again = Keyword::intern(sym.clone());
        assert_eq!(Keyword::find(&sym), Some(again));
    }

    #[test]
    fn symbol_hash_mixes_namespace() {
        let plain = Symbol::intern(None, "x");
        let qualified = Symbol::intern(Some("a"), "x");
        assert_eq!(plain.hasheq(), hash_combine(murmur3::hash_string("x"), 0));
        assert_ne!(plain.hasheq(), qualified.hasheq());
    }

    #[test]
    fn ordering_puts_unqualified_first() {
        let mut syms = vec![Symbol::parse("b/a"), Symbol::parse("z"), Symbol::parse("a/z")];
        syms.sort();
        let printed: Vec<String> = syms.iter().map(ToString::to_string).collect();
        assert_eq!(printed, ["z", "a/z", "b/a"]);
    }
}
