//! Loam Core - values, sequences and persistent collections
//!
//! The data layer of the Loam runtime:
//! - Murmur3 hashing and the ordered/unordered collection hash rules
//! - Interned symbols and keywords, arbitrary-precision numbers
//! - The sequence abstraction: lazy, chunked and generated sequences
//! - Persistent maps, sets, vectors and queues, with transient builders
//!
//! Everything here is immutable once built and safe to share across threads.
//! The reference types that coordinate change over these values (atoms,
//! agents) live in `loam-ref`.
//!
//! # Example
//!
//! ```rust
//! use loam_core::prelude::*;
//!
//! # fn example() -> loam_core::Result<()> {
//! let evens = LongRange::stepped(0, 10, 2);
//! let sum = Func::new("+", |args| match args {
//!     [Value::Long(a), Value::Long(b)] => Ok(Value::Long(a + b)),
//!     _ => Err(Error::user("expected two longs")),
//! });
//! assert_eq!(seq::reduce(&Value::Seq(evens), &sum, None)?, Value::Long(20));
//!
//! let m = PersistentMap::new().assoc(Value::keyword("a"), Value::Long(1));
//! assert_eq!(Keyword::parse("a").invoke(&Value::Map(m), &Value::Nil), Value::Long(1));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod coll;
pub mod error;
pub mod func;
pub mod hash;
pub mod murmur3;
pub mod numeric;
pub mod seq;
pub mod symbol;
pub mod value;

// Re-exports for convenience
pub use coll::{
    APersistentMap, APersistentSet, ATransientMap, ATransientSet, EntryShape, MapEntry,
    PersistentMap, PersistentQueue, PersistentSet, PersistentVector,
};
pub use error::{Error, Result};
pub use func::Func;
pub use numeric::{BigInt, Ratio};
pub use seq::{ISeq, LazySeq, Seq};
pub use symbol::{Keyword, Symbol};
pub use value::Value;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Loam values
    pub use crate::coll::{
        APersistentMap, APersistentSet, ATransientMap, ATransientSet, PersistentMap,
        PersistentQueue, PersistentSet, PersistentVector,
    };
    pub use crate::seq::{self, Cycle, ISeq, Iterate, LazySeq, LongRange, Range, Repeat, Seq};
    pub use crate::{Error, Func, Keyword, Result, Symbol, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lazy_range_into_map_keys() {
        let keys = LazySeq::from_fn(|| Ok(Value::Seq(LongRange::to(3))));
        let mut t = PersistentMap::new().as_transient();
        for key in seq::iter(keys.seq().unwrap()) {
            t.assoc(key.unwrap(), Value::Bool(true)).unwrap();
        }
        let m = t.persistent().unwrap();
        assert_eq!(m.count(), 3);
        let expected = Value::Map(PersistentMap::array_map(
            (0..3).map(|i| (Value::Long(i), Value::Bool(true))),
        ));
        assert_eq!(Value::Map(m), expected);
    }

    #[test]
    fn printing_collections() {
        let m = PersistentMap::array_map([(Value::keyword("a"), Value::Long(1))]);
        assert_eq!(Value::Map(m).to_string(), "{:a 1}");
        let s = PersistentSet::hash_set([Value::Long(1)]);
        assert_eq!(Value::Set(s).to_string(), "#{1}");
        assert_eq!(Value::symbol("ns/sym").to_string(), "ns/sym");
    }

    #[test]
    fn version_is_set() {
        assert!(!crate::VERSION.is_empty());
    }
}
