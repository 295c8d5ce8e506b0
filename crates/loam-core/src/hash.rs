//! Hash caching and host-style hash helpers
//!
//! Immutable structures compute their hashes lazily and cache them forever.
//! [`HashCache`] stores the cached value next to a "not yet computed"
//! sentinel; a content hash that happens to equal the sentinel is simply
//! recomputed on every call.

use std::sync::atomic::{AtomicI32, Ordering};

/// Sentinel used by sequences and vectors
pub const SEQ_SENTINEL: i32 = 0;

/// Sentinel used by maps and sets
pub const MAP_SENTINEL: i32 = -1;

/// Lazily computed, permanently cached hash code
#[derive(Debug)]
pub struct HashCache {
    value: AtomicI32,
    sentinel: i32,
}

impl HashCache {
    /// Create an empty cache with the given sentinel
    #[inline]
    #[must_use]
    pub const fn new(sentinel: i32) -> Self {
        Self {
            value: AtomicI32::new(sentinel),
            sentinel,
        }
    }

    /// Cache for sequential structures (sentinel 0)
    #[inline]
    #[must_use]
    pub const fn for_seq() -> Self {
        Self::new(SEQ_SENTINEL)
    }

    /// Cache for maps and sets (sentinel -1)
    #[inline]
    #[must_use]
    pub const fn for_map() -> Self {
        Self::new(MAP_SENTINEL)
    }

    /// Return the cached hash, computing it on first use
    ///
    /// Racing threads may both compute; they store the same value.
    ///
    /// # Errors
    /// Propagates failures from `compute` without caching anything
    #[inline]
    pub fn get_or_try_init<E>(&self, compute: impl FnOnce() -> Result<i32, E>) -> Result<i32, E> {
        let cached = self.value.load(Ordering::Acquire);
        if cached != self.sentinel {
            return Ok(cached);
        }
        let hash = compute()?;
        self.value.store(hash, Ordering::Release);
        Ok(hash)
    }

    /// Peek at the cached value without computing
    #[inline]
    #[must_use]
    pub fn cached(&self) -> Option<i32> {
        let cached = self.value.load(Ordering::Acquire);
        (cached != self.sentinel).then_some(cached)
    }
}

impl Clone for HashCache {
    fn clone(&self) -> Self {
        Self {
            value: AtomicI32::new(self.value.load(Ordering::Acquire)),
            sentinel: self.sentinel,
        }
    }
}

/// Boost-style hash combiner
#[inline]
#[must_use]
pub const fn hash_combine(seed: i32, hash: i32) -> i32 {
    let seed = seed as u32;
    let mixed = (hash as u32)
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2);
    (seed ^ mixed) as i32
}

/// Host-style hash of a 64-bit integer (`v ^ (v >>> 32)`)
#[inline]
#[must_use]
pub const fn long_hash_code(value: i64) -> i32 {
    let bits = value as u64;
    (bits ^ (bits >> 32)) as i32
}

/// Host-style hash of a double, treating `-0.0` as `0.0`
#[inline]
#[must_use]
pub fn double_hash_code(value: f64) -> i32 {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    (bits ^ (bits >> 32)) as i32
}

/// Host-style string hash (`s[0]*31^(n-1) + ... + s[n-1]` over UTF-16 units)
#[must_use]
pub fn string_hash_code(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
