//! Murmur3 (x86, 32-bit) hashing
//!
//! Pure, total functions producing the portable hash codes used by values and
//! collections. All arithmetic is wrapping on `u32`; results are returned as
//! `i32` so that they combine the same way on every platform.
//!
//! # Example
//!
//! ```rust
//! use loam_core::murmur3;
//!
//! assert_eq!(murmur3::hash_long(0), 0);
//! assert_eq!(murmur3::hash_long(1), 1_392_991_556);
//! ```

const SEED: u32 = 0;
const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;
const R1: u32 = 15;
const R2: u32 = 13;
const M: u32 = 5;
const N: u32 = 0xe654_6b64;

#[inline]
const fn mix_key(key: u32) -> u32 {
    key.wrapping_mul(C1).rotate_left(R1).wrapping_mul(C2)
}

#[inline]
const fn mix_hash(hash: u32, key: u32) -> u32 {
    (hash ^ key)
        .rotate_left(R2)
        .wrapping_mul(M)
        .wrapping_add(N)
}

#[inline]
const fn finalize(mut hash: u32, length: u32) -> i32 {
    hash ^= length;
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash as i32
}

/// Hash a 32-bit integer
#[inline]
#[must_use]
pub const fn hash_int(input: i32) -> i32 {
    if input == 0 {
        return 0;
    }
    let key = mix_key(input as u32);
    finalize(mix_hash(SEED, key), 4)
}

/// Hash a 64-bit integer, low half first
#[inline]
#[must_use]
pub const fn hash_long(input: i64) -> i32 {
    if input == 0 {
        return 0;
    }
    let bits = input as u64;
    let low = bits as u32;
    let high = (bits >> 32) as u32;

    let hash = mix_hash(SEED, mix_key(low));
    let hash = mix_hash(hash, mix_key(high));
    finalize(hash, 8)
}

/// Hash a string over its UTF-16 code units
///
/// Units are consumed two at a time; an odd trailing unit is folded in
/// without the rotate/multiply step.
#[must_use]
pub fn hash_string(input: &str) -> i32 {
    let mut hash = SEED;
    let mut pending: Option<u32> = None;
    let mut len: u32 = 0;

    for unit in input.encode_utf16() {
        len = len.wrapping_add(1);
        match pending.take() {
            None => pending = Some(u32::from(unit)),
            Some(low) => {
                let key = low | (u32::from(unit) << 16);
                hash = mix_hash(hash, mix_key(key));
            }
        }
    }

    if let Some(last) = pending {
        hash ^= mix_key(last);
    }

    finalize(hash, len.wrapping_mul(2))
}

/// Mix an accumulated collection hash with its element count
#[inline]
#[must_use]
pub const fn mix_coll_hash(hash: i32, count: u32) -> i32 {
    let key = mix_key(hash as u32);
    finalize(mix_hash(SEED, key), count)
}

/// Order-sensitive combination of element hashes (`h = 31*h + e`, start 1)
#[must_use]
pub fn hash_ordered<I>(hashes: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    let mut hash: i32 = 1;
    let mut count: u32 = 0;
    for element in hashes {
        hash = hash.wrapping_mul(31).wrapping_add(element);
        count = count.wrapping_add(1);
    }
    mix_coll_hash(hash, count)
}

/// Order-insensitive combination of element hashes (sum, start 0)
#[must_use]
pub fn hash_unordered<I>(hashes: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    let mut hash: i32 = 0;
    let mut count: u32 = 0;
    for element in hashes {
        hash = hash.wrapping_add(element);
        count = count.wrapping_add(1);
    }
    mix_coll_hash(hash, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shortcut() {
        assert_eq!(hash_int(0), 0);
        assert_eq!(hash_long(0), 0);
    }

    #[test]
    fn known_scalar_vectors() {
        assert_eq!(hash_int(1), -68_075_478);
        assert_eq!(hash_long(1), 1_392_991_556);
        assert_eq!(hash_long(-1), 1_651_860_712);
    }

    #[test]
    fn known_string_vectors() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("ab"), 374_890_698);
        assert_eq!(hash_string("abc"), 1_118_836_419);
    }

    #[test]
    fn empty_collections() {
        assert_eq!(hash_ordered(std::iter::empty()), -2_017_569_654);
        assert_eq!(hash_unordered(std::iter::empty()), -15_128_758);
    }

    #[test]
    fn ordered_depends_on_order() {
        let forward = [1, 2, 3].map(hash_long);
        let backward = [3, 2, 1].map(hash_long);
        assert_eq!(hash_ordered(forward), 736_442_005);
        assert_ne!(hash_ordered(forward), hash_ordered(backward));
    }

    #[test]
    fn unordered_ignores_order() {
        let forward = [1, 2, 3].map(hash_long);
        let backward = [3, 2, 1].map(hash_long);
        assert_eq!(hash_unordered(forward), 439_094_965);
        assert_eq!(hash_unordered(forward), hash_unordered(backward));
    }
}
