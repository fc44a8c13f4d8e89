//! The fixed 64-bit hash family that drives level construction and lookup.
//!
//! The same `(level, key)` pair must produce the same value in every build of
//! this crate, as the bit positions derived from these hashes are what gets
//! serialized. Changing any constant here invalidates stored functions.

/// Multiplier applied after mixing the level or key into the running state.
const M: u64 = 0x880355f21e6d1965;

/// Multiplier of the avalanche step.
const K: u64 = 0x2127599bf4325c37;

/// Compression step: two xor-shifts around a wrapping multiply.
#[inline(always)]
pub(crate) fn mix(mut h: u64) -> u64 {
    h ^= h >> 23;
    h = h.wrapping_mul(K);
    h ^ (h >> 47)
}

/// Returns the hash of the given level, shared by all keys hashed at that level.
#[inline(always)]
pub(crate) fn level_hash(level: u64) -> u64 {
    mix(level).wrapping_mul(M)
}

/// Returns the hash of `key` under a precomputed [`level_hash`].
#[inline(always)]
pub(crate) fn key_hash(level_hash: u64, key: u64) -> u64 {
    mix((level_hash ^ mix(key)).wrapping_mul(M))
}

/// Returns the hash of `key` at `level`. Equivalent to
/// `key_hash(level_hash(level), key)`; the two-step form lets callers hoist
/// the level hash out of per-key loops.
#[inline]
pub(crate) fn hash(level: u64, key: u64) -> u64 {
    key_hash(level_hash(level), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_equals_two_step() {
        for level in 0..5 {
            let lh = level_hash(level);
            for key in 0..5 {
                assert_eq!(hash(level, key), key_hash(lh, key),
                    "hash({level}, {key}) != key_hash({lh:#x}, {key})");
            }
        }
    }

    #[test]
    fn levels_decorrelate_keys() {
        // The same key must land on unrelated values at different levels,
        // otherwise colliding keys would collide forever.
        let key = 0xdead_beef_cafe_f00d;
        let h0 = hash(0, key);
        let h1 = hash(1, key);
        let h2 = hash(2, key);
        assert_ne!(h0, h1);
        assert_ne!(h1, h2);
        assert_ne!(h0, h2);
    }

    #[test]
    fn deterministic() {
        for key in [0u64, 1, u64::MAX, 0x0123_4567_89ab_cdef] {
            assert_eq!(hash(3, key), hash(3, key));
        }
    }
}
