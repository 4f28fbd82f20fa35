//! hash — C2: byte-string hashing for attribute values.
//!
//! Uses Bob Jenkins' "one-at-a-time" mix: deterministic, good bit
//! dispersion, no dependency needed. The exact hash function is not a
//! wire compatibility surface on its own — it only matters that a
//! relation's data files are always read back with the same function
//! that wrote them.

/// Hash an arbitrary byte string to a 32-bit word.
pub fn hash_any(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0;
    for &b in bytes {
        h = h.wrapping_add(b as u32);
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h = h.wrapping_add(h << 15);
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash_any(b"alpha"), hash_any(b"alpha"));
    }

    #[test]
    fn distinguishes_similar_inputs() {
        assert_ne!(hash_any(b"alpha"), hash_any(b"alphb"));
        assert_ne!(hash_any(b""), hash_any(b"a"));
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(hash_any(b""), 0);
    }

    #[test]
    fn avalanche_smoke() {
        // Changing one byte should flip a healthy fraction of output bits.
        let a = hash_any(b"the quick brown fox");
        let b = hash_any(b"the quick brown fot");
        let diff = (a ^ b).count_ones();
        assert!(diff >= 6, "expected reasonable avalanche, got {} flipped bits", diff);
    }
}
