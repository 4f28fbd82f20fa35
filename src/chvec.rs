//! chvec — C5: the choice vector, a static mapping from composite-hash
//! bit positions to `(attribute, attribute-hash-bit)` pairs.

use crate::consts::MAXBITS;
use crate::error::{MalhError, Result};

/// One entry of the choice vector: bit `i` of the composite hash comes
/// from bit `bit` of attribute `att`'s own hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChoiceEntry {
    pub att: u32,
    pub bit: u32,
}

/// A full choice vector: exactly `MAXBITS` entries, immutable for the
/// life of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceVector(pub [ChoiceEntry; MAXBITS]);

impl ChoiceVector {
    #[inline]
    pub fn entries(&self) -> &[ChoiceEntry; MAXBITS] {
        &self.0
    }

    /// Parse a descriptor of the form `a0:b0,a1:b1,...` (at most
    /// `MAXBITS` tokens). Remaining positions default to `(0, 0)`.
    /// Rejects any `a >= nattrs`, `b >= 32`, or malformed token.
    pub fn parse(descriptor: &str, nattrs: u32) -> Result<Self> {
        let mut entries = [ChoiceEntry::default(); MAXBITS];
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Ok(ChoiceVector(entries));
        }

        let mut i = 0usize;
        for token in descriptor.split(',') {
            if i >= MAXBITS {
                return Err(MalhError::MalformedChoiceVector {
                    descriptor: descriptor.to_string(),
                    reason: format!("more than {} entries", MAXBITS),
                });
            }
            let (a_str, b_str) = token.split_once(':').ok_or_else(|| {
                MalhError::MalformedChoiceVector {
                    descriptor: descriptor.to_string(),
                    reason: format!("token {:?} is not of the form att:bit", token),
                }
            })?;
            let a: u32 = a_str.trim().parse().map_err(|_| MalhError::MalformedChoiceVector {
                descriptor: descriptor.to_string(),
                reason: format!("attribute index {:?} is not a number", a_str),
            })?;
            let b: u32 = b_str.trim().parse().map_err(|_| MalhError::MalformedChoiceVector {
                descriptor: descriptor.to_string(),
                reason: format!("bit index {:?} is not a number", b_str),
            })?;
            if a >= nattrs {
                return Err(MalhError::MalformedChoiceVector {
                    descriptor: descriptor.to_string(),
                    reason: format!("attribute {} >= nattrs {}", a, nattrs),
                });
            }
            if b >= 32 {
                return Err(MalhError::MalformedChoiceVector {
                    descriptor: descriptor.to_string(),
                    reason: format!("bit {} >= 32", b),
                });
            }
            entries[i] = ChoiceEntry { att: a, bit: b };
            i += 1;
        }

        Ok(ChoiceVector(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_descriptor_and_pads() {
        let cv = ChoiceVector::parse("0:0,1:0,2:0", 3).unwrap();
        assert_eq!(cv.0[0], ChoiceEntry { att: 0, bit: 0 });
        assert_eq!(cv.0[2], ChoiceEntry { att: 2, bit: 0 });
        // unfilled positions default to (0, 0)
        assert_eq!(cv.0[3], ChoiceEntry { att: 0, bit: 0 });
        assert_eq!(cv.0[31], ChoiceEntry { att: 0, bit: 0 });
    }

    #[test]
    fn rejects_attribute_out_of_range() {
        let err = ChoiceVector::parse("5:0", 3).unwrap_err();
        assert!(matches!(err, MalhError::MalformedChoiceVector { .. }));
    }

    #[test]
    fn rejects_bit_out_of_range() {
        let err = ChoiceVector::parse("0:40", 3).unwrap_err();
        assert!(matches!(err, MalhError::MalformedChoiceVector { .. }));
    }

    #[test]
    fn rejects_malformed_token() {
        let err = ChoiceVector::parse("0-0", 3).unwrap_err();
        assert!(matches!(err, MalhError::MalformedChoiceVector { .. }));
    }

    #[test]
    fn empty_descriptor_is_all_defaults() {
        let cv = ChoiceVector::parse("", 3).unwrap();
        assert!(cv.0.iter().all(|e| *e == ChoiceEntry::default()));
    }
}
