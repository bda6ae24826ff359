use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use super::hash::Hash256;

/// A 256-bit proof-of-work target, stored like `arith_uint256` (little-endian).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Target(Hash256);

impl Target {
    pub const ZERO: Target = Target(Hash256::ZERO);

    pub const fn from_hex_const(s: &str) -> Target {
        Target(Hash256::from_hex_const(s))
    }

    /// Expands a compact `nBits` value. Returns `None` for encodings that
    /// `SetCompact` flags as negative or overflowing.
    pub fn from_compact(bits: u32) -> Option<Target> {
        let size = (bits >> 24) as usize;
        let mut word = bits & 0x007f_ffff;
        if word != 0 && (bits & 0x0080_0000) != 0 {
            return None;
        }
        if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
            return None;
        }

        let mut out = [0u8; 32];
        if size <= 3 {
            word >>= 8 * (3 - size);
            out[..4].copy_from_slice(&word.to_le_bytes());
        } else {
            let shift = size - 3;
            for (i, b) in word.to_le_bytes().iter().take(3).enumerate() {
                let pos = i + shift;
                if pos < 32 {
                    out[pos] = *b;
                }
            }
        }
        Some(Target(Hash256::from_bytes(out)))
    }

    /// `hash <= target`, comparing both as 256-bit integers.
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        hash.cmp_arith(&self.0) != Ordering::Greater
    }

    pub fn as_hash(&self) -> &Hash256 {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.0)
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
