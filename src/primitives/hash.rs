use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Write};

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A 256-bit hash in internal (little-endian) byte order, like `uint256`.
///
/// `Display` prints the byte-reversed hex form used by block explorers and by
/// the hard-coded constants in the chain profiles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    pub const fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parses the display (byte-reversed) hex form at compile time.
    ///
    /// Accepts an optional `0x` prefix and fewer than 64 digits, filling from
    /// the least significant byte the same way `uint256S` does, so `"0x"` and
    /// `"0x00"` both yield zero. Invalid input is a compile error when used in
    /// a `const`.
    pub const fn from_hex_const(s: &str) -> Hash256 {
        let bytes = s.as_bytes();
        let mut start = 0;
        if bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
            start = 2;
        }
        let digits = bytes.len() - start;
        if digits > 64 {
            panic!("hash hex string longer than 64 digits");
        }
        let mut out = [0u8; 32];
        let mut i = 0;
        while i < digits {
            let v = hex_digit(bytes[bytes.len() - 1 - i]);
            out[i / 2] |= if i % 2 == 0 { v } else { v << 4 };
            i += 1;
        }
        Hash256(out)
    }

    /// Runtime counterpart of [`Hash256::from_hex_const`] for untrusted input
    /// such as configuration values. Requires the full 64 digits.
    pub fn from_hex(s: &str) -> Result<Hash256, hex::FromHexError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(trimmed, &mut bytes)?;
        bytes.reverse();
        Ok(Hash256(bytes))
    }

    /// Compares both hashes as 256-bit unsigned integers (`arith_uint256`).
    pub fn cmp_arith(&self, other: &Hash256) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

const fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit"),
    }
}

/// Decodes a fixed-length hex string (natural byte order) at compile time.
pub(crate) const fn hex_array<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    if bytes.len() != N * 2 {
        panic!("hex string has the wrong length");
    }
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = (hex_digit(bytes[2 * i]) << 4) | hex_digit(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

pub fn sha256(data: &[u8]) -> Hash256 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    Hash256(out)
}

pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(first));
    Hash256(out)
}

/// Streams consensus-encoded data straight into SHA-256, like `CHashWriter`.
#[derive(Clone, Default)]
pub struct HashWriter {
    engine: Sha256,
}

impl HashWriter {
    pub fn new() -> Self {
        HashWriter { engine: Sha256::new() }
    }

    /// Single SHA-256 of everything written so far.
    pub fn finalize_single(self) -> Hash256 {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.engine.finalize());
        Hash256(out)
    }

    /// Double SHA-256 of everything written so far.
    pub fn finalize_double(self) -> Hash256 {
        let first = self.engine.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(first));
        Hash256(out)
    }
}

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.engine.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
