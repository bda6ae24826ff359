use std::io::{Error as IoError, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::hash::{Hash256, HashWriter};

/// Consensus (wire) serialization. Field order and widths are part of every
/// hash computed over these structures.
pub trait Encodable {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError>;
}

pub fn write_compact_size<W: Write>(w: &mut W, n: u64) -> Result<usize, IoError> {
    if n < 0xfd {
        w.write_u8(n as u8)?;
        Ok(1)
    } else if n <= 0xffff {
        w.write_u8(0xfd)?;
        w.write_u16::<LittleEndian>(n as u16)?;
        Ok(3)
    } else if n <= 0xffff_ffff {
        w.write_u8(0xfe)?;
        w.write_u32::<LittleEndian>(n as u32)?;
        Ok(5)
    } else {
        w.write_u8(0xff)?;
        w.write_u64::<LittleEndian>(n)?;
        Ok(9)
    }
}

pub fn write_var_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<usize, IoError> {
    let len = write_compact_size(w, bytes.len() as u64)?;
    w.write_all(bytes)?;
    Ok(len + bytes.len())
}

/// Writes a dynamic bitset: compact-size bit count, then `ceil(n / 8)` bytes
/// with bit `i` stored at `byte[i / 8] & (1 << (i % 8))`.
pub fn write_dyn_bitset<W: Write>(w: &mut W, bits: &[bool]) -> Result<usize, IoError> {
    let len = write_compact_size(w, bits.len() as u64)?;
    let packed = pack_bits(bits);
    w.write_all(&packed)?;
    Ok(len + packed.len())
}

pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; (bits.len() + 7) / 8];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    packed
}

impl Encodable for Hash256 {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        w.write_all(self.as_bytes())?;
        Ok(32)
    }
}

pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    data.consensus_encode(&mut buf)
        .expect("in-memory writers don't error");
    buf
}

/// Double SHA-256 of the consensus encoding (`SerializeHash`).
pub fn serialize_hash<T: Encodable + ?Sized>(data: &T) -> Hash256 {
    let mut writer = HashWriter::new();
    data.consensus_encode(&mut writer)
        .expect("hash writers don't error");
    writer.finalize_double()
}
