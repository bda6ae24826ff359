use std::io::{Error as IoError, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;

use super::encode::{serialize, serialize_hash, write_compact_size, Encodable};
use super::hash::{sha256d, Hash256};
use super::script::Script;
use super::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OutPoint {
    pub hash: Hash256,
    pub index: u32,
}

impl OutPoint {
    /// The coinbase prevout: zero hash, index `u32::MAX`.
    pub const fn null() -> Self {
        OutPoint { hash: Hash256::ZERO, index: u32::MAX }
    }

    pub fn is_null(&self) -> bool {
        self.hash.is_zero() && self.index == u32::MAX
    }
}

impl Encodable for OutPoint {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        self.hash.consensus_encode(w)?;
        w.write_u32::<LittleEndian>(self.index)?;
        Ok(36)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxIn {
    pub prev_out: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl Encodable for TxIn {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        let mut written = self.prev_out.consensus_encode(w)?;
        written += self.script_sig.consensus_encode(w)?;
        w.write_u32::<LittleEndian>(self.sequence)?;
        Ok(written + 4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl Encodable for TxOut {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        w.write_i64::<LittleEndian>(self.value)?;
        Ok(8 + self.script_pubkey.consensus_encode(w)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// A single-input, single-output coinbase spending the null prevout.
    pub fn coinbase(script_sig: Script, value: Amount, script_pubkey: Script) -> Self {
        Transaction {
            version: 1,
            inputs: vec![TxIn { prev_out: OutPoint::null(), script_sig, sequence: u32::MAX }],
            outputs: vec![TxOut { value, script_pubkey }],
            lock_time: 0,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prev_out.is_null()
    }

    pub fn txid(&self) -> Hash256 {
        serialize_hash(self)
    }
}

impl Encodable for Transaction {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        let mut written = 0;
        w.write_i32::<LittleEndian>(self.version)?;
        written += 4;
        written += write_compact_size(w, self.inputs.len() as u64)?;
        for txin in &self.inputs {
            written += txin.consensus_encode(w)?;
        }
        written += write_compact_size(w, self.outputs.len() as u64)?;
        for txout in &self.outputs {
            written += txout.consensus_encode(w)?;
        }
        w.write_u32::<LittleEndian>(self.lock_time)?;
        Ok(written + 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 80;
}

impl Encodable for BlockHeader {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        w.write_i32::<LittleEndian>(self.version)?;
        self.prev_block_hash.consensus_encode(w)?;
        self.merkle_root.consensus_encode(w)?;
        w.write_u32::<LittleEndian>(self.time)?;
        w.write_u32::<LittleEndian>(self.bits)?;
        w.write_u32::<LittleEndian>(self.nonce)?;
        Ok(Self::SIZE)
    }
}

/// Block identity hash. Production nodes plug in the chain's proof-of-work
/// hash here; everything in this crate that needs a block hash goes through it.
pub trait BlockHasher: Send + Sync {
    fn hash_header(&self, header: &BlockHeader) -> Hash256;

    fn name(&self) -> &'static str;
}

/// Double SHA-256 over the 80-byte header.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256dHasher;

impl BlockHasher for Sha256dHasher {
    fn hash_header(&self, header: &BlockHeader) -> Hash256 {
        sha256d(&serialize(header))
    }

    fn name(&self) -> &'static str {
        "sha256d"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash_with(&self, hasher: &dyn BlockHasher) -> Hash256 {
        hasher.hash_header(&self.header)
    }

    /// Bitcoin-style merkle root: pairwise double SHA-256, duplicating the
    /// last entry of odd-length levels.
    pub fn compute_merkle_root(&self) -> Hash256 {
        let mut level: Vec<Hash256> = self.transactions.iter().map(Transaction::txid).collect();
        if level.is_empty() {
            return Hash256::ZERO;
        }
        while level.len() > 1 {
            if level.len() % 2 != 0 {
                if let Some(last) = level.last().copied() {
                    level.push(last);
                }
            }
            level = level
                .chunks_exact(2)
                .map(|pair| {
                    let mut concat = Vec::with_capacity(64);
                    concat.extend_from_slice(pair[0].as_bytes());
                    concat.extend_from_slice(pair[1].as_bytes());
                    sha256d(&concat)
                })
                .collect();
        }
        level[0]
    }
}

impl Encodable for Block {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        let mut written = self.header.consensus_encode(w)?;
        written += write_compact_size(w, self.transactions.len() as u64)?;
        for tx in &self.transactions {
            written += tx.consensus_encode(w)?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::script::OP_RETURN;

    fn dummy_tx(tag: u8) -> Transaction {
        Transaction::coinbase(
            Script::builder().push_slice(&[tag]).into_script(),
            50,
            Script::builder().push_opcode(OP_RETURN).into_script(),
        )
    }

    #[test]
    fn single_tx_merkle_root_is_txid() {
        let tx = dummy_tx(1);
        let block = Block {
            header: BlockHeader {
                version: 1,
                prev_block_hash: Hash256::ZERO,
                merkle_root: Hash256::ZERO,
                time: 0,
                bits: 0,
                nonce: 0,
            },
            transactions: vec![tx.clone()],
        };
        assert_eq!(block.compute_merkle_root(), tx.txid());
    }

    #[test]
    fn odd_levels_duplicate_last_leaf() {
        let txs = vec![dummy_tx(1), dummy_tx(2), dummy_tx(3)];
        let header = BlockHeader {
            version: 1,
            prev_block_hash: Hash256::ZERO,
            merkle_root: Hash256::ZERO,
            time: 0,
            bits: 0,
            nonce: 0,
        };
        let three = Block { header, transactions: txs.clone() };
        let mut four_txs = txs;
        four_txs.push(dummy_tx(3));
        let four = Block { header, transactions: four_txs };
        assert_eq!(three.compute_merkle_root(), four.compute_merkle_root());
    }

    #[test]
    fn header_serializes_to_80_bytes() {
        let header = BlockHeader {
            version: 4,
            prev_block_hash: Hash256::ZERO,
            merkle_root: Hash256::ZERO,
            time: 1,
            bits: 2,
            nonce: 3,
        };
        let bytes = serialize(&header);
        assert_eq!(bytes.len(), BlockHeader::SIZE);
        assert_eq!(&bytes[..4], &[4, 0, 0, 0]);
        assert_eq!(&bytes[76..], &[3, 0, 0, 0]);
    }
}
