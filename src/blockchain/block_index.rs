use crate::primitives::{BlockHasher, BlockHeader, Hash256};

#[derive(Debug, Clone)]
pub struct BlockIndex {
    pub hash: Hash256,              // Hash of this block header
    pub prev_hash: Option<Hash256>, // None only for the genesis block
    pub height: u32,
    pub header: BlockHeader,
}

impl BlockIndex {
    pub fn new(header: BlockHeader, height: u32, hasher: &dyn BlockHasher) -> Self {
        let prev_hash = if height == 0 { None } else { Some(header.prev_block_hash) };
        BlockIndex {
            hash: hasher.hash_header(&header),
            prev_hash,
            height,
            header,
        }
    }

    /// Index entry whose identity hash is already known, e.g. a genesis block
    /// pinned by the chain profile.
    pub fn with_hash(header: BlockHeader, height: u32, hash: Hash256) -> Self {
        let prev_hash = if height == 0 { None } else { Some(header.prev_block_hash) };
        BlockIndex { hash, prev_hash, height, header }
    }

    pub fn block_time(&self) -> i64 {
        i64::from(self.header.time)
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none() && self.height == 0
    }
}
