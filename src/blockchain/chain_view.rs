use std::sync::Arc;

use log::debug;

use crate::blockchain::block_index::BlockIndex;
use crate::chainparams::ParameterSet;
use crate::error::ChainError;
use crate::primitives::{BlockHasher, BlockHeader, Hash256};

/// Number of blocks whose timestamps make up the median time past.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Read access to one branch of the block tree, by height.
///
/// Heights passed in must not exceed [`tip_height`](ChainView::tip_height).
pub trait ChainView {
    fn tip_height(&self) -> Option<u32>;

    fn block_version(&self, height: u32) -> i32;

    /// Median of the timestamps of the block at `height` and up to ten of its
    /// ancestors.
    fn median_time_past(&self, height: u32) -> i64;
}

/// An in-memory active chain: genesis plus every header appended on top.
pub struct MemoryChain {
    blocks: Vec<Arc<BlockIndex>>,
    hasher: Arc<dyn BlockHasher>,
}

impl std::fmt::Debug for MemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChain")
            .field("tip_height", &self.tip_height())
            .field("tip_hash", &self.tip().map(|tip| tip.hash))
            .field("hasher", &self.hasher.name())
            .finish()
    }
}

impl MemoryChain {
    pub fn new(genesis: BlockIndex, hasher: Arc<dyn BlockHasher>) -> Self {
        MemoryChain { blocks: vec![Arc::new(genesis)], hasher }
    }

    /// Starts a chain at the profile's genesis block, using the profile's
    /// canonical genesis hash.
    pub fn from_params(params: &ParameterSet, hasher: Arc<dyn BlockHasher>) -> Self {
        let genesis = BlockIndex::with_hash(params.genesis.header, 0, params.genesis_hash());
        Self::new(genesis, hasher)
    }

    pub fn tip(&self) -> Option<&Arc<BlockIndex>> {
        self.blocks.last()
    }

    pub fn get(&self, height: u32) -> Option<&Arc<BlockIndex>> {
        self.blocks.get(height as usize)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends a header that must build on the current tip.
    pub fn add_header(&mut self, header: BlockHeader) -> Result<Arc<BlockIndex>, ChainError> {
        let (tip_hash, tip_height) = match self.tip() {
            Some(tip) => (tip.hash, tip.height),
            None => return Err(ChainError::EmptyChain),
        };
        if header.prev_block_hash != tip_hash {
            return Err(ChainError::DoesNotExtendTip {
                tip: tip_hash,
                prev: header.prev_block_hash,
            });
        }
        let index = Arc::new(BlockIndex::new(header, tip_height + 1, self.hasher.as_ref()));
        debug!("Added block index: height={}, hash={}", index.height, index.hash);
        self.blocks.push(Arc::clone(&index));
        Ok(index)
    }

    /// Appends an otherwise empty block with the given version and time.
    pub fn push(&mut self, version: i32, time: u32) -> Result<Arc<BlockIndex>, ChainError> {
        let (prev_block_hash, bits) = match self.tip() {
            Some(tip) => (tip.hash, tip.header.bits),
            None => return Err(ChainError::EmptyChain),
        };
        self.add_header(BlockHeader {
            version,
            prev_block_hash,
            merkle_root: Hash256::ZERO,
            time,
            bits,
            nonce: 0,
        })
    }

    /// Drops every block above `height`.
    pub fn truncate(&mut self, height: u32) {
        self.blocks.truncate(height as usize + 1);
    }
}

impl ChainView for MemoryChain {
    fn tip_height(&self) -> Option<u32> {
        self.tip().map(|tip| tip.height)
    }

    fn block_version(&self, height: u32) -> i32 {
        self.blocks[height as usize].version()
    }

    fn median_time_past(&self, height: u32) -> i64 {
        let end = height as usize + 1;
        let start = end.saturating_sub(MEDIAN_TIME_SPAN);
        let mut times: Vec<i64> = self.blocks[start..end].iter().map(|b| b.block_time()).collect();
        times.sort_unstable();
        times[times.len() / 2]
    }
}
