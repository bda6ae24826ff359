pub mod block_index;
pub mod chain_view;

pub use block_index::BlockIndex;
pub use chain_view::{ChainView, MemoryChain, MEDIAN_TIME_SPAN};
