//! Hashes, targets, scripts and the minimal block/transaction model needed to
//! build and hash the genesis anchors.

pub mod block;
pub mod encode;
pub mod hash;
pub mod pow;
pub mod script;

pub use block::{Block, BlockHasher, BlockHeader, OutPoint, Sha256dHasher, Transaction, TxIn, TxOut};
pub use encode::{serialize, serialize_hash, Encodable};
pub use hash::{sha256, sha256d, Hash256, HashWriter};
pub use pow::Target;
pub use script::{Script, ScriptBuilder};

/// Amounts in base units.
pub type Amount = i64;

pub const COIN: Amount = 100_000_000;
