//! Long-living masternode quorums: parameter table, member selection and
//! final commitments.

pub mod bls;
pub mod commitment;
pub mod masternode_list;
pub mod params;
pub mod utils;

pub use bls::{BlsPublicKey, BlsSignature, ThresholdSignatureScheme};
pub use commitment::FinalCommitment;
pub use masternode_list::{DeterministicMasternode, MasternodeList, MasternodeListProvider};
pub use params::{LlmqParams, LlmqType};
pub use utils::{build_commitment_hash, quorum_modifier, QuorumSelector};
