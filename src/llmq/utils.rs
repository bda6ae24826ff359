use std::io::{Error as IoError, Write};
use std::sync::Arc;

use log::{debug, warn};

use super::bls::BlsPublicKey;
use super::masternode_list::{DeterministicMasternode, MasternodeListProvider};
use super::params::LlmqType;
use crate::chainparams::ConsensusParams;
use crate::error::QuorumError;
use crate::primitives::encode::write_dyn_bitset;
use crate::primitives::{sha256d, Encodable, Hash256, HashWriter};

/// Selects quorum members from the masternode list valid at a block.
pub struct QuorumSelector<'a, P: ?Sized> {
    consensus: &'a ConsensusParams,
    provider: &'a P,
}

impl<'a, P> QuorumSelector<'a, P>
where
    P: MasternodeListProvider + ?Sized,
{
    pub fn new(consensus: &'a ConsensusParams, provider: &'a P) -> Self {
        QuorumSelector { consensus, provider }
    }

    /// Members of the `llmq_type` quorum formed at `block_hash`, in DKG order.
    /// Members that later fail the DKG are still included.
    pub fn get_all_quorum_members(
        &self,
        llmq_type: LlmqType,
        block_hash: &Hash256,
    ) -> Result<Vec<Arc<DeterministicMasternode>>, QuorumError> {
        let params = self
            .consensus
            .llmq(llmq_type)
            .ok_or(QuorumError::LlmqTypeNotEnabled(llmq_type.id()))?;
        let list = self
            .provider
            .list_for_block(block_hash)
            .ok_or(QuorumError::MasternodeListUnavailable(*block_hash))?;

        let modifier = quorum_modifier(llmq_type, block_hash);
        let members = list.calculate_quorum(params.size as usize, &modifier);
        if members.len() < params.size as usize {
            warn!(
                "{} quorum at {} has only {} of {} members",
                params.name,
                block_hash,
                members.len(),
                params.size
            );
        }
        debug!("Selected {} members for {} at {}", members.len(), params.name, block_hash);
        Ok(members)
    }
}

/// Seed for member scores: `sha256d(type || block_hash)`.
pub fn quorum_modifier(llmq_type: LlmqType, block_hash: &Hash256) -> Hash256 {
    let mut buf = [0u8; 33];
    buf[0] = llmq_type.id();
    buf[1..].copy_from_slice(block_hash.as_bytes());
    sha256d(&buf)
}

/// The hash quorum members sign for a final commitment:
/// `sha256d(type || block_hash || bitset(valid_members) || pub_key || vvec_hash)`.
pub fn build_commitment_hash(
    llmq_type: u8,
    block_hash: &Hash256,
    valid_members: &[bool],
    pub_key: &BlsPublicKey,
    vvec_hash: &Hash256,
) -> Hash256 {
    let mut writer = HashWriter::new();
    encode_commitment_fields(&mut writer, llmq_type, block_hash, valid_members, pub_key, vvec_hash)
        .expect("hash writers don't error");
    writer.finalize_double()
}

fn encode_commitment_fields<W: Write>(
    w: &mut W,
    llmq_type: u8,
    block_hash: &Hash256,
    valid_members: &[bool],
    pub_key: &BlsPublicKey,
    vvec_hash: &Hash256,
) -> Result<usize, IoError> {
    w.write_all(&[llmq_type])?;
    let mut written = 1;
    written += block_hash.consensus_encode(w)?;
    written += write_dyn_bitset(w, valid_members)?;
    written += pub_key.consensus_encode(w)?;
    written += vvec_hash.consensus_encode(w)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::serialize;

    fn block_hash() -> Hash256 {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        Hash256::from_bytes(bytes)
    }

    const VALID: [bool; 10] = [true, false, true, true, false, false, false, false, true, true];

    #[test]
    fn commitment_serialization_layout() {
        let key = BlsPublicKey::from([0xab; 48]);
        let vvec = Hash256::from_bytes([0x11; 32]);
        let mut buf = Vec::new();
        let written = encode_commitment_fields(&mut buf, 1, &block_hash(), &VALID, &key, &vvec).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(buf.len(), 1 + 32 + 3 + 48 + 32);
        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..33], block_hash().as_bytes());
        assert_eq!(&buf[33..36], &[10, 0x0d, 0x03]);
        assert_eq!(&buf[36..84], &serialize(&key)[..]);
    }

    #[test]
    fn commitment_hash_vector() {
        let hash = build_commitment_hash(
            1,
            &block_hash(),
            &VALID,
            &BlsPublicKey::from([0xab; 48]),
            &Hash256::from_bytes([0x11; 32]),
        );
        assert_eq!(hash.to_string(), "1b947ab5f166375581945145722769265427655f8f04598ab385e27bfc624b73");
    }

    #[test]
    fn modifier_binds_type() {
        let a = quorum_modifier(LlmqType::Llmq50_60, &block_hash());
        let b = quorum_modifier(LlmqType::Llmq400_60, &block_hash());
        assert_ne!(a, b);
    }
}
