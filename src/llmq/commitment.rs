use std::io::{Error as IoError, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use serde::Serialize;

use super::bls::{BlsPublicKey, BlsSignature, ThresholdSignatureScheme};
use super::masternode_list::DeterministicMasternode;
use super::params::LlmqParams;
use super::utils::build_commitment_hash;
use crate::error::QuorumError;
use crate::primitives::encode::write_dyn_bitset;
use crate::primitives::{Encodable, Hash256};

/// Outcome of one DKG session, as mined into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalCommitment {
    pub version: u16,
    pub llmq_type: u8,
    pub quorum_hash: Hash256,
    pub signers: Vec<bool>,
    pub valid_members: Vec<bool>,
    pub quorum_public_key: BlsPublicKey,
    pub quorum_vvec_hash: Hash256,
    pub quorum_sig: BlsSignature,
    pub members_sig: BlsSignature,
}

impl FinalCommitment {
    pub const CURRENT_VERSION: u16 = 1;

    /// An empty commitment sized for `params`, as mined when a DKG fails.
    pub fn null(params: &LlmqParams, quorum_hash: Hash256) -> Self {
        FinalCommitment {
            version: Self::CURRENT_VERSION,
            llmq_type: params.llmq_type.id(),
            quorum_hash,
            signers: vec![false; params.size as usize],
            valid_members: vec![false; params.size as usize],
            quorum_public_key: BlsPublicKey::NULL,
            quorum_vvec_hash: Hash256::ZERO,
            quorum_sig: BlsSignature::NULL,
            members_sig: BlsSignature::NULL,
        }
    }

    pub fn count_signers(&self) -> usize {
        self.signers.iter().filter(|b| **b).count()
    }

    pub fn count_valid_members(&self) -> usize {
        self.valid_members.iter().filter(|b| **b).count()
    }

    pub fn is_null(&self) -> bool {
        self.count_signers() == 0
            && self.count_valid_members() == 0
            && self.quorum_public_key.is_null()
            && self.quorum_vvec_hash.is_zero()
            && self.quorum_sig.is_null()
            && self.members_sig.is_null()
    }

    /// The hash members signed.
    pub fn commitment_hash(&self) -> Hash256 {
        build_commitment_hash(
            self.llmq_type,
            &self.quorum_hash,
            &self.valid_members,
            &self.quorum_public_key,
            &self.quorum_vvec_hash,
        )
    }

    pub fn verify_sizes(&self, params: &LlmqParams) -> Result<(), QuorumError> {
        let expected = params.size as usize;
        for actual in [self.signers.len(), self.valid_members.len()] {
            if actual != expected {
                return Err(QuorumError::InvalidBitsetSize { expected, actual });
            }
        }
        Ok(())
    }

    pub fn verify_null(&self, params: &LlmqParams) -> Result<(), QuorumError> {
        self.verify_type(params)?;
        if !self.is_null() {
            return Err(QuorumError::NonNullNullCommitment);
        }
        self.verify_sizes(params)
    }

    /// Full validation against the members selected for this quorum. Signature
    /// checks are skipped when `check_sigs` is false.
    pub fn verify(
        &self,
        params: &LlmqParams,
        members: &[Arc<DeterministicMasternode>],
        scheme: &dyn ThresholdSignatureScheme,
        check_sigs: bool,
    ) -> Result<(), QuorumError> {
        if self.version == 0 || self.version > Self::CURRENT_VERSION {
            return Err(QuorumError::InvalidVersion(self.version));
        }
        self.verify_type(params)?;
        self.verify_sizes(params)?;

        let min = params.min_size as usize;
        let valid = self.count_valid_members();
        if valid < min {
            return Err(QuorumError::NotEnoughMembers { field: "valid members", count: valid, min });
        }
        let signers = self.count_signers();
        if signers < min {
            return Err(QuorumError::NotEnoughMembers { field: "signers", count: signers, min });
        }

        if !scheme.is_valid_public_key(&self.quorum_public_key) {
            return Err(QuorumError::InvalidPublicKey);
        }

        // Bits past the end of a short member list must be unset.
        for index in members.len()..self.signers.len() {
            if self.signers[index] || self.valid_members[index] {
                return Err(QuorumError::MemberBitOutOfRange(index));
            }
        }

        if check_sigs {
            let commitment_hash = self.commitment_hash();
            let member_keys: Vec<BlsPublicKey> = members
                .iter()
                .zip(&self.signers)
                .filter(|(_, signed)| **signed)
                .map(|(mn, _)| mn.pub_key_operator)
                .collect();
            if !scheme.verify_secure_aggregated(&member_keys, &commitment_hash, &self.members_sig) {
                return Err(QuorumError::InvalidMembersSignature);
            }
            if !scheme.verify(&self.quorum_public_key, &commitment_hash, &self.quorum_sig) {
                return Err(QuorumError::InvalidQuorumSignature);
            }
        }

        debug!(
            "Verified commitment for quorum {} ({} signers, {} valid members)",
            self.quorum_hash, signers, valid
        );
        Ok(())
    }

    fn verify_type(&self, params: &LlmqParams) -> Result<(), QuorumError> {
        if self.llmq_type != params.llmq_type.id() {
            return Err(QuorumError::LlmqTypeMismatch {
                expected: params.llmq_type.id(),
                actual: self.llmq_type,
            });
        }
        Ok(())
    }
}

impl Encodable for FinalCommitment {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        w.write_u16::<LittleEndian>(self.version)?;
        w.write_u8(self.llmq_type)?;
        let mut len = 3;
        len += self.quorum_hash.consensus_encode(w)?;
        len += write_dyn_bitset(w, &self.signers)?;
        len += write_dyn_bitset(w, &self.valid_members)?;
        len += self.quorum_public_key.consensus_encode(w)?;
        len += self.quorum_vvec_hash.consensus_encode(w)?;
        len += self.quorum_sig.consensus_encode(w)?;
        len += self.members_sig.consensus_encode(w)?;
        Ok(len)
    }
}
