use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use super::bls::BlsPublicKey;
use crate::primitives::{sha256, sha256d, Hash256};

/// A registered masternode as seen by quorum selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeterministicMasternode {
    /// Hash of the ProRegTx that registered the masternode.
    pub pro_tx_hash: Hash256,
    /// Hash of the block that confirmed the registration; zero until confirmed.
    pub confirmed_hash: Hash256,
    pub pub_key_operator: BlsPublicKey,
    /// PoSe-banned masternodes are kept in the list but are not valid.
    pub pose_banned: bool,
}

impl DeterministicMasternode {
    pub fn is_valid(&self) -> bool {
        !self.pose_banned
    }

    pub fn is_confirmed(&self) -> bool {
        !self.confirmed_hash.is_zero()
    }

    /// `sha256d(pro_tx_hash || confirmed_hash)`, the per-masternode half of the
    /// quorum score.
    pub fn confirmed_hash_with_pro_reg_tx_hash(&self) -> Hash256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.pro_tx_hash.as_bytes());
        buf[32..].copy_from_slice(self.confirmed_hash.as_bytes());
        sha256d(&buf)
    }

    /// `sha256(confirmed_hash_with_pro_reg_tx_hash || modifier)`. Single SHA-256.
    pub fn score(&self, modifier: &Hash256) -> Hash256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.confirmed_hash_with_pro_reg_tx_hash().as_bytes());
        buf[32..].copy_from_slice(modifier.as_bytes());
        sha256(&buf)
    }
}

/// Snapshot of the deterministic masternode list at one block.
#[derive(Debug, Clone, Default)]
pub struct MasternodeList {
    pub block_hash: Hash256,
    pub height: u32,
    masternodes: BTreeMap<Hash256, Arc<DeterministicMasternode>>,
}

impl MasternodeList {
    pub fn new(block_hash: Hash256, height: u32) -> Self {
        MasternodeList { block_hash, height, masternodes: BTreeMap::new() }
    }

    /// Inserts or replaces the entry keyed by `pro_tx_hash`.
    pub fn add(&mut self, masternode: DeterministicMasternode) -> Option<Arc<DeterministicMasternode>> {
        self.masternodes.insert(masternode.pro_tx_hash, Arc::new(masternode))
    }

    pub fn remove(&mut self, pro_tx_hash: &Hash256) -> Option<Arc<DeterministicMasternode>> {
        self.masternodes.remove(pro_tx_hash)
    }

    pub fn get(&self, pro_tx_hash: &Hash256) -> Option<&Arc<DeterministicMasternode>> {
        self.masternodes.get(pro_tx_hash)
    }

    pub fn len(&self) -> usize {
        self.masternodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masternodes.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.masternodes.values().filter(|mn| mn.is_valid()).count()
    }

    pub fn iter_valid(&self) -> impl Iterator<Item = &Arc<DeterministicMasternode>> {
        self.masternodes.values().filter(|mn| mn.is_valid())
    }

    /// Scores for every valid, confirmed masternode. Unconfirmed masternodes
    /// have no stable score yet and are skipped.
    pub fn calculate_scores(&self, modifier: &Hash256) -> Vec<(Hash256, Arc<DeterministicMasternode>)> {
        self.iter_valid()
            .filter(|mn| mn.is_confirmed())
            .map(|mn| (mn.score(modifier), Arc::clone(mn)))
            .collect()
    }

    /// The `max_size` highest-scoring masternodes, best first. Equal scores
    /// fall back to the larger `pro_tx_hash`.
    pub fn calculate_quorum(&self, max_size: usize, modifier: &Hash256) -> Vec<Arc<DeterministicMasternode>> {
        let mut scores = self.calculate_scores(modifier);
        scores.sort_by(|(score_a, mn_a), (score_b, mn_b)| {
            score_b
                .cmp_arith(score_a)
                .then_with(|| mn_b.pro_tx_hash.as_bytes().cmp(mn_a.pro_tx_hash.as_bytes()))
        });
        scores.into_iter().take(max_size).map(|(_, mn)| mn).collect()
    }
}

/// Supplies the masternode list that was valid at a given block.
pub trait MasternodeListProvider {
    fn list_for_block(&self, block_hash: &Hash256) -> Option<Arc<MasternodeList>>;
}

impl MasternodeListProvider for HashMap<Hash256, Arc<MasternodeList>> {
    fn list_for_block(&self, block_hash: &Hash256) -> Option<Arc<MasternodeList>> {
        self.get(block_hash).cloned()
    }
}

impl MasternodeListProvider for MasternodeList {
    fn list_for_block(&self, block_hash: &Hash256) -> Option<Arc<MasternodeList>> {
        (self.block_hash == *block_hash).then(|| Arc::new(self.clone()))
    }
}

/// Orders two masternodes the way quorum selection does for a given modifier.
pub fn compare_by_score(
    a: &DeterministicMasternode,
    b: &DeterministicMasternode,
    modifier: &Hash256,
) -> Ordering {
    b.score(modifier)
        .cmp_arith(&a.score(modifier))
        .then_with(|| b.pro_tx_hash.as_bytes().cmp(a.pro_tx_hash.as_bytes()))
}
